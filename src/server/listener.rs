// Listener module
// Resolves the configured address and creates the listening socket

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::logger;

/// Pending connection queue size
const BACKLOG: i32 = 128;

/// Resolve a `host:port` string into candidate socket addresses
///
/// An empty host (`:8080`) means every IPv4 interface. IPv4 candidates are
/// returned first.
pub async fn resolve_addr(addr: &str) -> Result<Vec<SocketAddr>, ServerError> {
    let invalid = |reason: String| ServerError::InvalidAddress {
        addr: addr.to_string(),
        reason,
    };

    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(invalid("missing port".to_string()));
    };
    if port.parse::<u16>().is_err() {
        return Err(invalid(format!("invalid port '{port}'")));
    }

    let lookup = if host.is_empty() {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    };

    let mut addrs: Vec<SocketAddr> = tokio::net::lookup_host(lookup)
        .await
        .map_err(|e| invalid(e.to_string()))?
        .collect();
    if addrs.is_empty() {
        return Err(invalid("host resolved to no addresses".to_string()));
    }

    // Stable sort keeps resolver order within each family
    addrs.sort_by_key(SocketAddr::is_ipv6);
    addrs.dedup();
    Ok(addrs)
}

/// Bind the first candidate address that accepts us
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let candidates = resolve_addr(addr).await?;

    let mut last_err = None;
    for candidate in candidates {
        match create_listener(candidate) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                logger::log_bind_failed(&candidate, &e);
                last_err = Some(e);
            }
        }
    }

    Err(ServerError::Bind {
        addr: addr.to_string(),
        source: last_err
            .unwrap_or_else(|| std::io::Error::other("no address to bind")),
    })
}

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEADDR` lets a restarted server bind a port whose old
/// connections are still in `TIME_WAIT`.
pub fn create_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    // Required before handing the socket to tokio
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let addrs = resolve_addr("127.0.0.1:8080").await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_resolve_empty_host() {
        let addrs = resolve_addr(":9000").await.unwrap();
        assert_eq!(addrs, vec!["0.0.0.0:9000".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_port() {
        for addr in ["localhost", "localhost:http", "127.0.0.1:70000"] {
            assert!(
                matches!(
                    resolve_addr(addr).await,
                    Err(ServerError::InvalidAddress { .. })
                ),
                "{addr}"
            );
        }
    }

    #[tokio::test]
    async fn test_bind_in_use_is_error() {
        let first = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let taken = first.local_addr().unwrap().to_string();
        let err = bind(&taken).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }), "{err}");
    }
}
