// Server module entry point
// Binds the listener and runs the accept loop

pub mod connection;
pub mod listener;

// `loop` is a keyword, so the module file keeps its name but not its ident
#[path = "loop.rs"]
pub mod server_loop;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppState, ServerConfig};
use crate::error::ServerError;
use crate::logger;

pub use listener::create_listener;
pub use server_loop::start_server_loop;

/// A bound file server, ready to accept connections
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Validate the root directory and bind the configured address
    ///
    /// Nothing is served yet; bind failures come back as
    /// [`ServerError::Bind`] for the caller to act on.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(config)?;
        let listener = listener::bind(&state.config.addr).await?;
        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until the process exits
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        logger::log_server_start(&addr, self.state.root(), &self.state.config);
        start_server_loop(self.listener, self.state).await;
        Ok(())
    }
}
