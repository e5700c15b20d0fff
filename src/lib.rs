//! Static directory file server
//!
//! Serves the files under a root directory over HTTP/1.1 with directory
//! listings, index files, conditional requests and byte ranges.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
