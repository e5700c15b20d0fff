//! Request handler module
//!
//! Maps request paths onto the root directory and serves what is there:
//! files, index files and directory listings.

pub mod listing;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, RequestContext};
