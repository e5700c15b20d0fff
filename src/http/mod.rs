//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! filesystem: validators, ranges, content types, bodies and responses.

pub mod body;
pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::{ResponseBody, Segment};
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_405_response, build_416_response,
    build_error_response, build_html_response, build_options_response, build_redirect_response,
    ResponseWriter,
};
