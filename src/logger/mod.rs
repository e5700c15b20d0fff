//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//!
//! Info and access lines go to stdout, warnings and errors to stderr.

mod format;

pub use format::AccessLogEntry;

use crate::config::{LoggingConfig, ServerConfig};
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<LoggingConfig> = OnceLock::new();

/// Initialize the logger with configuration
///
/// Should be called once at application startup. Later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let _ = SETTINGS.set(config.clone());
}

fn settings() -> &'static LoggingConfig {
    SETTINGS.get_or_init(LoggingConfig::default)
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Write to info log
fn write_info(message: &str) {
    println!("{} {message}", timestamp());
}

/// Write to error log
fn write_error(message: &str) {
    eprintln!("{} {message}", timestamp());
}

pub fn access_log_enabled() -> bool {
    settings().access_log
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &ServerConfig) {
    write_info("======================================");
    write_info("File server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Serving: {}", root.display()));
    write_info(&format!("Index files: {}", config.index_files.join(", ")));
    write_info(&format!(
        "Directory listing: {}",
        if config.directory_listing { "enabled" } else { "disabled" }
    ));
    if config.logging.access_log {
        write_info(&format!(
            "Access log format: {}",
            config.logging.access_log_format
        ));
    }
    write_info("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_fatal(err: &impl std::fmt::Display) {
    write_error(&format!("[FATAL] {err}"));
}

/// Log formatted access log entry, if access logging is enabled
pub fn log_access(entry: &AccessLogEntry) {
    let settings = settings();
    if settings.access_log {
        println!("{}", entry.format(&settings.access_log_format));
    }
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_warning(&format!("Failed to bind {addr}: {err}"));
}
