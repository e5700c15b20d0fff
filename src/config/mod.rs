// Configuration module entry point
// Builds the immutable server configuration from defaults and the command line

mod cli;
mod state;
mod types;

pub use cli::Cli;
pub use state::AppState;
pub use types::{LoggingConfig, PerformanceConfig, ServerConfig};

/// Listen address used when `--addr` is not given
pub const DEFAULT_ADDR: &str = "localhost:8080";

impl ServerConfig {
    /// Layer the built-in defaults and the command line into a `ServerConfig`
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("addr", defaults.addr)?
            .set_default("root", defaults.root.to_string_lossy().into_owned())?
            .set_default("index_files", defaults.index_files)?
            .set_default("directory_listing", defaults.directory_listing)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default(
                "logging.access_log_format",
                defaults.logging.access_log_format,
            )?
            .set_default(
                "performance.header_read_timeout",
                defaults.performance.header_read_timeout,
            )?
            .set_default("performance.keep_alive", defaults.performance.keep_alive)?
            .set_override("addr", cli.addr.as_str())?
            .build()?;

        settings.try_deserialize()
    }
}
