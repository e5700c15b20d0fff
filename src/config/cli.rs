// Command line arguments

use clap::Parser;

/// Serve the current directory over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "dirserve", version, about)]
pub struct Cli {
    /// webserver listening address
    #[arg(long, value_name = "HOST:PORT", default_value = super::DEFAULT_ADDR)]
    pub addr: String,
}
