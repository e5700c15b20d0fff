use clap::Parser;
use std::process::ExitCode;

use dirserve::config::{Cli, ServerConfig};
use dirserve::error::ServerError;
use dirserve::logger;
use dirserve::server::Server;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match ServerConfig::load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            logger::log_fatal(&ServerError::from(e));
            return ExitCode::FAILURE;
        }
    };
    logger::init(&cfg.logging);

    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: ServerConfig) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move { Server::bind(cfg).await?.run().await })
}
