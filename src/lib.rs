pub mod commands;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

use clap::Parser;
use commands::Cli;
use error::PotionError;
use tracing::{debug, Level};
use tracing_subscriber::filter::EnvFilter;

/// Initialize logging to stderr. `RUST_LOG` overrides the default level.
fn init_logging(debug: bool, json: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub async fn run() -> Result<(), PotionError> {
    let cli = Cli::parse();

    let manager = cli.config_manager()?;
    let config = manager.load()?;
    init_logging(cli.debug || config.debug, cli.log_json);
    debug!("Using config {}", manager.config_file_path().display());

    commands::execute(cli.command, manager, config).await
}
