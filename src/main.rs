//! Cutframe video editor
//!
//! Trims a video to a duration from its start, applies a color preset,
//! scales it and burns in a centered caption.
//!
//! # Usage
//!
//! ```bash
//! cutframe process --input in.mp4 --output out.mp4 --trim 10 --filter sepia --text "Hello World"
//! cutframe probe --input in.mp4 --json
//! cutframe gui
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use cutframe::cli::{commands, Cli, Commands};
use cutframe::config::AppConfig;
use cutframe::utils::logging::{log_system_info, LoggingConfig};

/// Main entry point for the Cutframe CLI application
fn main() -> Result<()> {
    let cli = Cli::parse();

    LoggingConfig::new(cli.log_level, cli.log_format).initialize()?;
    log_system_info();

    let config = AppConfig::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Process(args) => {
            info!("Executing process command");
            commands::process(args, &config).map(|_| ())
        }
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(args)
        }
        Commands::Gui(args) => {
            info!("Executing gui command");
            commands::gui(args, config)
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
