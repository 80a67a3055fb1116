// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hotroute - a hot-reloadable HTTP plugin router.
//!
//! This is the binary entry point.

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotroute_config::HotrouteConfig;

/// Hotroute - serve a directory of plugin descriptors as HTTP routes.
#[derive(Parser, Debug)]
#[command(name = "hotroute", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the plugin directory (default).
    Serve,
    /// Validate every plugin descriptor without binding a socket.
    Check,
    /// Print the endpoints the plugin directory would register.
    Endpoints {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> HotrouteConfig {
    let loaded = match path {
        Some(path) => hotroute_config::load_and_validate_path(path),
        None => hotroute_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            hotroute_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Check => match check::run_check(&config).await {
            Ok(0) => Ok(()),
            Ok(_) => std::process::exit(1),
            Err(e) => Err(e),
        },
        Commands::Endpoints { json } => check::run_endpoints(&config, json).await,
    };

    if let Err(e) = result {
        eprintln!("hotroute: {e}");
        std::process::exit(1);
    }
}
