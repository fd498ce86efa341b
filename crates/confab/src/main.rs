// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confab - a per-session conversational agent.
//!
//! This is the binary entry point for the Confab server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Confab - a per-session conversational agent.
#[derive(Parser, Debug)]
#[command(name = "confab", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Confab gateway server.
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match confab_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            confab_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("confab serve failed: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("confab: use --help for available commands");
        }
    }
}
