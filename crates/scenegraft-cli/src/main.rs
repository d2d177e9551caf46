//! scenegraft CLI - build scene trees from JSON tree descriptions.
//!
//! Descriptions are built into an in-process scene sink and the resulting
//! scene is printed as an outline or as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scenegraft_ops::{Config, OpsContext};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;

use commands::{build, config as config_cmd, validate};

/// scenegraft - materialize tree descriptions into a scene graph.
#[derive(Parser, Debug)]
#[command(
    name = "sg",
    author,
    version,
    about = "scenegraft: build scene trees from JSON tree descriptions",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a description into a fresh scene and print it.
    ///
    /// Failed subtrees are reported as warnings; a missing root or a
    /// cyclic description is an error.
    Build {
        /// Description file (defaults to the configured `default_description`).
        path: Option<PathBuf>,

        /// Print the report and scene as JSON.
        #[arg(long)]
        json: bool,

        /// Maximum sibling subtrees built concurrently (0 = unbounded).
        #[arg(short, long, env = "SG_SIBLING_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Make the scene reject nodes with this source URI (repeatable).
        #[arg(long = "fail-uri")]
        fail_uris: Vec<String>,

        /// Also list enabled descendants of the built root.
        #[arg(long)]
        descendants: bool,

        /// Explode the built scene: move enabled parts outward by this factor.
        #[arg(long, value_name = "FACTOR")]
        explode: Option<f64>,
    },

    /// Check a description's structure without building it.
    Validate {
        /// Description file (defaults to the configured `default_description`).
        path: Option<PathBuf>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Build {
            path,
            json,
            concurrency,
            fail_uris,
            descendants,
            explode,
        } => {
            let ctx = OpsContext::new(config);
            let args = build::BuildArgs {
                path,
                json,
                concurrency,
                fail_uris,
                descendants,
                explode,
            };
            build::execute(&ctx, args).await?;
        }

        Commands::Validate { path, json } => {
            let ctx = OpsContext::new(config);
            validate::execute(&ctx, path, json)?;
        }

        Commands::Config(config_cmd_inner) => {
            let mut config = config;
            match config_cmd_inner {
                ConfigCommands::Show => {
                    config_cmd::show(&config)?;
                }
                ConfigCommands::Set { key, value } => {
                    config_cmd::set(&mut config, &key, &value)?;
                }
                ConfigCommands::Get { key } => {
                    config_cmd::get(&config, &key)?;
                }
                ConfigCommands::Reset => {
                    config_cmd::reset()?;
                }
                ConfigCommands::Path => {
                    if let Some(path) = Config::config_file_path() {
                        println!("{}", path.display());
                    } else {
                        println!("(no config file path available)");
                    }
                }
            }
        }
    }

    Ok(())
}
