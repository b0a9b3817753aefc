//! # riscdocs CLI
//!
//! Command-line interface for the RISC framework documentation site.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "riscdocs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "riscdocs.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new documentation project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build,

    /// Start development server with live rebuilds
    Dev {
        /// Server port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Do not open a browser (overrides server.open)
        #[arg(long)]
        no_open: bool,
    },

    /// Print the route table
    Routes {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build => commands::build_site(&cli.config),
        Commands::Dev { port, no_open } => {
            let opts = commands::DevOptions {
                port,
                open: if no_open { Some(false) } else { None },
            };
            commands::dev_server(&cli.config, opts).await
        }
        Commands::Routes { json } => commands::print_routes(&cli.config, json),
    }
}
