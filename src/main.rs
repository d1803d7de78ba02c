use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;

use pending_app_ops::config::ConfigManager;
use pending_app_ops::handlers::{self, DrainFormat};
use pending_app_ops::logger;

#[derive(Parser)]
#[command(name = "pending-app-ops")]
#[command(about = "Track pending app install, update and remove operations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking an app operation request
    Enqueue {
        /// Operation id
        #[arg(long)]
        id: i64,

        /// Operation code (e.g. INSTALL_APPLICATION)
        #[arg(long)]
        code: String,

        /// JSON payload carrying the app url and identifier
        #[arg(long)]
        payload: String,
    },

    /// Record a platform status for an app
    Update {
        /// Package download url
        #[arg(long)]
        url: Option<String>,

        /// Package identifier
        #[arg(long)]
        identifier: Option<String>,

        /// Raw platform status (e.g. INSTALLING, INSTALLED)
        #[arg(long)]
        status: String,

        /// Error message reported with the status
        #[arg(long)]
        error: Option<String>,
    },

    /// Report status changes and forget finished operations
    Drain {
        /// Print notifications as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the pending operation for an app
    Find {
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        identifier: Option<String>,
    },

    /// List all pending operations
    List,

    /// Show or initialize the tracker configuration
    Config {
        /// Write the default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,

        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    if let Err(e) = logger::init_logger() {
        eprintln!("Warning: failed to initialize logging: {e:#}");
    }

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Enqueue { id, code, payload } => {
            let store = handlers::open_default_store()?;
            handlers::handle_enqueue(&store, id, &code, &payload, &mut out)?;
        }
        Commands::Update {
            url,
            identifier,
            status,
            error,
        } => {
            let store = handlers::open_default_store()?;
            handlers::handle_update(
                &store,
                url.as_deref(),
                identifier.as_deref(),
                &status,
                error.as_deref(),
                &mut out,
            )?;
        }
        Commands::Drain { json } => {
            let store = handlers::open_default_store()?;
            let format = if json {
                DrainFormat::Json
            } else {
                DrainFormat::Text
            };
            handlers::handle_drain(&store, format, &mut out)?;
        }
        Commands::Find { url, identifier } => {
            let store = handlers::open_default_store()?;
            handlers::handle_find(&store, url.as_deref(), identifier.as_deref(), &mut out)?;
        }
        Commands::List => {
            let store = handlers::open_default_store()?;
            handlers::handle_list(&store, &mut out)?;
        }
        Commands::Config { init, show: _ } => {
            let path = ConfigManager::tracker_config_path()?;
            if init {
                handlers::handle_config_init(&path, &mut out)?;
            } else {
                handlers::handle_config_show(&path, &mut out)?;
            }
        }
    }

    Ok(())
}
