use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagnest::cli::{self, TagCommands, run_login, run_logout, run_register};
use tagnest::config::ServerConfig;
use tagnest::server::{AppState, create_router};
use tagnest::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "tagnest")]
#[command(about = "A self-hostable notes-and-tags server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the server (create the database)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Require the terms checkbox during registration
        #[arg(long)]
        require_terms: bool,
    },

    /// Register an account on a server and store the session
    Register {
        /// Server URL
        #[arg(long)]
        server: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Log in to a server and store the session
    Login {
        /// Server URL
        #[arg(long)]
        server: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Log out and discard the stored session
    Logout,

    /// Manage your tag hierarchy
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("tagnest.db");
    if db_path.exists() {
        bail!("Server already initialized at {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!();
    println!("Database created at {}", db_path.display());
    println!("Start the server with 'tagnest serve'.");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tagnest=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            run_init(data_dir)?;
        }
        Commands::Serve {
            host,
            port,
            data_dir,
            require_terms,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                require_terms,
            };

            if !config.db_path().exists() {
                bail!(
                    "Server not initialized. Run 'tagnest init' first to create the database."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState {
                store: Arc::new(store),
                data_dir: config.data_dir.clone(),
                require_terms: config.require_terms,
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Commands::Register {
            server,
            non_interactive,
        } => {
            run_register(server, non_interactive)?;
        }
        Commands::Login {
            server,
            non_interactive,
        } => {
            run_login(server, non_interactive)?;
        }
        Commands::Logout => {
            run_logout()?;
        }
        Commands::Tag { command } => {
            cli::run_tag_command(command)?;
        }
    }

    Ok(())
}
