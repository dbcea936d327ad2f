//! School evaluation service
//!
//! Entry point for the HTTP API server and the administrative commands
//! (database setup, school accounts, roles, statistics).

mod cli;

use clap::{Parser, Subcommand};
use school_eval_core::error::Result;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "school-eval")]
#[command(about = "School self-evaluation survey service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to ./school-eval.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides database.path)
    #[arg(long, env = "SCHOOL_EVAL_DB_PATH", global = true)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Create the database and install the standard indicators
    Init {
        /// Also write a school-eval.toml template
        #[arg(long)]
        write_config: bool,
    },

    /// Register a school account
    AddSchool {
        /// Login code of the school
        code: String,

        /// Display name of the school
        name: String,

        /// Initial password (stored as bcrypt)
        #[arg(long, env = "SCHOOL_EVAL_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        school_type: Option<String>,
    },

    /// Grant a user a role within a school
    GrantRole {
        /// User id (UUID)
        user_id: Uuid,

        /// Login code of the school
        school_code: String,

        /// admin, manager or viewer
        #[arg(default_value = "viewer")]
        role: String,
    },

    /// List the roles granted within a school
    Roles {
        /// Login code of the school
        school_code: String,
    },

    /// Show statistics of a project
    Stats {
        /// Project id (UUID)
        project_id: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Our crates at the requested level, request tracing one step quieter
    let filter = EnvFilter::new(format!(
        "school_eval={lvl},school_eval_core={lvl},tower_http=info,hyper=warn,reqwest=warn",
        lvl = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("school-eval v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = cli::helpers::load_settings(cli.config.as_deref(), cli.db_path)?;

    match cli.command {
        Commands::Serve { addr } => cli::serve::handle(settings, addr).await,
        Commands::Init { write_config } => cli::init::handle(&settings, write_config).await,
        Commands::AddSchool {
            code,
            name,
            password,
            region,
            school_type,
        } => cli::school::add_school(&settings, code, name, password, region, school_type).await,
        Commands::GrantRole {
            user_id,
            school_code,
            role,
        } => cli::school::grant_role(&settings, user_id, &school_code, &role).await,
        Commands::Roles { school_code } => cli::school::list_roles(&settings, &school_code).await,
        Commands::Stats { project_id, json } => {
            cli::stats::handle(&settings, &project_id, json).await
        }
    }
}
