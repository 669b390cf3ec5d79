use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use users::config::UsersConfig;
use users::UsersModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// User Management Server - CRUD backend for user accounts
#[derive(Parser)]
#[command(name = "usermgmt-server")]
#[command(about = "User Management Server - CRUD backend for user accounts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("User Management Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

async fn run_server(mut config: AppConfig) -> Result<()> {
    if config.database.is_none() {
        tracing::warn!("No database section configured, using the default SQLite file");
        config.database = AppConfig::default().database;
    }

    let users_cfg: UsersConfig = config.module_config("users")?;
    let ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;

    let db = connect_database(&config).await?;

    tracing::info!("Initializing modules...");
    let users = UsersModule::init(users_cfg, db).await?;
    let ingress = ApiIngress::new(ingress_cfg);

    let router = ingress.build_router(users.register_rest(Router::new()), &users.openapi())?;
    let addr = ingress.bind_addr(&config.server.host, config.server.port)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = modkit::wait_for_shutdown().await {
                tracing::warn!(error = %e, "Signal handling failed, shutting down");
            }
            cancel.cancel();
        }
    });

    let served = ingress.serve(router, addr, cancel).await;
    users.shutdown().await;
    tracing::info!("User Management Server stopped");
    served
}

async fn connect_database(config: &AppConfig) -> Result<DatabaseConnection> {
    let db_cfg: DatabaseConfig = config
        .database
        .clone()
        .context("Database URL not configured")?;
    let url = config
        .resolved_database_url()
        .context("Database URL not configured")?;

    if let Some(dir) = config.sqlite_file_path().as_deref().and_then(Path::parent) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let mut opts = ConnectOptions::new(url.clone());
    opts.max_connections(db_cfg.max_conns.unwrap_or(10))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if url == runtime::config::MOCK_DATABASE_URL {
        // The in-memory database lives as long as its only connection.
        let forever = Duration::from_secs(60 * 60 * 24 * 365);
        opts.min_connections(1)
            .idle_timeout(forever)
            .max_lifetime(forever);
    }
    if let Some(ms) = db_cfg.busy_timeout_ms {
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(u64::from(ms))));
    }

    tracing::info!("Connecting to database: {}", url);
    Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to {url}"))
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    config.module_config::<UsersConfig>("users")?;
    config.module_config::<ApiIngressConfig>("api_ingress")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
