use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tower_http::trace::TraceLayer;
use url::Url;

use billing::api::rest::routes::register_routes;
use billing::domain::catalog::PlanCatalog;
use billing::domain::ports::SubscriptionProvider;
use billing::domain::service::BillingService;
use billing::infra::storage::{migrations::Migrator, SeaOrmBillingRepository};
use billing::infra::subscriptions::{HttpSubscriptionProvider, NoSubscriptions};

mod config;
mod logging;

use config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// RankPilot billing server - entitlements and usage metering
#[derive(Parser)]
#[command(name = "rankpilot-server")]
#[command(about = "RankPilot billing server - entitlements and usage metering")]
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

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

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

    let mut config = AppConfig::load_layered(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init_logging(&config.logging, cli.verbose);
    tracing::info!("RankPilot billing server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let mut options = ConnectOptions::new(config.database.url.clone());
    if let Some(max_conns) = config.database.max_conns {
        options.max_connections(max_conns);
    }

    tracing::info!("Connecting to database: {}", config.database.url);
    let db = Database::connect(options)
        .await
        .context("Failed to connect to database")?;

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    let repo = Arc::new(SeaOrmBillingRepository::new(db));
    let subscriptions: Arc<dyn SubscriptionProvider> =
        match &config.billing.subscription_provider_url {
            Some(raw) => {
                let base = Url::parse(raw)
                    .with_context(|| format!("Invalid subscription provider URL '{raw}'"))?;
                tracing::info!("Using subscription provider at {}", base);
                Arc::new(HttpSubscriptionProvider::new(reqwest::Client::new(), base))
            }
            None => {
                tracing::warn!(
                    "No subscription provider configured, all users resolve to the starter plan"
                );
                Arc::new(NoSubscriptions)
            }
        };
    let catalog = Arc::new(PlanCatalog::from_config(&config.billing));
    let service = Arc::new(BillingService::new(repo, subscriptions, catalog));

    let router = register_routes(Router::new(), service).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn check_config(config: AppConfig) -> Result<()> {
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
