use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_core::adapters::{PostgresTransactionRepository, RedisLock};
use ledger_core::cli::{self, Cli, Commands, DbCommands};
use ledger_core::config::Config;
use ledger_core::db::PoolManager;
use ledger_core::services::{
    AccountService, BalanceService, HolderService, StatementService, TransactionService,
};
use ledger_core::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&config);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config).await,
    }
}

fn init_tracing(config: &Config) {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pools = PoolManager::new(&config.database_url, config.database_replica_url.as_deref())
        .await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pools.primary()).await?;
    tracing::info!("Database migrations completed");

    let repository = Arc::new(PostgresTransactionRepository::new(pools.clone()));
    let locker = Arc::new(RedisLock::new(&config.redis_url)?);
    let accounts = AccountService::new(pools.clone());
    let balances = BalanceService::new(pools.clone());

    let transactions = TransactionService::new(
        repository,
        locker,
        Arc::new(accounts.clone()),
        Arc::new(balances.clone()),
    );

    let state = AppState {
        holders: HolderService::new(pools.clone()),
        accounts,
        balances,
        statements: StatementService::new(pools.clone()),
        transactions,
        pools,
        redis_url: config.redis_url.clone(),
        start_time: Instant::now(),
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
