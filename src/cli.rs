use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::db::PoolManager;

#[derive(Parser)]
#[command(name = "ledger-core")]
#[command(about = "Ledger Core - Accounts and Transactions API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    use sqlx::migrate::Migrator;
    use std::path::Path;

    let pools = PoolManager::new(&config.database_url, None).await?;
    let migrator = Migrator::new(Path::new("./migrations")).await?;

    tracing::info!("Running database migrations...");
    migrator.run(pools.primary()).await?;

    tracing::info!("Database migrations completed");
    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    println!("Configuration:");
    println!("  Server Port:  {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    if let Some(replica_url) = &config.database_replica_url {
        println!("  Replica URL:  {}", mask_password(replica_url));
    }
    println!("  Redis URL:    {}", mask_password(&config.redis_url));

    let report = crate::startup::validate_environment(config).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("configuration validation failed");
    }

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user_start = slash_pos + 2;
                let user = &url[user_start..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password_hides_credentials() {
        assert_eq!(
            mask_password("postgres://app:secret@db:5432/ledger"),
            "postgres://app:****@db:5432/ledger"
        );
    }

    #[test]
    fn test_mask_password_leaves_credentialless_urls_alone() {
        assert_eq!(
            mask_password("redis://localhost:6379"),
            "redis://localhost:6379"
        );
    }
}
