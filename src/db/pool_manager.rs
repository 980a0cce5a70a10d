use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

/// Primary/replica pool pair. Writes always go to the primary; reads go to
/// the replica when one is configured and fall back to the primary otherwise.
#[derive(Clone)]
pub struct PoolManager {
    primary: Arc<PgPool>,
    replica: Option<Arc<PgPool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Read,
    Write,
}

impl PoolManager {
    pub async fn new(primary_url: &str, replica_url: Option<&str>) -> Result<Self, sqlx::Error> {
        let primary = Arc::new(Self::connect(primary_url).await?);

        let replica = match replica_url {
            Some(url) => Some(Arc::new(Self::connect(url).await?)),
            None => None,
        };

        Ok(Self { primary, replica })
    }

    async fn connect(url: &str) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
    }

    pub fn get_pool(&self, intent: QueryIntent) -> &PgPool {
        match intent {
            QueryIntent::Write => &self.primary,
            QueryIntent::Read => self
                .replica
                .as_ref()
                .map(|r| r.as_ref())
                .unwrap_or(&self.primary),
        }
    }

    pub fn primary(&self) -> &PgPool {
        &self.primary
    }

    pub fn replica(&self) -> Option<&PgPool> {
        self.replica.as_ref().map(|r| r.as_ref())
    }
}
