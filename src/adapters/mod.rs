//! Infrastructure implementations of the engine's ports.

pub mod memory;
pub mod postgres_transaction_repository;
pub mod redis_lock;

pub use memory::{InMemoryAccountDirectory, InMemoryLedger, InMemoryLock};
pub use postgres_transaction_repository::PostgresTransactionRepository;
pub use redis_lock::RedisLock;
