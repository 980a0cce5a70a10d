pub mod pool_manager;

pub use pool_manager::{PoolManager, QueryIntent};
