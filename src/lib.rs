pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod validation;

use std::time::{Duration, Instant};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::timeout::TimeoutLayer;

use crate::db::PoolManager;
use crate::services::{
    AccountService, BalanceService, HolderService, StatementService, TransactionService,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub holders: HolderService,
    pub accounts: AccountService,
    pub balances: BalanceService,
    pub statements: StatementService,
    pub transactions: TransactionService,
    pub pools: PoolManager,
    pub redis_url: String,
    pub start_time: Instant,
}

pub fn create_app(state: AppState) -> Router {
    let v1 = Router::new()
        .route(
            "/holders",
            post(handlers::holders::create_holder).get(handlers::holders::list_holders),
        )
        .route("/holders/:id", get(handlers::holders::get_holder))
        .route(
            "/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route("/accounts/:id", get(handlers::accounts::get_account))
        .route("/accounts/:id/blocks", put(handlers::accounts::block_account))
        .route(
            "/accounts/:id/unblocks",
            put(handlers::accounts::unblock_account),
        )
        .route("/accounts/:id/closes", put(handlers::accounts::close_account))
        .route(
            "/accounts/:id/balances",
            get(handlers::balances::get_balance),
        )
        .route(
            "/accounts/:id/statements",
            get(handlers::statements::list_statements),
        )
        .route(
            "/accounts/:id/statements/export",
            get(handlers::statements::export_statements),
        )
        .route(
            "/transactions/credits",
            post(handlers::transactions::create_credit),
        )
        .route(
            "/transactions/debits",
            post(handlers::transactions::create_debit),
        )
        .route("/transactions/p2p", post(handlers::transactions::create_p2p))
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        );

    Router::new()
        .route("/liveness", get(handlers::liveness))
        .route("/health", get(handlers::health))
        .nest("/v1", v1)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
