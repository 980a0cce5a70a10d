pub mod accounts;
pub mod balances;
pub mod holders;
pub mod statements;
pub mod transactions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::{check_health, PostgresChecker, RedisChecker};
use crate::AppState;

/// Process liveness only: answers 200 whenever the server is up, without
/// touching any dependency.
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Aggregated dependency health. Returns 503 only when a critical
/// dependency is down; degraded states still answer 200.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let postgres = PostgresChecker::new(state.pools.primary().clone());
    let replica = state
        .pools
        .replica()
        .map(|pool| PostgresChecker::new(pool.clone()));
    let redis = RedisChecker::new(state.redis_url.clone());

    let response = check_health(postgres, replica, redis, state.start_time).await;

    let status_code = if response.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
