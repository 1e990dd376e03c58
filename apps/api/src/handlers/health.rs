use serde::Serialize;

use super::*;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    ready: bool,
    postgres: &'static str,
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres_ok = sqlx::query("SELECT 1")
        .execute(&state.postgres_pool)
        .await
        .is_ok();

    let (http_status, status) = if postgres_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready: postgres_ok,
            postgres: if postgres_ok { "ok" } else { "unreachable" },
        }),
    )
}
