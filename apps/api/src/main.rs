//! Qualigate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use qualigate_application::{CatalogService, InspectionService, RoleService};
use qualigate_core::AppError;
use qualigate_infrastructure::{
    PostgresCatalogRepository, PostgresInspectionRepository, PostgresRoleRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let catalog_repository = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let inspection_repository = Arc::new(PostgresInspectionRepository::new(pool.clone()));

    let role_service = RoleService::new(role_repository, config.bootstrap_code.clone());
    let catalog_service = CatalogService::new(
        role_service.clone(),
        catalog_repository.clone(),
        catalog_repository.clone(),
    );
    let inspection_service = InspectionService::new(
        role_service.clone(),
        catalog_repository.clone(),
        catalog_repository,
        inspection_repository.clone(),
        inspection_repository,
    );

    let app_state = AppState {
        role_service,
        catalog_service,
        inspection_service,
        postgres_pool: pool,
    };

    let app = api_router::build(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "qualigate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
