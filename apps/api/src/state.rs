use qualigate_application::{CatalogService, InspectionService, RoleService};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_service: RoleService,
    pub catalog_service: CatalogService,
    pub inspection_service: InspectionService,
    pub postgres_pool: PgPool,
}
