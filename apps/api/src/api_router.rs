use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use qualigate_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

/// Builds the full API router: the public health probe plus the
/// identity-gated application routes.
pub fn build(state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/bootstrap/quality-head",
            post(handlers::bootstrap_quality_head_handler),
        )
        .route("/api/roles/{subject}", get(handlers::role_of_handler))
        .route("/api/roles", put(handlers::assign_role_handler))
        .route(
            "/api/products",
            get(handlers::list_products_handler).post(handlers::create_product_handler),
        )
        .route(
            "/api/products/{product_id}/deactivate",
            post(handlers::deactivate_product_handler),
        )
        .route(
            "/api/products/{product_id}/specifications",
            get(handlers::list_specifications_handler)
                .post(handlers::create_specification_handler),
        )
        .route(
            "/api/specifications/{specification_id}",
            delete(handlers::delete_specification_handler),
        )
        .route(
            "/api/inspections",
            get(handlers::list_inspections_handler).post(handlers::create_inspection_handler),
        )
        .route(
            "/api/inspections/{inspection_id}",
            get(handlers::get_inspection_handler),
        )
        .route(
            "/api/inspections/{inspection_id}/decision",
            post(handlers::decide_inspection_handler),
        )
        .route(
            "/api/inspections/{inspection_id}/details",
            put(handlers::update_inspection_details_handler),
        )
        .route(
            "/api/inspections/{inspection_id}/evidence",
            post(handlers::add_evidence_handler),
        )
        .route_layer(from_fn(middleware::require_identity));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static("x-actor-subject"),
            HeaderName::from_static("x-actor-name"),
            HeaderName::from_static("x-actor-email"),
        ]);

    Ok(Router::new()
        .route("/api/health", get(handlers::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state))
}
