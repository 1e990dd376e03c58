use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use qualigate_application::{
    CreateInspectionInput, CreateProductInput, CreateSpecificationInput, InspectionFilter,
    UpdateDetailsInput,
};
use qualigate_core::UserIdentity;
use qualigate_domain::{InspectionId, InspectionStatus, ProductId, Role, SpecificationId};

use crate::dto::{
    AddEvidenceRequest, ApprovalHistoryEntryResponse, BootstrapQualityHeadRequest,
    CreateInspectionRequest, CreateProductRequest, CreateSpecificationRequest, DecisionRequest,
    EvidenceResponse, InspectionDetailResponse, InspectionResponse, InspectionResultResponse,
    ListInspectionsQuery, ListProductsQuery, ProductResponse, RoleAssignmentRequest, RoleResponse,
    SpecificationResponse, UpdateInspectionDetailsRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod catalog;
mod health;
mod inspections;
mod roles;

pub use catalog::{
    create_product_handler, create_specification_handler, deactivate_product_handler,
    delete_specification_handler, list_products_handler, list_specifications_handler,
};
pub use health::health_handler;
pub use inspections::{
    add_evidence_handler, create_inspection_handler, decide_inspection_handler,
    get_inspection_handler, list_inspections_handler, update_inspection_details_handler,
};
pub use roles::{assign_role_handler, bootstrap_quality_head_handler, role_of_handler};
