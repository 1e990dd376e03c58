//! Application services and ports.

#![forbid(unsafe_code)]

mod catalog_ports;
mod catalog_service;
mod inspection_ports;
mod inspection_service;
mod role_ports;
mod role_service;

pub use catalog_ports::{
    CreateProductInput, CreateSpecificationInput, ProductRepository, SpecificationRepository,
};
pub use catalog_service::CatalogService;
pub use inspection_ports::{
    ApprovalLedger, CreateInspectionInput, InspectionDetail, InspectionFilter,
    InspectionRepository, UpdateDetailsInput,
};
pub use inspection_service::InspectionService;
pub use role_ports::RoleRepository;
pub use role_service::RoleService;
