//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_catalog_repository;
mod in_memory_inspection_repository;
mod in_memory_role_repository;
mod postgres_catalog_repository;
mod postgres_inspection_repository;
mod postgres_role_repository;

pub use in_memory_catalog_repository::InMemoryCatalogRepository;
pub use in_memory_inspection_repository::InMemoryInspectionRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_inspection_repository::PostgresInspectionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
