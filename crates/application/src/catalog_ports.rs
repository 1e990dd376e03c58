use async_trait::async_trait;

use qualigate_core::AppResult;
use qualigate_domain::{Product, ProductId, Specification, SpecificationId, SpecificationRequirement};

/// Input payload for product creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductInput {
    /// Product display name.
    pub name: String,
    /// Unique part/catalog number.
    pub part_number: String,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Input payload for specification creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSpecificationInput {
    /// Owning product.
    pub product_id: ProductId,
    /// Specification display name.
    pub name: String,
    /// Type-specific requirement payload.
    pub requirement: SpecificationRequirement,
}

/// Repository port for the product catalog.
///
/// The contract deliberately has no delete operation: products referenced by
/// inspections survive forever and are only ever deactivated.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persists a new product. Fails with `Conflict` when the part number is
    /// already taken.
    async fn create(&self, product: Product) -> AppResult<()>;

    /// Returns a product by identifier.
    async fn find(&self, id: ProductId) -> AppResult<Option<Product>>;

    /// Lists products, optionally restricted to those offered for new
    /// inspections.
    async fn list(&self, active_only: bool) -> AppResult<Vec<Product>>;

    /// Replaces the active flag.
    async fn set_active(&self, id: ProductId, is_active: bool) -> AppResult<()>;
}

/// Repository port for the specification catalog.
#[async_trait]
pub trait SpecificationRepository: Send + Sync {
    /// Persists a new specification.
    async fn create(&self, specification: Specification) -> AppResult<()>;

    /// Returns a specification by identifier.
    async fn find(&self, id: SpecificationId) -> AppResult<Option<Specification>>;

    /// Lists the specifications of one product, ordered by name.
    async fn list_for_product(&self, product_id: ProductId) -> AppResult<Vec<Specification>>;

    /// Deletes a specification.
    ///
    /// Must fail with `ReferentialIntegrity` when any recorded inspection
    /// result references the specification; deletion never cascades.
    async fn delete(&self, id: SpecificationId) -> AppResult<()>;
}
