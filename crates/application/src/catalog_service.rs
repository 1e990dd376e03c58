use std::sync::Arc;

use chrono::Utc;
use qualigate_core::{AppError, AppResult, UserIdentity};
use qualigate_domain::{
    Product, ProductId, ProductInput, Role, Specification, SpecificationId, SpecificationInput,
};

use crate::catalog_ports::{
    CreateProductInput, CreateSpecificationInput, ProductRepository, SpecificationRepository,
};
use crate::role_service::RoleService;

/// Product and specification catalog service.
///
/// Catalog mutation is the quality head's job; reads are broad.
#[derive(Clone)]
pub struct CatalogService {
    role_service: RoleService,
    products: Arc<dyn ProductRepository>,
    specifications: Arc<dyn SpecificationRepository>,
}

impl CatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(
        role_service: RoleService,
        products: Arc<dyn ProductRepository>,
        specifications: Arc<dyn SpecificationRepository>,
    ) -> Self {
        Self {
            role_service,
            products,
            specifications,
        }
    }

    /// Creates a product.
    pub async fn create_product(
        &self,
        actor: &UserIdentity,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        self.role_service
            .require_role(actor, Role::QualityHead)
            .await?;

        let product = Product::new(ProductInput {
            id: ProductId::new(),
            name: input.name,
            part_number: input.part_number,
            description: input.description,
            is_active: true,
            created_by: actor.subject().to_owned(),
            created_at: Utc::now(),
        })?;

        self.products.create(product.clone()).await?;
        Ok(product)
    }

    /// Lists products; `active_only` restricts to those offered for new
    /// inspections.
    pub async fn list_products(&self, active_only: bool) -> AppResult<Vec<Product>> {
        self.products.list(active_only).await
    }

    /// Returns a product by identifier.
    pub async fn get_product(&self, id: ProductId) -> AppResult<Product> {
        self.products
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product '{id}' does not exist")))
    }

    /// Deactivates a product, removing it from the set offered for new
    /// inspections. Existing inspections are unaffected; products are never
    /// hard-deleted.
    pub async fn deactivate_product(&self, actor: &UserIdentity, id: ProductId) -> AppResult<()> {
        self.role_service
            .require_role(actor, Role::QualityHead)
            .await?;
        self.get_product(id).await?;
        self.products.set_active(id, false).await
    }

    /// Creates a specification for an existing product.
    pub async fn create_specification(
        &self,
        actor: &UserIdentity,
        input: CreateSpecificationInput,
    ) -> AppResult<Specification> {
        self.role_service
            .require_role(actor, Role::QualityHead)
            .await?;
        self.get_product(input.product_id).await?;

        let specification = Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id: input.product_id,
            name: input.name,
            requirement: input.requirement,
        })?;

        self.specifications.create(specification.clone()).await?;
        Ok(specification)
    }

    /// Lists the specifications of one product.
    pub async fn list_specifications(
        &self,
        product_id: ProductId,
    ) -> AppResult<Vec<Specification>> {
        self.specifications.list_for_product(product_id).await
    }

    /// Deletes a specification.
    ///
    /// Surfaces the repository's `ReferentialIntegrity` failure when any
    /// recorded result references the specification.
    pub async fn delete_specification(
        &self,
        actor: &UserIdentity,
        id: SpecificationId,
    ) -> AppResult<()> {
        self.role_service
            .require_role(actor, Role::QualityHead)
            .await?;

        if self.specifications.find(id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "specification '{id}' does not exist"
            )));
        }

        self.specifications.delete(id).await
    }
}
