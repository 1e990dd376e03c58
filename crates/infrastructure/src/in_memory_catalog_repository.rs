use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use qualigate_application::{ProductRepository, SpecificationRepository};
use qualigate_core::{AppError, AppResult};
use qualigate_domain::{Product, ProductId, Specification, SpecificationId};

use crate::in_memory_inspection_repository::InMemoryInspectionRepository;

/// In-memory product and specification catalog implementation.
///
/// Holds a handle to the inspection store so specification deletion can
/// refuse to orphan recorded results, mirroring the database's RESTRICT
/// foreign key.
pub struct InMemoryCatalogRepository {
    products: RwLock<HashMap<ProductId, Product>>,
    specifications: RwLock<HashMap<SpecificationId, Specification>>,
    inspections: Arc<InMemoryInspectionRepository>,
}

impl InMemoryCatalogRepository {
    /// Creates an empty in-memory catalog bound to an inspection store.
    #[must_use]
    pub fn new(inspections: Arc<InMemoryInspectionRepository>) -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            specifications: RwLock::new(HashMap::new()),
            inspections,
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalogRepository {
    async fn create(&self, product: Product) -> AppResult<()> {
        let mut products = self.products.write().await;

        if products
            .values()
            .any(|existing| existing.part_number() == product.part_number())
        {
            return Err(AppError::Conflict(format!(
                "part number '{}' is already registered",
                product.part_number().as_str()
            )));
        }

        products.insert(product.id(), product);
        Ok(())
    }

    async fn find(&self, id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut listed: Vec<Product> = products
            .values()
            .filter(|product| !active_only || product.is_active())
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            left.part_number()
                .as_str()
                .cmp(right.part_number().as_str())
        });
        Ok(listed)
    }

    async fn set_active(&self, id: ProductId, is_active: bool) -> AppResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("product '{id}' does not exist")))?;
        products.insert(id, product.with_active(is_active));
        Ok(())
    }
}

#[async_trait]
impl SpecificationRepository for InMemoryCatalogRepository {
    async fn create(&self, specification: Specification) -> AppResult<()> {
        self.specifications
            .write()
            .await
            .insert(specification.id(), specification);
        Ok(())
    }

    async fn find(&self, id: SpecificationId) -> AppResult<Option<Specification>> {
        Ok(self.specifications.read().await.get(&id).cloned())
    }

    async fn list_for_product(&self, product_id: ProductId) -> AppResult<Vec<Specification>> {
        let specifications = self.specifications.read().await;
        let mut listed: Vec<Specification> = specifications
            .values()
            .filter(|specification| specification.product_id() == product_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn delete(&self, id: SpecificationId) -> AppResult<()> {
        if self.inspections.is_specification_referenced(id).await {
            return Err(AppError::ReferentialIntegrity(format!(
                "specification '{id}' is referenced by recorded inspection results"
            )));
        }

        self.specifications.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use qualigate_application::{
        InspectionRepository, ProductRepository, SpecificationRepository,
    };
    use qualigate_core::AppError;
    use qualigate_domain::{
        Inspection, InspectionId, InspectionInput, InspectionResult, InspectionResultInput,
        InspectionStatus, Product, ProductId, ProductInput, Specification, SpecificationId,
        SpecificationInput, SpecificationRequirement,
    };

    use crate::in_memory_inspection_repository::InMemoryInspectionRepository;

    use super::InMemoryCatalogRepository;

    fn product(part_number: &str) -> Product {
        match Product::new(ProductInput {
            id: ProductId::new(),
            name: "Drive Shaft".to_owned(),
            part_number: part_number.to_owned(),
            description: None,
            is_active: true,
            created_by: "head-1".to_owned(),
            created_at: Utc::now(),
        }) {
            Ok(product) => product,
            Err(error) => panic!("product fixture failed: {error}"),
        }
    }

    fn specification(product_id: ProductId) -> Specification {
        match Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id,
            name: "Surface finish".to_owned(),
            requirement: SpecificationRequirement::Visual {
                condition: "No scratches".to_owned(),
                photo_required: false,
            },
        }) {
            Ok(specification) => specification,
            Err(error) => panic!("specification fixture failed: {error}"),
        }
    }

    #[tokio::test]
    async fn duplicate_part_number_conflicts() {
        let inspections = Arc::new(InMemoryInspectionRepository::new());
        let catalog = InMemoryCatalogRepository::new(inspections);

        let first = ProductRepository::create(&catalog, product("DS-4402")).await;
        assert!(first.is_ok());

        let second = ProductRepository::create(&catalog, product("DS-4402")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn referenced_specification_delete_is_refused() {
        let inspections = Arc::new(InMemoryInspectionRepository::new());
        let catalog = InMemoryCatalogRepository::new(inspections.clone());

        let subject = product("DS-4402");
        let spec = specification(subject.id());
        let spec_id = spec.id();
        let created = SpecificationRepository::create(&catalog, spec).await;
        assert!(created.is_ok());

        let now = Utc::now();
        let inspection_id = InspectionId::new();
        let inspection = match Inspection::new(InspectionInput {
            id: inspection_id,
            number: "QG-000001".to_owned(),
            product_id: subject.id(),
            created_by: "auditor-1".to_owned(),
            status: InspectionStatus::PendingTeamLeader,
            batch_number: None,
            remarks: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }) {
            Ok(inspection) => inspection,
            Err(error) => panic!("inspection fixture failed: {error}"),
        };
        let result = match InspectionResult::new(InspectionResultInput {
            id: Uuid::new_v4(),
            inspection_id,
            specification_id: spec_id,
            actual_value: "pass".to_owned(),
            is_pass: true,
            remarks: None,
        }) {
            Ok(result) => result,
            Err(error) => panic!("result fixture failed: {error}"),
        };
        let stored = inspections.create(inspection, vec![result]).await;
        assert!(stored.is_ok());

        let deleted = catalog.delete(spec_id).await;
        assert!(matches!(deleted, Err(AppError::ReferentialIntegrity(_))));

        // The specification survives the refused delete.
        let found = SpecificationRepository::find(&catalog, spec_id).await;
        assert!(found.is_ok_and(|value| value.is_some()));
    }
}
