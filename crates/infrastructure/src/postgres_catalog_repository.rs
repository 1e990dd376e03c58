use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use qualigate_application::{ProductRepository, SpecificationRepository};
use qualigate_core::{AppError, AppResult};
use qualigate_domain::{
    Product, ProductId, ProductInput, Specification, SpecificationId, SpecificationInput,
    SpecificationRequirement,
};

/// PostgreSQL-backed product and specification catalog implementation.
///
/// Specification deletion relies on the RESTRICT foreign key from
/// `inspection_results`; the database refuses the delete and the violation
/// surfaces as `ReferentialIntegrity`.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

fn error_code(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .map(|code| code.into_owned())
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: uuid::Uuid,
    name: String,
    part_number: String,
    description: Option<String>,
    is_active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> AppResult<Product> {
        Product::new(ProductInput {
            id: ProductId::from_uuid(self.id),
            name: self.name,
            part_number: self.part_number,
            description: self.description,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SpecificationRow {
    id: uuid::Uuid,
    product_id: uuid::Uuid,
    name: String,
    requirement: serde_json::Value,
}

impl SpecificationRow {
    fn into_specification(self) -> AppResult<Specification> {
        let requirement: SpecificationRequirement = serde_json::from_value(self.requirement)
            .map_err(|error| {
                AppError::Internal(format!("stored specification payload is invalid: {error}"))
            })?;

        Specification::new(SpecificationInput {
            id: SpecificationId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            name: self.name,
            requirement,
        })
    }
}

#[async_trait]
impl ProductRepository for PostgresCatalogRepository {
    async fn create(&self, product: Product) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, part_number, description, is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name().as_str())
        .bind(product.part_number().as_str())
        .bind(product.description())
        .bind(product.is_active())
        .bind(product.created_by())
        .bind(product.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if error_code(&error).as_deref() == Some(UNIQUE_VIOLATION) {
                AppError::Conflict(format!(
                    "part number '{}' is already registered",
                    product.part_number().as_str()
                ))
            } else {
                AppError::Internal(format!("failed to create product: {error}"))
            }
        })?;

        Ok(())
    }

    async fn find(&self, id: ProductId) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, part_number, description, is_active, created_by, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load product: {error}")))?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, part_number, description, is_active, created_by, created_at
            FROM products
            WHERE ($1 = FALSE OR is_active)
            ORDER BY part_number
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list products: {error}")))?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn set_active(&self, id: ProductId, is_active: bool) -> AppResult<()> {
        let updated = sqlx::query("UPDATE products SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update product active flag: {error}"))
            })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("product '{id}' does not exist")));
        }

        Ok(())
    }
}

#[async_trait]
impl SpecificationRepository for PostgresCatalogRepository {
    async fn create(&self, specification: Specification) -> AppResult<()> {
        let requirement = serde_json::to_value(specification.requirement()).map_err(|error| {
            AppError::Internal(format!("failed to encode specification payload: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO specifications (id, product_id, name, requirement)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(specification.id().as_uuid())
        .bind(specification.product_id().as_uuid())
        .bind(specification.name().as_str())
        .bind(requirement)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create specification: {error}")))?;

        Ok(())
    }

    async fn find(&self, id: SpecificationId) -> AppResult<Option<Specification>> {
        let row = sqlx::query_as::<_, SpecificationRow>(
            "SELECT id, product_id, name, requirement FROM specifications WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load specification: {error}")))?;

        row.map(SpecificationRow::into_specification).transpose()
    }

    async fn list_for_product(&self, product_id: ProductId) -> AppResult<Vec<Specification>> {
        let rows = sqlx::query_as::<_, SpecificationRow>(
            r#"
            SELECT id, product_id, name, requirement
            FROM specifications
            WHERE product_id = $1
            ORDER BY name
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list specifications: {error}")))?;

        rows.into_iter()
            .map(SpecificationRow::into_specification)
            .collect()
    }

    async fn delete(&self, id: SpecificationId) -> AppResult<()> {
        sqlx::query("DELETE FROM specifications WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if error_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    AppError::ReferentialIntegrity(format!(
                        "specification '{id}' is referenced by recorded inspection results"
                    ))
                } else {
                    AppError::Internal(format!("failed to delete specification: {error}"))
                }
            })?;

        Ok(())
    }
}
