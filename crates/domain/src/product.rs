use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use qualigate_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an inspectable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a random product identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a product identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProductId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Input payload used to construct a validated product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    /// Stable product identifier.
    pub id: ProductId,
    /// Product display name.
    pub name: String,
    /// Unique part/catalog number.
    pub part_number: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Whether the product is offered for new inspections.
    pub is_active: bool,
    /// Subject of the creating actor, kept for audit attribution.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An inspectable subject in the catalog.
///
/// A product referenced by at least one inspection is never hard-deleted,
/// only deactivated; deactivation removes it from the set offered for new
/// inspections and never affects existing inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: NonEmptyString,
    part_number: NonEmptyString,
    description: Option<String>,
    is_active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a validated product.
    pub fn new(input: ProductInput) -> AppResult<Self> {
        let ProductInput {
            id,
            name,
            part_number,
            description,
            is_active,
            created_by,
            created_at,
        } = input;

        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            part_number: NonEmptyString::new(part_number)?,
            description,
            is_active,
            created_by,
            created_at,
        })
    }

    /// Returns the product identifier.
    #[must_use]
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Returns the product display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the unique part number.
    #[must_use]
    pub fn part_number(&self) -> &NonEmptyString {
        &self.part_number
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the product is offered for new inspections.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creating actor's subject.
    #[must_use]
    pub fn created_by(&self) -> &str {
        self.created_by.as_str()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a copy with the active flag replaced.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Product, ProductId, ProductInput};

    fn input() -> ProductInput {
        ProductInput {
            id: ProductId::new(),
            name: "Drive Shaft".to_owned(),
            part_number: "DS-4402".to_owned(),
            description: Some("  ".to_owned()),
            is_active: true,
            created_by: "auditor-1".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn product_requires_part_number() {
        let product = Product::new(ProductInput {
            part_number: " ".to_owned(),
            ..input()
        });
        assert!(product.is_err());
    }

    #[test]
    fn blank_description_is_dropped() {
        let product = Product::new(input());
        assert!(product.is_ok_and(|value| value.description().is_none()));
    }
}
