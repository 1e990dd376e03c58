use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qualigate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::ProductId;
use crate::role::Role;
use crate::specification::SpecificationId;

/// Identifier of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InspectionId(Uuid);

impl InspectionId {
    /// Creates a random inspection identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an inspection identifier from an existing UUID value.
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

impl Default for InspectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InspectionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    /// Awaiting first-stage review.
    PendingTeamLeader,
    /// Awaiting second-stage review.
    PendingHofAuditor,
    /// Awaiting final approval.
    PendingQualityHead,
    /// Terminal: fully approved, permanently read-only.
    Approved,
    /// Locked: rejected, permanently read-only; correction requires a new
    /// inspection for the same product.
    Rejected,
}

impl InspectionStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingTeamLeader => "pending_team_leader",
            Self::PendingHofAuditor => "pending_hof_auditor",
            Self::PendingQualityHead => "pending_quality_head",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether the inspection may still change.
    ///
    /// Approved and rejected records are frozen as audit evidence; the only
    /// writes ever applied to a non-mutable record were the status write and
    /// ledger append that froze it.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        matches!(
            self,
            Self::PendingTeamLeader | Self::PendingHofAuditor | Self::PendingQualityHead
        )
    }

    /// Returns the role designated to review this status, if pending.
    #[must_use]
    pub fn reviewer_role(&self) -> Option<Role> {
        match self {
            Self::PendingTeamLeader => Some(Role::TeamLeader),
            Self::PendingHofAuditor => Some(Role::HofAuditor),
            Self::PendingQualityHead => Some(Role::QualityHead),
            Self::Approved | Self::Rejected => None,
        }
    }

    /// Returns all known statuses.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[InspectionStatus] = &[
            InspectionStatus::PendingTeamLeader,
            InspectionStatus::PendingHofAuditor,
            InspectionStatus::PendingQualityHead,
            InspectionStatus::Approved,
            InspectionStatus::Rejected,
        ];

        ALL
    }
}

impl FromStr for InspectionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending_team_leader" => Ok(Self::PendingTeamLeader),
            "pending_hof_auditor" => Ok(Self::PendingHofAuditor),
            "pending_quality_head" => Ok(Self::PendingQualityHead),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown inspection status '{value}'"
            ))),
        }
    }
}

/// Input payload used to construct a validated inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionInput {
    /// Stable inspection identifier.
    pub id: InspectionId,
    /// Human-readable inspection number.
    pub number: String,
    /// Inspected product.
    pub product_id: ProductId,
    /// Subject of the creating auditor.
    pub created_by: String,
    /// Current lifecycle status.
    pub status: InspectionStatus,
    /// Optional batch identifier.
    pub batch_number: Option<String>,
    /// Optional free-text remarks.
    pub remarks: Option<String>,
    /// Optimistic-concurrency token, bumped on every write.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One execution instance of all specifications for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    id: InspectionId,
    number: NonEmptyString,
    product_id: ProductId,
    created_by: String,
    status: InspectionStatus,
    batch_number: Option<String>,
    remarks: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Inspection {
    /// Creates a validated inspection.
    pub fn new(input: InspectionInput) -> AppResult<Self> {
        let InspectionInput {
            id,
            number,
            product_id,
            created_by,
            status,
            batch_number,
            remarks,
            version,
            created_at,
            updated_at,
        } = input;

        let batch_number = batch_number.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            number: NonEmptyString::new(number)?,
            product_id,
            created_by,
            status,
            batch_number,
            remarks,
            version,
            created_at,
            updated_at,
        })
    }

    /// Returns the inspection identifier.
    #[must_use]
    pub fn id(&self) -> InspectionId {
        self.id
    }

    /// Returns the human-readable inspection number.
    #[must_use]
    pub fn number(&self) -> &NonEmptyString {
        &self.number
    }

    /// Returns the inspected product identifier.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the creating auditor's subject.
    #[must_use]
    pub fn created_by(&self) -> &str {
        self.created_by.as_str()
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    /// Returns the optional batch identifier.
    #[must_use]
    pub fn batch_number(&self) -> Option<&str> {
        self.batch_number.as_deref()
    }

    /// Returns the optional free-text remarks.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    /// Returns the optimistic-concurrency token.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-modified timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy advanced to a new status with a bumped version.
    #[must_use]
    pub fn with_status(mut self, status: InspectionStatus, updated_at: DateTime<Utc>) -> Self {
        self.status = status;
        self.version += 1;
        self.updated_at = updated_at;
        self
    }

    /// Returns a copy with batch number and remarks replaced and a bumped
    /// version.
    #[must_use]
    pub fn with_details(
        mut self,
        batch_number: Option<String>,
        remarks: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.batch_number = batch_number.filter(|value| !value.trim().is_empty());
        self.remarks = remarks.filter(|value| !value.trim().is_empty());
        self.version += 1;
        self.updated_at = updated_at;
        self
    }
}

/// Recorded outcome of one specification within one inspection.
///
/// Created once at inspection submission and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionResult {
    id: Uuid,
    inspection_id: InspectionId,
    specification_id: SpecificationId,
    actual_value: String,
    is_pass: bool,
    remarks: Option<String>,
}

/// Input payload used to construct a validated inspection result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionResultInput {
    /// Stable result identifier.
    pub id: Uuid,
    /// Owning inspection.
    pub inspection_id: InspectionId,
    /// Specification the value was recorded against.
    pub specification_id: SpecificationId,
    /// Recorded actual value text.
    pub actual_value: String,
    /// Pass flag computed at submission.
    pub is_pass: bool,
    /// Optional remarks.
    pub remarks: Option<String>,
}

impl InspectionResult {
    /// Creates a validated inspection result.
    pub fn new(input: InspectionResultInput) -> AppResult<Self> {
        let InspectionResultInput {
            id,
            inspection_id,
            specification_id,
            actual_value,
            is_pass,
            remarks,
        } = input;

        if actual_value.trim().is_empty() {
            return Err(AppError::Validation(
                "inspection result requires a recorded actual value".to_owned(),
            ));
        }

        Ok(Self {
            id,
            inspection_id,
            specification_id,
            actual_value,
            is_pass,
            remarks,
        })
    }

    /// Returns the result identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning inspection identifier.
    #[must_use]
    pub fn inspection_id(&self) -> InspectionId {
        self.inspection_id
    }

    /// Returns the specification identifier.
    #[must_use]
    pub fn specification_id(&self) -> SpecificationId {
        self.specification_id
    }

    /// Returns the recorded actual value text.
    #[must_use]
    pub fn actual_value(&self) -> &str {
        self.actual_value.as_str()
    }

    /// Returns the pass flag computed at submission.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.is_pass
    }

    /// Returns the optional remarks.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }
}

/// Reference to one piece of evidence attached to an inspection.
///
/// Evidence is an append-only list; storage mechanics live behind the URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    id: Uuid,
    inspection_id: InspectionId,
    uri: NonEmptyString,
    description: Option<String>,
    added_at: DateTime<Utc>,
}

impl EvidenceRef {
    /// Creates a validated evidence reference.
    pub fn new(
        id: Uuid,
        inspection_id: InspectionId,
        uri: impl Into<String>,
        description: Option<String>,
        added_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            inspection_id,
            uri: NonEmptyString::new(uri)?,
            description,
            added_at,
        })
    }

    /// Returns the evidence identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning inspection identifier.
    #[must_use]
    pub fn inspection_id(&self) -> InspectionId {
        self.inspection_id
    }

    /// Returns the evidence URI.
    #[must_use]
    pub fn uri(&self) -> &NonEmptyString {
        &self.uri
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the append timestamp.
    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }
}
