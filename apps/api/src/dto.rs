use qualigate_core::{AppError, AppResult};
use qualigate_domain::{
    ApprovalAction, ApprovalHistoryEntry, EvidenceRef, Inspection, InspectionResult, Product,
    ResultInput, Specification, SpecificationId, SpecificationRequirement,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for quality head bootstrap.
#[derive(Debug, Deserialize)]
pub struct BootstrapQualityHeadRequest {
    pub registration_code: String,
}

/// Incoming payload for role assignment; `role: null` clears the target's
/// assignment.
#[derive(Debug, Deserialize)]
pub struct RoleAssignmentRequest {
    pub subject: String,
    pub role: Option<String>,
}

/// API representation of a subject's role assignment.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub subject: String,
    pub role: Option<String>,
}

/// Incoming payload for product creation.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub part_number: String,
    pub description: Option<String>,
}

/// API representation of a product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product_id: Uuid,
    pub name: String,
    pub part_number: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: String,
}

/// Incoming payload for specification creation.
#[derive(Debug, Deserialize)]
pub struct CreateSpecificationRequest {
    pub name: String,
    pub requirement: SpecificationRequirement,
}

/// API representation of a specification.
#[derive(Debug, Serialize)]
pub struct SpecificationResponse {
    pub specification_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub requirement: SpecificationRequirement,
}

/// One entered result within an inspection submission.
#[derive(Debug, Deserialize)]
pub struct ResultEntryRequest {
    pub specification_id: Uuid,
    pub actual_value: Option<String>,
    pub passed: Option<bool>,
    pub remarks: Option<String>,
}

/// Incoming payload for inspection submission.
#[derive(Debug, Deserialize)]
pub struct CreateInspectionRequest {
    pub product_id: Uuid,
    pub batch_number: Option<String>,
    pub remarks: Option<String>,
    pub results: Vec<ResultEntryRequest>,
}

/// Incoming payload for an approval decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: String,
    pub comment: String,
}

impl DecisionRequest {
    /// Parses the requested action, accepting both the imperative API
    /// spelling and the past-tense storage form.
    pub fn approval_action(&self) -> AppResult<ApprovalAction> {
        match self.action.as_str() {
            "approve" | "approved" => Ok(ApprovalAction::Approve),
            "reject" | "rejected" => Ok(ApprovalAction::Reject),
            other => Err(AppError::Validation(format!(
                "unknown approval action '{other}'"
            ))),
        }
    }
}

/// Incoming payload for a detail update on a pending inspection.
#[derive(Debug, Deserialize)]
pub struct UpdateInspectionDetailsRequest {
    pub batch_number: Option<String>,
    pub remarks: Option<String>,
}

/// Incoming payload for an evidence append.
#[derive(Debug, Deserialize)]
pub struct AddEvidenceRequest {
    pub uri: String,
    pub description: Option<String>,
}

/// Query filters for product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub active_only: Option<bool>,
}

/// Query filters for inspection listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListInspectionsQuery {
    pub status: Option<String>,
    pub product_id: Option<Uuid>,
    pub created_by: Option<String>,
}

/// API representation of an inspection.
#[derive(Debug, Serialize)]
pub struct InspectionResponse {
    pub inspection_id: Uuid,
    pub number: String,
    pub product_id: Uuid,
    pub created_by: String,
    pub status: String,
    pub batch_number: Option<String>,
    pub remarks: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// API representation of one recorded specification outcome.
#[derive(Debug, Serialize)]
pub struct InspectionResultResponse {
    pub result_id: Uuid,
    pub specification_id: Uuid,
    pub actual_value: String,
    pub is_pass: bool,
    pub remarks: Option<String>,
}

/// API representation of one evidence reference.
#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub evidence_id: Uuid,
    pub uri: String,
    pub description: Option<String>,
    pub added_at: String,
}

/// API representation of one approval ledger entry.
#[derive(Debug, Serialize)]
pub struct ApprovalHistoryEntryResponse {
    pub entry_id: Uuid,
    pub actor_subject: String,
    pub actor_role: String,
    pub action: String,
    pub previous_status: String,
    pub new_status: String,
    pub comment: String,
    pub decided_at: String,
}

/// Full read projection of one inspection.
#[derive(Debug, Serialize)]
pub struct InspectionDetailResponse {
    pub inspection: InspectionResponse,
    pub results: Vec<InspectionResultResponse>,
    pub evidence: Vec<EvidenceResponse>,
    pub history: Vec<ApprovalHistoryEntryResponse>,
}

impl From<Product> for ProductResponse {
    fn from(value: Product) -> Self {
        Self {
            product_id: value.id().as_uuid(),
            name: value.name().as_str().to_owned(),
            part_number: value.part_number().as_str().to_owned(),
            description: value.description().map(str::to_owned),
            is_active: value.is_active(),
            created_by: value.created_by().to_owned(),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

impl From<Specification> for SpecificationResponse {
    fn from(value: Specification) -> Self {
        Self {
            specification_id: value.id().as_uuid(),
            product_id: value.product_id().as_uuid(),
            name: value.name().as_str().to_owned(),
            requirement: value.requirement().clone(),
        }
    }
}

impl From<ResultEntryRequest> for ResultInput {
    fn from(value: ResultEntryRequest) -> Self {
        Self {
            specification_id: SpecificationId::from_uuid(value.specification_id),
            actual_value: value.actual_value,
            passed: value.passed,
            remarks: value.remarks,
        }
    }
}

impl From<Inspection> for InspectionResponse {
    fn from(value: Inspection) -> Self {
        Self {
            inspection_id: value.id().as_uuid(),
            number: value.number().as_str().to_owned(),
            product_id: value.product_id().as_uuid(),
            created_by: value.created_by().to_owned(),
            status: value.status().as_str().to_owned(),
            batch_number: value.batch_number().map(str::to_owned),
            remarks: value.remarks().map(str::to_owned),
            version: value.version(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}

impl From<InspectionResult> for InspectionResultResponse {
    fn from(value: InspectionResult) -> Self {
        Self {
            result_id: value.id(),
            specification_id: value.specification_id().as_uuid(),
            actual_value: value.actual_value().to_owned(),
            is_pass: value.is_pass(),
            remarks: value.remarks().map(str::to_owned),
        }
    }
}

impl From<EvidenceRef> for EvidenceResponse {
    fn from(value: EvidenceRef) -> Self {
        Self {
            evidence_id: value.id(),
            uri: value.uri().as_str().to_owned(),
            description: value.description().map(str::to_owned),
            added_at: value.added_at().to_rfc3339(),
        }
    }
}

impl From<ApprovalHistoryEntry> for ApprovalHistoryEntryResponse {
    fn from(value: ApprovalHistoryEntry) -> Self {
        Self {
            entry_id: value.id(),
            actor_subject: value.actor_subject().to_owned(),
            actor_role: value.actor_role().as_str().to_owned(),
            action: value.action().as_str().to_owned(),
            previous_status: value.previous_status().as_str().to_owned(),
            new_status: value.new_status().as_str().to_owned(),
            comment: value.comment().as_str().to_owned(),
            decided_at: value.decided_at().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use qualigate_domain::ApprovalAction;

    use super::DecisionRequest;

    fn request(action: &str) -> DecisionRequest {
        DecisionRequest {
            action: action.to_owned(),
            comment: "reviewed".to_owned(),
        }
    }

    #[test]
    fn decision_action_accepts_both_spellings() {
        for action in ["approve", "approved"] {
            assert_eq!(
                request(action).approval_action().ok(),
                Some(ApprovalAction::Approve)
            );
        }
        for action in ["reject", "rejected"] {
            assert_eq!(
                request(action).approval_action().ok(),
                Some(ApprovalAction::Reject)
            );
        }
    }

    #[test]
    fn decision_action_refuses_unknown_values() {
        assert!(request("escalate").approval_action().is_err());
    }
}
