use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use qualigate_core::{AppError, AppResult, UserIdentity};
use qualigate_domain::{
    ApprovalAction, ApprovalHistoryEntry, ApprovalHistoryInput, EvidenceRef, Inspection,
    InspectionId, InspectionInput, InspectionResult, InspectionResultInput, InspectionStatus,
    ResultInput, Role, SpecificationId, next_status,
};
use uuid::Uuid;

use crate::catalog_ports::{ProductRepository, SpecificationRepository};
use crate::inspection_ports::{
    ApprovalLedger, CreateInspectionInput, InspectionDetail, InspectionFilter,
    InspectionRepository, UpdateDetailsInput,
};
use crate::role_service::RoleService;

/// Inspection lifecycle service: submission, role-gated approval decisions,
/// and read projections.
#[derive(Clone)]
pub struct InspectionService {
    role_service: RoleService,
    products: Arc<dyn ProductRepository>,
    specifications: Arc<dyn SpecificationRepository>,
    inspections: Arc<dyn InspectionRepository>,
    ledger: Arc<dyn ApprovalLedger>,
}

impl InspectionService {
    /// Creates an inspection service.
    #[must_use]
    pub fn new(
        role_service: RoleService,
        products: Arc<dyn ProductRepository>,
        specifications: Arc<dyn SpecificationRepository>,
        inspections: Arc<dyn InspectionRepository>,
        ledger: Arc<dyn ApprovalLedger>,
    ) -> Self {
        Self {
            role_service,
            products,
            specifications,
            inspections,
            ledger,
        }
    }

    /// Submits a new inspection for an active product.
    ///
    /// Snapshots every specification currently defined for the product into
    /// one result row each, judging pass/fail per specification type. The
    /// initial status is always `pending_team_leader`; measured outcomes
    /// never auto-approve or auto-reject, every stage reviews regardless.
    pub async fn create_inspection(
        &self,
        actor: &UserIdentity,
        input: CreateInspectionInput,
    ) -> AppResult<Inspection> {
        self.role_service.require_role(actor, Role::Auditor).await?;

        let product = self.products.find(input.product_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("product '{}' does not exist", input.product_id))
        })?;

        if !product.is_active() {
            return Err(AppError::Validation(format!(
                "product '{}' is deactivated and not offered for new inspections",
                product.part_number().as_str()
            )));
        }

        let specifications = self.specifications.list_for_product(product.id()).await?;
        if specifications.is_empty() {
            return Err(AppError::Validation(format!(
                "product '{}' has no specifications to inspect",
                product.part_number().as_str()
            )));
        }

        let mut entered: HashMap<SpecificationId, ResultInput> = HashMap::new();
        for result in input.results {
            if entered.insert(result.specification_id, result).is_some() {
                return Err(AppError::Validation(
                    "duplicate result input for one specification".to_owned(),
                ));
            }
        }

        let inspection_id = InspectionId::new();
        let mut results = Vec::with_capacity(specifications.len());
        for specification in &specifications {
            let result = entered.remove(&specification.id()).ok_or_else(|| {
                AppError::Validation(format!(
                    "missing result input for specification '{}'",
                    specification.name().as_str()
                ))
            })?;

            let outcome = specification.evaluate(&result)?;
            results.push(InspectionResult::new(InspectionResultInput {
                id: Uuid::new_v4(),
                inspection_id,
                specification_id: specification.id(),
                actual_value: outcome.actual_value,
                is_pass: outcome.is_pass,
                remarks: result.remarks,
            })?);
        }

        if let Some(stray) = entered.keys().next() {
            return Err(AppError::Validation(format!(
                "result input references specification '{stray}' which does not belong to the product"
            )));
        }

        let now = Utc::now();
        let inspection = Inspection::new(InspectionInput {
            id: inspection_id,
            number: self.inspections.next_inspection_number().await?,
            product_id: product.id(),
            created_by: actor.subject().to_owned(),
            status: InspectionStatus::PendingTeamLeader,
            batch_number: input.batch_number,
            remarks: input.remarks,
            version: 1,
            created_at: now,
            updated_at: now,
        })?;

        self.inspections
            .create(inspection.clone(), results)
            .await?;

        Ok(inspection)
    }

    /// Applies one approval decision, the only mutator of status.
    ///
    /// The transition table is consulted for `(current status, actor role,
    /// action)`. A missing row is triaged in order: a terminal record
    /// (approved or rejected, including a repeat decision on it) surfaces as
    /// `InvalidTransition`; a reviewer whose stage the record already moved
    /// past gets a retryable `Conflict`; any other role mismatch is
    /// `Forbidden`. The status write and the ledger append happen as one
    /// atomic unit in the repository, guarded by compare-and-swap on the
    /// status read here — a concurrent decision that advanced the record
    /// first surfaces as `Conflict`.
    pub async fn decide(
        &self,
        inspection_id: InspectionId,
        actor: &UserIdentity,
        action: ApprovalAction,
        comment: &str,
    ) -> AppResult<Inspection> {
        let inspection = self.inspections.find(inspection_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("inspection '{inspection_id}' does not exist"))
        })?;

        let actor_role = self.role_service.require_any_role(actor).await?;
        let current = inspection.status();

        let Some(new_status) = next_status(current, actor_role, action) else {
            if !current.is_mutable() {
                return Err(AppError::InvalidTransition(format!(
                    "inspection '{}' is {} and accepts no further decisions",
                    inspection.number().as_str(),
                    current.as_str()
                )));
            }

            // A reviewer whose stage the record has already moved past saw a
            // stale status: that is a retryable conflict, not a role failure.
            let reviewer_stage = current.reviewer_role().and_then(|role| role.approval_stage());
            if let (Some(actor_stage), Some(current_stage)) =
                (actor_role.approval_stage(), reviewer_stage)
                && actor_stage < current_stage
            {
                return Err(AppError::Conflict(format!(
                    "inspection '{}' already advanced to '{}'",
                    inspection.number().as_str(),
                    current.as_str()
                )));
            }

            return Err(AppError::Forbidden(format!(
                "role '{}' cannot decide an inspection in status '{}'",
                actor_role.as_str(),
                current.as_str()
            )));
        };

        let entry = ApprovalHistoryEntry::new(ApprovalHistoryInput {
            id: Uuid::new_v4(),
            inspection_id,
            actor_subject: actor.subject().to_owned(),
            actor_role,
            action,
            previous_status: current,
            new_status,
            comment: comment.to_owned(),
            decided_at: Utc::now(),
        })?;

        self.inspections
            .apply_decision(inspection_id, current, new_status, entry)
            .await
    }

    /// Returns the full read projection of one inspection.
    pub async fn get_inspection(&self, id: InspectionId) -> AppResult<InspectionDetail> {
        let inspection = self
            .inspections
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))?;

        Ok(InspectionDetail {
            results: self.inspections.results_for(id).await?,
            evidence: self.inspections.evidence_for(id).await?,
            history: self.ledger.entries_for(id).await?,
            inspection,
        })
    }

    /// Lists inspections matching an advisory filter.
    pub async fn list_inspections(&self, filter: InspectionFilter) -> AppResult<Vec<Inspection>> {
        self.inspections.list(filter).await
    }

    /// Replaces the batch number and remarks of a still-pending inspection.
    ///
    /// Only the creator may update, and the repository re-checks mutability
    /// immediately before the write; a record frozen in between surfaces as
    /// `Forbidden`, a concurrent detail update as `Conflict`.
    pub async fn update_details(
        &self,
        actor: &UserIdentity,
        id: InspectionId,
        input: UpdateDetailsInput,
    ) -> AppResult<Inspection> {
        let inspection = self
            .inspections
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))?;

        if inspection.created_by() != actor.subject() {
            return Err(AppError::Forbidden(format!(
                "inspection '{}' belongs to another auditor",
                inspection.number().as_str()
            )));
        }

        self.inspections
            .update_details(id, inspection.version(), input.batch_number, input.remarks)
            .await
    }

    /// Appends one evidence reference to a still-pending inspection.
    pub async fn add_evidence(
        &self,
        actor: &UserIdentity,
        id: InspectionId,
        uri: String,
        description: Option<String>,
    ) -> AppResult<EvidenceRef> {
        let inspection = self
            .inspections
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))?;

        if inspection.created_by() != actor.subject() {
            return Err(AppError::Forbidden(format!(
                "inspection '{}' belongs to another auditor",
                inspection.number().as_str()
            )));
        }

        let evidence = EvidenceRef::new(Uuid::new_v4(), id, uri, description, Utc::now())?;
        self.inspections.append_evidence(evidence.clone()).await?;
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests;
