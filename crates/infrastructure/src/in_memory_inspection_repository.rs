use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use qualigate_application::{ApprovalLedger, InspectionFilter, InspectionRepository};
use qualigate_core::{AppError, AppResult};
use qualigate_domain::{
    ApprovalHistoryEntry, EvidenceRef, Inspection, InspectionId, InspectionResult,
    InspectionStatus, SpecificationId,
};

#[derive(Debug, Default)]
struct InspectionState {
    inspections: HashMap<InspectionId, Inspection>,
    results: Vec<InspectionResult>,
    evidence: Vec<EvidenceRef>,
    history: Vec<ApprovalHistoryEntry>,
    sequence: u64,
}

/// In-memory inspection store and decision ledger implementation.
///
/// All state sits behind one lock so the status compare-and-swap and the
/// ledger append of a decision commit as a single atomic unit.
#[derive(Debug, Default)]
pub struct InMemoryInspectionRepository {
    state: RwLock<InspectionState>,
}

impl InMemoryInspectionRepository {
    /// Creates an empty in-memory inspection store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InspectionState::default()),
        }
    }

    /// Returns whether any recorded result references the specification.
    pub(crate) async fn is_specification_referenced(
        &self,
        specification_id: SpecificationId,
    ) -> bool {
        self.state
            .read()
            .await
            .results
            .iter()
            .any(|result| result.specification_id() == specification_id)
    }

    fn require_mutable(inspection: &Inspection) -> AppResult<()> {
        if !inspection.status().is_mutable() {
            return Err(AppError::Forbidden(format!(
                "inspection '{}' is {} and permanently read-only",
                inspection.number().as_str(),
                inspection.status().as_str()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl InspectionRepository for InMemoryInspectionRepository {
    async fn next_inspection_number(&self) -> AppResult<String> {
        let mut state = self.state.write().await;
        state.sequence += 1;
        Ok(format!("QG-{:06}", state.sequence))
    }

    async fn create(
        &self,
        inspection: Inspection,
        results: Vec<InspectionResult>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.inspections.contains_key(&inspection.id()) {
            return Err(AppError::Conflict(format!(
                "inspection '{}' already exists",
                inspection.id()
            )));
        }

        state.inspections.insert(inspection.id(), inspection);
        state.results.extend(results);
        Ok(())
    }

    async fn find(&self, id: InspectionId) -> AppResult<Option<Inspection>> {
        Ok(self.state.read().await.inspections.get(&id).cloned())
    }

    async fn list(&self, filter: InspectionFilter) -> AppResult<Vec<Inspection>> {
        let state = self.state.read().await;
        let mut listed: Vec<Inspection> = state
            .inspections
            .values()
            .filter(|inspection| {
                filter
                    .status
                    .is_none_or(|status| inspection.status() == status)
                    && filter
                        .product_id
                        .is_none_or(|product_id| inspection.product_id() == product_id)
                    && filter
                        .created_by
                        .as_deref()
                        .is_none_or(|subject| inspection.created_by() == subject)
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(listed)
    }

    async fn results_for(&self, id: InspectionId) -> AppResult<Vec<InspectionResult>> {
        Ok(self
            .state
            .read()
            .await
            .results
            .iter()
            .filter(|result| result.inspection_id() == id)
            .cloned()
            .collect())
    }

    async fn evidence_for(&self, id: InspectionId) -> AppResult<Vec<EvidenceRef>> {
        Ok(self
            .state
            .read()
            .await
            .evidence
            .iter()
            .filter(|evidence| evidence.inspection_id() == id)
            .cloned()
            .collect())
    }

    async fn append_evidence(&self, evidence: EvidenceRef) -> AppResult<()> {
        let mut state = self.state.write().await;
        let inspection = state
            .inspections
            .get(&evidence.inspection_id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "inspection '{}' does not exist",
                    evidence.inspection_id()
                ))
            })?;

        Self::require_mutable(inspection)?;
        state.evidence.push(evidence);
        Ok(())
    }

    async fn update_details(
        &self,
        id: InspectionId,
        expected_version: i64,
        batch_number: Option<String>,
        remarks: Option<String>,
    ) -> AppResult<Inspection> {
        let mut state = self.state.write().await;
        let inspection = state
            .inspections
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))?;

        // Mutability is re-checked here, at write time, so an approval that
        // landed after the caller's read cannot be overwritten.
        Self::require_mutable(&inspection)?;

        if inspection.version() != expected_version {
            return Err(AppError::Conflict(format!(
                "inspection '{}' was modified concurrently",
                inspection.number().as_str()
            )));
        }

        let updated = inspection.with_details(batch_number, remarks, Utc::now());
        state.inspections.insert(id, updated.clone());
        Ok(updated)
    }

    async fn apply_decision(
        &self,
        id: InspectionId,
        expected_status: InspectionStatus,
        new_status: InspectionStatus,
        entry: ApprovalHistoryEntry,
    ) -> AppResult<Inspection> {
        let mut state = self.state.write().await;
        let inspection = state
            .inspections
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))?;

        if inspection.status() != expected_status {
            return Err(AppError::Conflict(format!(
                "inspection '{}' is '{}', decision expected '{}'",
                inspection.number().as_str(),
                inspection.status().as_str(),
                expected_status.as_str()
            )));
        }

        let updated = inspection.with_status(new_status, Utc::now());
        state.inspections.insert(id, updated.clone());
        state.history.push(entry);
        Ok(updated)
    }
}

#[async_trait]
impl ApprovalLedger for InMemoryInspectionRepository {
    async fn entries_for(
        &self,
        inspection_id: InspectionId,
    ) -> AppResult<Vec<ApprovalHistoryEntry>> {
        Ok(self
            .state
            .read()
            .await
            .history
            .iter()
            .filter(|entry| entry.inspection_id() == inspection_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use qualigate_application::{ApprovalLedger, InspectionFilter, InspectionRepository};
    use qualigate_core::AppError;
    use qualigate_domain::{
        ApprovalAction, ApprovalHistoryEntry, ApprovalHistoryInput, EvidenceRef, Inspection,
        InspectionId, InspectionInput, InspectionStatus, ProductId, Role,
    };

    use super::InMemoryInspectionRepository;

    fn inspection(status: InspectionStatus) -> Inspection {
        let now = Utc::now();
        match Inspection::new(InspectionInput {
            id: InspectionId::new(),
            number: "QG-000001".to_owned(),
            product_id: ProductId::new(),
            created_by: "auditor-1".to_owned(),
            status,
            batch_number: None,
            remarks: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }) {
            Ok(inspection) => inspection,
            Err(error) => panic!("inspection fixture failed: {error}"),
        }
    }

    fn entry(
        inspection_id: InspectionId,
        previous: InspectionStatus,
        new: InspectionStatus,
        action: ApprovalAction,
        role: Role,
    ) -> ApprovalHistoryEntry {
        match ApprovalHistoryEntry::new(ApprovalHistoryInput {
            id: Uuid::new_v4(),
            inspection_id,
            actor_subject: "reviewer-1".to_owned(),
            actor_role: role,
            action,
            previous_status: previous,
            new_status: new,
            comment: "reviewed".to_owned(),
            decided_at: Utc::now(),
        }) {
            Ok(entry) => entry,
            Err(error) => panic!("entry fixture failed: {error}"),
        }
    }

    #[tokio::test]
    async fn concurrent_decisions_on_one_inspection_commit_once() {
        let repository = Arc::new(InMemoryInspectionRepository::new());
        let record = inspection(InspectionStatus::PendingQualityHead);
        let id = record.id();
        let created = repository.create(record, Vec::new()).await;
        assert!(created.is_ok());

        let approve = repository.apply_decision(
            id,
            InspectionStatus::PendingQualityHead,
            InspectionStatus::Approved,
            entry(
                id,
                InspectionStatus::PendingQualityHead,
                InspectionStatus::Approved,
                ApprovalAction::Approve,
                Role::QualityHead,
            ),
        );
        let reject = repository.apply_decision(
            id,
            InspectionStatus::PendingQualityHead,
            InspectionStatus::Rejected,
            entry(
                id,
                InspectionStatus::PendingQualityHead,
                InspectionStatus::Rejected,
                ApprovalAction::Reject,
                Role::QualityHead,
            ),
        );

        let (approve, reject) = tokio::join!(approve, reject);
        assert_ne!(approve.is_ok(), reject.is_ok());

        let loser = if approve.is_err() { approve } else { reject };
        assert!(matches!(loser, Err(AppError::Conflict(_))));

        let entries = repository.entries_for(id).await;
        assert!(entries.is_ok_and(|values| values.len() == 1));
    }

    #[tokio::test]
    async fn frozen_inspection_rejects_detail_and_evidence_writes() {
        let repository = InMemoryInspectionRepository::new();
        let record = inspection(InspectionStatus::Approved);
        let id = record.id();
        let version = record.version();
        let created = repository.create(record, Vec::new()).await;
        assert!(created.is_ok());

        let update = repository
            .update_details(id, version, Some("B-90".to_owned()), None)
            .await;
        assert!(matches!(update, Err(AppError::Forbidden(_))));

        let evidence = match EvidenceRef::new(
            Uuid::new_v4(),
            id,
            "s3://evidence/photo.jpg",
            None,
            Utc::now(),
        ) {
            Ok(evidence) => evidence,
            Err(error) => panic!("evidence fixture failed: {error}"),
        };
        let appended = repository.append_evidence(evidence).await;
        assert!(matches!(appended, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn stale_version_detail_update_conflicts() {
        let repository = InMemoryInspectionRepository::new();
        let record = inspection(InspectionStatus::PendingTeamLeader);
        let id = record.id();
        let version = record.version();
        let created = repository.create(record, Vec::new()).await;
        assert!(created.is_ok());

        let first = repository
            .update_details(id, version, Some("B-90".to_owned()), None)
            .await;
        assert!(first.is_ok());

        let second = repository
            .update_details(id, version, Some("B-91".to_owned()), None)
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn evidence_replays_in_append_order() {
        let repository = InMemoryInspectionRepository::new();
        let record = inspection(InspectionStatus::PendingTeamLeader);
        let id = record.id();
        let created = repository.create(record, Vec::new()).await;
        assert!(created.is_ok());

        for uri in [
            "s3://evidence/first.jpg",
            "s3://evidence/second.jpg",
            "s3://evidence/third.jpg",
        ] {
            let evidence = match EvidenceRef::new(Uuid::new_v4(), id, uri, None, Utc::now()) {
                Ok(evidence) => evidence,
                Err(error) => panic!("evidence fixture failed: {error}"),
            };
            let appended = repository.append_evidence(evidence).await;
            assert!(appended.is_ok());
        }

        let listed = repository.evidence_for(id).await;
        assert!(listed.is_ok_and(|values| {
            values
                .iter()
                .map(|evidence| evidence.uri().as_str())
                .eq([
                    "s3://evidence/first.jpg",
                    "s3://evidence/second.jpg",
                    "s3://evidence/third.jpg",
                ])
        }));
    }

    #[tokio::test]
    async fn numbers_look_monotonic() {
        let repository = InMemoryInspectionRepository::new();
        let first = repository.next_inspection_number().await;
        let second = repository.next_inspection_number().await;
        assert!(first.is_ok_and(|value| value == "QG-000001"));
        assert!(second.is_ok_and(|value| value == "QG-000002"));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let repository = InMemoryInspectionRepository::new();
        for _ in 0..3 {
            let created = repository
                .create(inspection(InspectionStatus::PendingTeamLeader), Vec::new())
                .await;
            assert!(created.is_ok());
        }

        let listed = repository.list(InspectionFilter::default()).await;
        assert!(listed.is_ok_and(|values| {
            values.len() == 3
                && values
                    .windows(2)
                    .all(|pair| pair[0].created_at() >= pair[1].created_at())
        }));
    }
}
