use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use qualigate_core::{AppError, AppResult, UserIdentity};
use qualigate_domain::{
    ApprovalAction, ApprovalHistoryEntry, EvidenceRef, Inspection, InspectionId, InspectionResult,
    InspectionStatus, Product, ProductId, ProductInput, ResultInput, Role, Specification,
    SpecificationId, SpecificationInput, SpecificationRequirement,
};

use crate::catalog_ports::{ProductRepository, SpecificationRepository};
use crate::inspection_ports::{
    ApprovalLedger, CreateInspectionInput, InspectionFilter, InspectionRepository,
    UpdateDetailsInput,
};
use crate::role_ports::RoleRepository;
use crate::role_service::RoleService;

use super::InspectionService;

struct FakeRoleRepository {
    roles: HashMap<String, Role>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(&self, subject: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.get(subject).copied())
    }

    async fn save_role(&self, _subject: &str, _role: Option<Role>) -> AppResult<()> {
        Ok(())
    }

    async fn quality_head_exists(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn bootstrap_quality_head(&self, _subject: &str) -> AppResult<()> {
        Ok(())
    }
}

struct FakeCatalog {
    products: HashMap<ProductId, Product>,
    specifications: Vec<Specification>,
}

#[async_trait]
impl ProductRepository for FakeCatalog {
    async fn create(&self, _product: Product) -> AppResult<()> {
        Ok(())
    }

    async fn find(&self, id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.products.get(&id).cloned())
    }

    async fn list(&self, _active_only: bool) -> AppResult<Vec<Product>> {
        Ok(self.products.values().cloned().collect())
    }

    async fn set_active(&self, _id: ProductId, _is_active: bool) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SpecificationRepository for FakeCatalog {
    async fn create(&self, _specification: Specification) -> AppResult<()> {
        Ok(())
    }

    async fn find(&self, id: SpecificationId) -> AppResult<Option<Specification>> {
        Ok(self
            .specifications
            .iter()
            .find(|specification| specification.id() == id)
            .cloned())
    }

    async fn list_for_product(&self, product_id: ProductId) -> AppResult<Vec<Specification>> {
        Ok(self
            .specifications
            .iter()
            .filter(|specification| specification.product_id() == product_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, _id: SpecificationId) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeInspectionState {
    inspections: HashMap<InspectionId, Inspection>,
    results: Vec<InspectionResult>,
    evidence: Vec<EvidenceRef>,
    history: Vec<ApprovalHistoryEntry>,
    sequence: u64,
}

/// State lives under one mutex so the decision compare-and-swap plus ledger
/// append behave as the single atomic unit the port demands.
#[derive(Default)]
struct FakeInspectionRepository {
    state: Mutex<FakeInspectionState>,
}

#[async_trait]
impl InspectionRepository for FakeInspectionRepository {
    async fn next_inspection_number(&self) -> AppResult<String> {
        let mut state = self.state.lock().await;
        state.sequence += 1;
        Ok(format!("QG-{:05}", state.sequence))
    }

    async fn create(
        &self,
        inspection: Inspection,
        results: Vec<InspectionResult>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.inspections.insert(inspection.id(), inspection);
        state.results.extend(results);
        Ok(())
    }

    async fn find(&self, id: InspectionId) -> AppResult<Option<Inspection>> {
        Ok(self.state.lock().await.inspections.get(&id).cloned())
    }

    async fn list(&self, filter: InspectionFilter) -> AppResult<Vec<Inspection>> {
        Ok(self
            .state
            .lock()
            .await
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
            .collect())
    }

    async fn results_for(&self, id: InspectionId) -> AppResult<Vec<InspectionResult>> {
        Ok(self
            .state
            .lock()
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
            .lock()
            .await
            .evidence
            .iter()
            .filter(|evidence| evidence.inspection_id() == id)
            .cloned()
            .collect())
    }

    async fn append_evidence(&self, evidence: EvidenceRef) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let inspection = state
            .inspections
            .get(&evidence.inspection_id())
            .ok_or_else(|| AppError::NotFound("inspection does not exist".to_owned()))?;

        if !inspection.status().is_mutable() {
            return Err(AppError::Forbidden(format!(
                "inspection is {} and read-only",
                inspection.status().as_str()
            )));
        }

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
        let mut state = self.state.lock().await;
        let inspection = state
            .inspections
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("inspection does not exist".to_owned()))?;

        if !inspection.status().is_mutable() {
            return Err(AppError::Forbidden(format!(
                "inspection is {} and read-only",
                inspection.status().as_str()
            )));
        }

        if inspection.version() != expected_version {
            return Err(AppError::Conflict("inspection version is stale".to_owned()));
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
        let mut state = self.state.lock().await;
        let inspection = state
            .inspections
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("inspection does not exist".to_owned()))?;

        if inspection.status() != expected_status {
            return Err(AppError::Conflict(format!(
                "inspection status is '{}', expected '{}'",
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
impl ApprovalLedger for FakeInspectionRepository {
    async fn entries_for(
        &self,
        inspection_id: InspectionId,
    ) -> AppResult<Vec<ApprovalHistoryEntry>> {
        Ok(self
            .state
            .lock()
            .await
            .history
            .iter()
            .filter(|entry| entry.inspection_id() == inspection_id)
            .cloned()
            .collect())
    }
}

fn identity(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None)
}

struct Harness {
    service: InspectionService,
    repository: Arc<FakeInspectionRepository>,
    product_id: ProductId,
    dimensional_id: SpecificationId,
    visual_id: SpecificationId,
}

fn harness() -> Harness {
    let product = match Product::new(ProductInput {
        id: ProductId::new(),
        name: "Drive Shaft".to_owned(),
        part_number: "DS-4402".to_owned(),
        description: None,
        is_active: true,
        created_by: "head-1".to_owned(),
        created_at: Utc::now(),
    }) {
        Ok(product) => product,
        Err(error) => panic!("product fixture failed: {error}"),
    };
    harness_with_product(product)
}

fn harness_with_product(product: Product) -> Harness {
    let product_id = product.id();
    let dimensional = match Specification::new(SpecificationInput {
        id: SpecificationId::new(),
        product_id,
        name: "Shaft diameter".to_owned(),
        requirement: SpecificationRequirement::Dimensional {
            standard_value: 10.5,
            tolerance_min: 10.0,
            tolerance_max: 11.0,
            unit: "mm".to_owned(),
        },
    }) {
        Ok(specification) => specification,
        Err(error) => panic!("specification fixture failed: {error}"),
    };
    let visual = match Specification::new(SpecificationInput {
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
    };

    let roles = HashMap::from([
        ("auditor-1".to_owned(), Role::Auditor),
        ("auditor-2".to_owned(), Role::Auditor),
        ("leader-1".to_owned(), Role::TeamLeader),
        ("hof-1".to_owned(), Role::HofAuditor),
        ("head-1".to_owned(), Role::QualityHead),
    ]);
    let role_service = RoleService::new(Arc::new(FakeRoleRepository { roles }), "qg-setup");

    let dimensional_id = dimensional.id();
    let visual_id = visual.id();
    let catalog = Arc::new(FakeCatalog {
        products: HashMap::from([(product_id, product)]),
        specifications: vec![dimensional, visual],
    });
    let repository = Arc::new(FakeInspectionRepository::default());

    let service = InspectionService::new(
        role_service,
        catalog.clone(),
        catalog,
        repository.clone(),
        repository.clone(),
    );

    Harness {
        service,
        repository,
        product_id,
        dimensional_id,
        visual_id,
    }
}

fn result_inputs(harness: &Harness, actual: &str, visual_pass: bool) -> Vec<ResultInput> {
    vec![
        ResultInput {
            specification_id: harness.dimensional_id,
            actual_value: Some(actual.to_owned()),
            passed: None,
            remarks: None,
        },
        ResultInput {
            specification_id: harness.visual_id,
            actual_value: None,
            passed: Some(visual_pass),
            remarks: None,
        },
    ]
}

async fn submit(harness: &Harness) -> Inspection {
    let inspection = harness
        .service
        .create_inspection(
            &identity("auditor-1"),
            CreateInspectionInput {
                product_id: harness.product_id,
                batch_number: Some("B-77".to_owned()),
                remarks: None,
                results: result_inputs(harness, "10.5", true),
            },
        )
        .await;

    match inspection {
        Ok(inspection) => inspection,
        Err(error) => panic!("submission failed: {error}"),
    }
}

#[tokio::test]
async fn submission_snapshots_one_result_per_specification() {
    let harness = harness();
    let inspection = submit(&harness).await;

    assert_eq!(inspection.status(), InspectionStatus::PendingTeamLeader);

    let detail = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };

    assert_eq!(detail.results.len(), 2);
    assert!(detail.history.is_empty());

    let dimensional = detail
        .results
        .iter()
        .find(|result| result.specification_id() == harness.dimensional_id);
    assert!(dimensional.is_some_and(|result| result.is_pass() && result.actual_value() == "10.5"));
}

#[tokio::test]
async fn failing_measurement_still_enters_review() {
    let harness = harness();
    let inspection = harness
        .service
        .create_inspection(
            &identity("auditor-1"),
            CreateInspectionInput {
                product_id: harness.product_id,
                batch_number: None,
                remarks: None,
                results: result_inputs(&harness, "12.3", false),
            },
        )
        .await;

    // Measured failures never auto-reject; every stage reviews regardless.
    assert!(
        inspection.is_ok_and(|value| value.status() == InspectionStatus::PendingTeamLeader)
    );
}

#[tokio::test]
async fn submission_is_auditor_only() {
    let harness = harness();
    let result = harness
        .service
        .create_inspection(
            &identity("leader-1"),
            CreateInspectionInput {
                product_id: harness.product_id,
                batch_number: None,
                remarks: None,
                results: result_inputs(&harness, "10.5", true),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn submission_requires_every_specification_answered() {
    let harness = harness();
    let result = harness
        .service
        .create_inspection(
            &identity("auditor-1"),
            CreateInspectionInput {
                product_id: harness.product_id,
                batch_number: None,
                remarks: None,
                results: result_inputs(&harness, "10.5", true)
                    .into_iter()
                    .take(1)
                    .collect(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn deactivated_product_rejects_new_inspections() {
    let product = match Product::new(ProductInput {
        id: ProductId::new(),
        name: "Drive Shaft".to_owned(),
        part_number: "DS-4402".to_owned(),
        description: None,
        is_active: false,
        created_by: "head-1".to_owned(),
        created_at: Utc::now(),
    }) {
        Ok(product) => product,
        Err(error) => panic!("product fixture failed: {error}"),
    };
    let harness = harness_with_product(product);

    let result = harness
        .service
        .create_inspection(
            &identity("auditor-1"),
            CreateInspectionInput {
                product_id: harness.product_id,
                batch_number: None,
                remarks: None,
                results: result_inputs(&harness, "10.5", true),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn first_approval_advances_and_appends_history() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let decided = harness
        .service
        .decide(
            inspection.id(),
            &identity("leader-1"),
            ApprovalAction::Approve,
            "ok",
        )
        .await;

    assert!(decided.is_ok_and(|value| value.status() == InspectionStatus::PendingHofAuditor));

    let detail = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };

    assert_eq!(detail.history.len(), 1);
    let entry = &detail.history[0];
    assert_eq!(entry.actor_role(), Role::TeamLeader);
    assert_eq!(entry.action(), ApprovalAction::Approve);
    assert_eq!(entry.previous_status(), InspectionStatus::PendingTeamLeader);
    assert_eq!(entry.new_status(), InspectionStatus::PendingHofAuditor);
}

#[tokio::test]
async fn decision_requires_a_comment() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let decided = harness
        .service
        .decide(
            inspection.id(),
            &identity("leader-1"),
            ApprovalAction::Approve,
            "   ",
        )
        .await;

    assert!(matches!(decided, Err(AppError::Validation(_))));

    // Status and ledger are untouched by the failed decision.
    let detail = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };
    assert_eq!(detail.inspection.status(), InspectionStatus::PendingTeamLeader);
    assert!(detail.history.is_empty());
}

#[tokio::test]
async fn wrong_role_for_stage_is_forbidden_and_leaves_no_trace() {
    let harness = harness();
    let inspection = submit(&harness).await;

    // The quality head reviews the last stage; deciding at the first stage
    // would skip two stages.
    let decided = harness
        .service
        .decide(
            inspection.id(),
            &identity("head-1"),
            ApprovalAction::Approve,
            "looks fine to me",
        )
        .await;

    assert!(matches!(decided, Err(AppError::Forbidden(_))));

    let detail = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };
    assert_eq!(detail.inspection.status(), InspectionStatus::PendingTeamLeader);
    assert!(detail.history.is_empty());
}

#[tokio::test]
async fn repeating_a_decision_conflicts() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let first = harness
        .service
        .decide(
            inspection.id(),
            &identity("leader-1"),
            ApprovalAction::Approve,
            "ok",
        )
        .await;
    assert!(first.is_ok());

    let second = harness
        .service
        .decide(
            inspection.id(),
            &identity("leader-1"),
            ApprovalAction::Approve,
            "ok",
        )
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let entries = match harness.repository.entries_for(inspection.id()).await {
        Ok(entries) => entries,
        Err(error) => panic!("ledger read failed: {error}"),
    };
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn full_chain_reaches_approved_and_freezes_the_record() {
    let harness = harness();
    let inspection = submit(&harness).await;

    for (subject, comment) in [
        ("leader-1", "dimensions verified"),
        ("hof-1", "batch history clean"),
        ("head-1", "released"),
    ] {
        let decided = harness
            .service
            .decide(
                inspection.id(),
                &identity(subject),
                ApprovalAction::Approve,
                comment,
            )
            .await;
        assert!(decided.is_ok());
    }

    let detail = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };
    assert_eq!(detail.inspection.status(), InspectionStatus::Approved);

    // The ledger replays the chain oldest-first, one contiguous hop per
    // entry.
    let hops: Vec<(InspectionStatus, InspectionStatus)> = detail
        .history
        .iter()
        .map(|entry| (entry.previous_status(), entry.new_status()))
        .collect();
    assert_eq!(
        hops,
        vec![
            (
                InspectionStatus::PendingTeamLeader,
                InspectionStatus::PendingHofAuditor
            ),
            (
                InspectionStatus::PendingHofAuditor,
                InspectionStatus::PendingQualityHead
            ),
            (
                InspectionStatus::PendingQualityHead,
                InspectionStatus::Approved
            ),
        ]
    );

    // No further decision, detail update, or evidence append may succeed.
    let late_decision = harness
        .service
        .decide(
            inspection.id(),
            &identity("head-1"),
            ApprovalAction::Reject,
            "changed my mind",
        )
        .await;
    assert!(matches!(late_decision, Err(AppError::InvalidTransition(_))));

    let late_update = harness
        .service
        .update_details(
            &identity("auditor-1"),
            inspection.id(),
            UpdateDetailsInput {
                batch_number: Some("B-78".to_owned()),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(late_update, Err(AppError::Forbidden(_))));

    let late_evidence = harness
        .service
        .add_evidence(
            &identity("auditor-1"),
            inspection.id(),
            "s3://evidence/late.jpg".to_owned(),
            None,
        )
        .await;
    assert!(matches!(late_evidence, Err(AppError::Forbidden(_))));

    assert_eq!(detail.history.len(), 3);
}

#[tokio::test]
async fn rejected_inspection_is_frozen_but_resubmission_is_a_new_record() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let advanced = harness
        .service
        .decide(
            inspection.id(),
            &identity("leader-1"),
            ApprovalAction::Approve,
            "ok",
        )
        .await;
    assert!(advanced.is_ok());

    let rejected = harness
        .service
        .decide(
            inspection.id(),
            &identity("hof-1"),
            ApprovalAction::Reject,
            "bad batch",
        )
        .await;
    assert!(rejected.is_ok_and(|value| value.status() == InspectionStatus::Rejected));

    let before = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };

    // The creator may not edit the rejected record.
    let edit = harness
        .service
        .update_details(
            &identity("auditor-1"),
            inspection.id(),
            UpdateDetailsInput {
                batch_number: Some("B-78".to_owned()),
                remarks: Some("corrected".to_owned()),
            },
        )
        .await;
    assert!(matches!(edit, Err(AppError::Forbidden(_))));

    // Results remain exactly as submitted.
    let after = match harness.service.get_inspection(inspection.id()).await {
        Ok(detail) => detail,
        Err(error) => panic!("get failed: {error}"),
    };
    assert_eq!(before.results, after.results);
    assert_eq!(before.inspection, after.inspection);

    // Correction happens through an entirely new inspection.
    let replacement = submit(&harness).await;
    assert_ne!(replacement.id(), inspection.id());
    assert_ne!(replacement.number(), inspection.number());
    assert_eq!(replacement.status(), InspectionStatus::PendingTeamLeader);
}

#[tokio::test]
async fn concurrent_decisions_commit_exactly_once() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let leader = identity("leader-1");
    let first = harness
        .service
        .decide(inspection.id(), &leader, ApprovalAction::Approve, "ok");
    let second = harness.service.decide(
        inspection.id(),
        &leader,
        ApprovalAction::Reject,
        "duplicate review",
    );

    let (first, second) = tokio::join!(first, second);
    assert_ne!(first.is_ok(), second.is_ok());

    let entries = match harness.repository.entries_for(inspection.id()).await {
        Ok(entries) => entries,
        Err(error) => panic!("ledger read failed: {error}"),
    };
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn details_update_is_creator_only_while_pending() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let foreign = harness
        .service
        .update_details(
            &identity("auditor-2"),
            inspection.id(),
            UpdateDetailsInput {
                batch_number: Some("B-78".to_owned()),
                remarks: None,
            },
        )
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let own = harness
        .service
        .update_details(
            &identity("auditor-1"),
            inspection.id(),
            UpdateDetailsInput {
                batch_number: Some("B-78".to_owned()),
                remarks: Some("night shift".to_owned()),
            },
        )
        .await;
    assert!(own.is_ok_and(|value| value.batch_number() == Some("B-78")));
}

#[tokio::test]
async fn listing_filters_by_status_and_creator() {
    let harness = harness();
    let inspection = submit(&harness).await;

    let pending = harness
        .service
        .list_inspections(InspectionFilter {
            status: Some(InspectionStatus::PendingTeamLeader),
            product_id: Some(harness.product_id),
            created_by: Some("auditor-1".to_owned()),
        })
        .await;
    assert!(pending.is_ok_and(|values| values.len() == 1 && values[0].id() == inspection.id()));

    let rejected = harness
        .service
        .list_inspections(InspectionFilter {
            status: Some(InspectionStatus::Rejected),
            ..InspectionFilter::default()
        })
        .await;
    assert!(rejected.is_ok_and(|values| values.is_empty()));
}
