use async_trait::async_trait;

use qualigate_core::AppResult;
use qualigate_domain::{
    ApprovalHistoryEntry, EvidenceRef, Inspection, InspectionId, InspectionResult,
    InspectionStatus, ProductId, ResultInput,
};

/// Input payload for inspection submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInspectionInput {
    /// Product to inspect.
    pub product_id: ProductId,
    /// Optional batch identifier.
    pub batch_number: Option<String>,
    /// Optional free-text remarks.
    pub remarks: Option<String>,
    /// One entered result per active specification of the product.
    pub results: Vec<ResultInput>,
}

/// Input payload for updating the mutable detail fields of an inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDetailsInput {
    /// Replacement batch identifier.
    pub batch_number: Option<String>,
    /// Replacement free-text remarks.
    pub remarks: Option<String>,
}

/// Advisory listing filter. Reads are broad by design; authorization is
/// enforced at the mutators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionFilter {
    /// Restrict to one lifecycle status.
    pub status: Option<InspectionStatus>,
    /// Restrict to one product.
    pub product_id: Option<ProductId>,
    /// Restrict to inspections created by one subject.
    pub created_by: Option<String>,
}

/// Read-only projection of an inspection with its results, evidence, and
/// decision history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionDetail {
    /// The inspection record.
    pub inspection: Inspection,
    /// One result per specification, as snapshotted at submission.
    pub results: Vec<InspectionResult>,
    /// Appended evidence references.
    pub evidence: Vec<EvidenceRef>,
    /// Decision ledger entries, oldest first.
    pub history: Vec<ApprovalHistoryEntry>,
}

/// Repository port for inspection records.
///
/// Every write re-checks mutability immediately before applying, so a
/// concurrent approval that finalizes the record between the caller's read
/// and write is observed instead of overwritten.
#[async_trait]
pub trait InspectionRepository: Send + Sync {
    /// Returns the next human-readable inspection number. Numbers look
    /// monotonic but are not required to be gap-free.
    async fn next_inspection_number(&self) -> AppResult<String>;

    /// Persists a new inspection together with its result snapshot as one
    /// atomic operation.
    async fn create(
        &self,
        inspection: Inspection,
        results: Vec<InspectionResult>,
    ) -> AppResult<()>;

    /// Returns an inspection by identifier.
    async fn find(&self, id: InspectionId) -> AppResult<Option<Inspection>>;

    /// Lists inspections matching the filter, newest first.
    async fn list(&self, filter: InspectionFilter) -> AppResult<Vec<Inspection>>;

    /// Returns the result snapshot of an inspection.
    async fn results_for(&self, id: InspectionId) -> AppResult<Vec<InspectionResult>>;

    /// Returns the evidence references of an inspection, oldest first.
    async fn evidence_for(&self, id: InspectionId) -> AppResult<Vec<EvidenceRef>>;

    /// Appends one evidence reference. Fails with `Forbidden` when the
    /// inspection is no longer mutable.
    async fn append_evidence(&self, evidence: EvidenceRef) -> AppResult<()>;

    /// Replaces batch number and remarks, re-checking mutability at write
    /// time. Fails with `Forbidden` when the inspection is frozen and with
    /// `Conflict` when the expected version is stale.
    async fn update_details(
        &self,
        id: InspectionId,
        expected_version: i64,
        batch_number: Option<String>,
        remarks: Option<String>,
    ) -> AppResult<Inspection>;

    /// Applies one approval decision: compare-and-swap on status plus ledger
    /// append, both in one atomic unit.
    ///
    /// Fails with `Conflict` when the stored status no longer equals
    /// `expected_status`; in that case neither the status nor the ledger
    /// changes.
    async fn apply_decision(
        &self,
        id: InspectionId,
        expected_status: InspectionStatus,
        new_status: InspectionStatus,
        entry: ApprovalHistoryEntry,
    ) -> AppResult<Inspection>;
}

/// Read port over the append-only decision ledger.
///
/// The contract exposes no update or delete at all; appends happen only
/// inside [`InspectionRepository::apply_decision`].
#[async_trait]
pub trait ApprovalLedger: Send + Sync {
    /// Returns all decision entries for an inspection, oldest first.
    async fn entries_for(&self, inspection_id: InspectionId) -> AppResult<Vec<ApprovalHistoryEntry>>;
}
