//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod approval;
mod inspection;
mod product;
mod role;
mod specification;

pub use approval::{ApprovalAction, ApprovalHistoryEntry, ApprovalHistoryInput, next_status};
pub use inspection::{
    EvidenceRef, Inspection, InspectionId, InspectionInput, InspectionResult,
    InspectionResultInput, InspectionStatus,
};
pub use product::{Product, ProductId, ProductInput};
pub use role::Role;
pub use specification::{
    RecordedOutcome, ResultInput, Specification, SpecificationId, SpecificationInput,
    SpecificationRequirement,
};
