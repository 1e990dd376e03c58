use std::str::FromStr;

use chrono::{DateTime, Utc};
use qualigate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inspection::{InspectionId, InspectionStatus};
use crate::role::Role;

/// Decision an approver may take at a pending stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Advances the inspection one stage, or finalizes it.
    Approve,
    /// Locks the inspection as rejected.
    Reject,
}

impl ApprovalAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

impl FromStr for ApprovalAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approved" => Ok(Self::Approve),
            "rejected" => Ok(Self::Reject),
            _ => Err(AppError::Validation(format!(
                "unknown approval action '{value}'"
            ))),
        }
    }
}

/// The complete approval transition table.
///
/// Returns the next status when `(current, actor_role, action)` names one of
/// the six permitted transitions, and `None` for everything else. This one
/// lookup enforces both "right role for this stage" and "no skipping
/// stages".
#[must_use]
pub fn next_status(
    current: InspectionStatus,
    actor_role: Role,
    action: ApprovalAction,
) -> Option<InspectionStatus> {
    match (current, actor_role, action) {
        (InspectionStatus::PendingTeamLeader, Role::TeamLeader, ApprovalAction::Approve) => {
            Some(InspectionStatus::PendingHofAuditor)
        }
        (InspectionStatus::PendingTeamLeader, Role::TeamLeader, ApprovalAction::Reject) => {
            Some(InspectionStatus::Rejected)
        }
        (InspectionStatus::PendingHofAuditor, Role::HofAuditor, ApprovalAction::Approve) => {
            Some(InspectionStatus::PendingQualityHead)
        }
        (InspectionStatus::PendingHofAuditor, Role::HofAuditor, ApprovalAction::Reject) => {
            Some(InspectionStatus::Rejected)
        }
        (InspectionStatus::PendingQualityHead, Role::QualityHead, ApprovalAction::Approve) => {
            Some(InspectionStatus::Approved)
        }
        (InspectionStatus::PendingQualityHead, Role::QualityHead, ApprovalAction::Reject) => {
            Some(InspectionStatus::Rejected)
        }
        _ => None,
    }
}

/// Input payload used to construct a validated history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalHistoryInput {
    /// Stable entry identifier.
    pub id: Uuid,
    /// Inspection the decision was taken on.
    pub inspection_id: InspectionId,
    /// Subject of the deciding actor.
    pub actor_subject: String,
    /// Role the actor held at decision time.
    pub actor_role: Role,
    /// Decision taken.
    pub action: ApprovalAction,
    /// Status before the decision.
    pub previous_status: InspectionStatus,
    /// Status after the decision.
    pub new_status: InspectionStatus,
    /// Mandatory justification.
    pub comment: String,
    /// Decision timestamp.
    pub decided_at: DateTime<Utc>,
}

/// Immutable ledger row recording one approval or rejection decision.
///
/// The actor's role is recorded as held at decision time; later role changes
/// never retroactively alter history. Entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalHistoryEntry {
    id: Uuid,
    inspection_id: InspectionId,
    actor_subject: String,
    actor_role: Role,
    action: ApprovalAction,
    previous_status: InspectionStatus,
    new_status: InspectionStatus,
    comment: NonEmptyString,
    decided_at: DateTime<Utc>,
}

impl ApprovalHistoryEntry {
    /// Creates a validated history entry. Every decision must be justified,
    /// so a blank comment is rejected.
    pub fn new(input: ApprovalHistoryInput) -> AppResult<Self> {
        let ApprovalHistoryInput {
            id,
            inspection_id,
            actor_subject,
            actor_role,
            action,
            previous_status,
            new_status,
            comment,
            decided_at,
        } = input;

        Ok(Self {
            id,
            inspection_id,
            actor_subject,
            actor_role,
            action,
            previous_status,
            new_status,
            comment: NonEmptyString::new(comment)?,
            decided_at,
        })
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the inspection identifier.
    #[must_use]
    pub fn inspection_id(&self) -> InspectionId {
        self.inspection_id
    }

    /// Returns the deciding actor's subject.
    #[must_use]
    pub fn actor_subject(&self) -> &str {
        self.actor_subject.as_str()
    }

    /// Returns the role held at decision time.
    #[must_use]
    pub fn actor_role(&self) -> Role {
        self.actor_role
    }

    /// Returns the decision taken.
    #[must_use]
    pub fn action(&self) -> ApprovalAction {
        self.action
    }

    /// Returns the status before the decision.
    #[must_use]
    pub fn previous_status(&self) -> InspectionStatus {
        self.previous_status
    }

    /// Returns the status after the decision.
    #[must_use]
    pub fn new_status(&self) -> InspectionStatus {
        self.new_status
    }

    /// Returns the mandatory justification.
    #[must_use]
    pub fn comment(&self) -> &NonEmptyString {
        &self.comment
    }

    /// Returns the decision timestamp.
    #[must_use]
    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    use crate::inspection::{InspectionId, InspectionStatus};
    use crate::role::Role;

    use super::{ApprovalAction, ApprovalHistoryEntry, ApprovalHistoryInput, next_status};

    #[test]
    fn approval_chain_advances_stage_by_stage() {
        assert_eq!(
            next_status(
                InspectionStatus::PendingTeamLeader,
                Role::TeamLeader,
                ApprovalAction::Approve
            ),
            Some(InspectionStatus::PendingHofAuditor)
        );
        assert_eq!(
            next_status(
                InspectionStatus::PendingHofAuditor,
                Role::HofAuditor,
                ApprovalAction::Approve
            ),
            Some(InspectionStatus::PendingQualityHead)
        );
        assert_eq!(
            next_status(
                InspectionStatus::PendingQualityHead,
                Role::QualityHead,
                ApprovalAction::Approve
            ),
            Some(InspectionStatus::Approved)
        );
    }

    #[test]
    fn any_pending_stage_may_reject() {
        for (status, role) in [
            (InspectionStatus::PendingTeamLeader, Role::TeamLeader),
            (InspectionStatus::PendingHofAuditor, Role::HofAuditor),
            (InspectionStatus::PendingQualityHead, Role::QualityHead),
        ] {
            assert_eq!(
                next_status(status, role, ApprovalAction::Reject),
                Some(InspectionStatus::Rejected)
            );
        }
    }

    #[test]
    fn wrong_role_for_stage_is_not_in_the_table() {
        assert_eq!(
            next_status(
                InspectionStatus::PendingTeamLeader,
                Role::QualityHead,
                ApprovalAction::Approve
            ),
            None
        );
        assert_eq!(
            next_status(
                InspectionStatus::PendingQualityHead,
                Role::Auditor,
                ApprovalAction::Reject
            ),
            None
        );
    }

    #[test]
    fn terminal_statuses_have_no_transitions() {
        for role in Role::all() {
            for action in [ApprovalAction::Approve, ApprovalAction::Reject] {
                assert_eq!(next_status(InspectionStatus::Approved, *role, action), None);
                assert_eq!(next_status(InspectionStatus::Rejected, *role, action), None);
            }
        }
    }

    #[test]
    fn history_entry_rejects_blank_comment() {
        let entry = ApprovalHistoryEntry::new(ApprovalHistoryInput {
            id: Uuid::new_v4(),
            inspection_id: InspectionId::new(),
            actor_subject: "leader-1".to_owned(),
            actor_role: Role::TeamLeader,
            action: ApprovalAction::Approve,
            previous_status: InspectionStatus::PendingTeamLeader,
            new_status: InspectionStatus::PendingHofAuditor,
            comment: "   ".to_owned(),
            decided_at: Utc::now(),
        });

        assert!(entry.is_err());
    }

    fn any_status() -> impl Strategy<Value = InspectionStatus> {
        prop::sample::select(InspectionStatus::all().to_vec())
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::all().to_vec())
    }

    fn any_action() -> impl Strategy<Value = ApprovalAction> {
        prop::sample::select(vec![ApprovalAction::Approve, ApprovalAction::Reject])
    }

    proptest! {
        // Only the six-row table produces a transition: a defined transition
        // always means the actor holds exactly the reviewer role of the
        // current pending status.
        #[test]
        fn transitions_only_exist_for_the_designated_reviewer(
            status in any_status(),
            role in any_role(),
            action in any_action(),
        ) {
            let next = next_status(status, role, action);
            prop_assert_eq!(next.is_some(), status.reviewer_role() == Some(role));
        }

        // Approvals from a pending stage never jump straight past the next
        // stage, and rejections always land on rejected.
        #[test]
        fn rejections_always_land_on_rejected(
            status in any_status(),
            role in any_role(),
        ) {
            if let Some(next) = next_status(status, role, ApprovalAction::Reject) {
                prop_assert_eq!(next, InspectionStatus::Rejected);
            }
        }
    }
}
