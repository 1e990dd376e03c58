use std::str::FromStr;

use qualigate_core::AppError;
use serde::{Deserialize, Serialize};

/// Approval chain roles. An identity holds at most one role at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates inspections and records measured results.
    Auditor,
    /// First-stage reviewer.
    TeamLeader,
    /// Second-stage reviewer.
    HofAuditor,
    /// Final approver; also administers roles and the product catalog.
    QualityHead,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auditor => "auditor",
            Self::TeamLeader => "team_leader",
            Self::HofAuditor => "hof_auditor",
            Self::QualityHead => "quality_head",
        }
    }

    /// Returns this role's position in the approval chain, if it reviews a
    /// stage. The auditor submits but never reviews.
    #[must_use]
    pub fn approval_stage(&self) -> Option<u8> {
        match self {
            Self::Auditor => None,
            Self::TeamLeader => Some(0),
            Self::HofAuditor => Some(1),
            Self::QualityHead => Some(2),
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Auditor,
            Role::TeamLeader,
            Role::HofAuditor,
            Role::QualityHead,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auditor" => Ok(Self::Auditor),
            "team_leader" => Ok(Self::TeamLeader),
            "hof_auditor" => Ok(Self::HofAuditor),
            "quality_head" => Ok(Self::QualityHead),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}
