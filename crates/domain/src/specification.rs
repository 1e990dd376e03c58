use std::fmt::{Display, Formatter};

use qualigate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::ProductId;

/// Identifier of a quality specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecificationId(Uuid);

impl SpecificationId {
    /// Creates a random specification identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a specification identifier from an existing UUID value.
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

impl Default for SpecificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SpecificationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Type-specific payload of a quality specification.
///
/// Each variant fixes which descriptive fields are meaningful and how a
/// recorded actual value is judged, so a specification can never carry
/// fields that do not belong to its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecificationRequirement {
    /// Numeric measurement judged against an inclusive tolerance range.
    Dimensional {
        /// Nominal value the measurement is expected to center on.
        standard_value: f64,
        /// Lower inclusive tolerance bound.
        tolerance_min: f64,
        /// Upper inclusive tolerance bound.
        tolerance_max: f64,
        /// Measurement unit, e.g. "mm".
        unit: String,
    },
    /// Visual condition judged pass/fail by the auditor.
    Visual {
        /// Condition the item is inspected against.
        condition: String,
        /// Whether photo evidence must accompany the result.
        photo_required: bool,
    },
    /// Functional test judged pass/fail by the auditor.
    Functional {
        /// Description of the test to perform.
        test_description: String,
        /// Whether the result must carry a remark.
        remarks_required: bool,
    },
    /// Compliance checklist item judged yes/no.
    Compliance {
        /// Checklist text or check method.
        check_method: String,
        /// Whether supporting evidence must accompany the result.
        evidence_required: bool,
    },
}

impl SpecificationRequirement {
    /// Returns a stable storage value for the requirement type.
    #[must_use]
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::Dimensional { .. } => "dimensional",
            Self::Visual { .. } => "visual",
            Self::Functional { .. } => "functional",
            Self::Compliance { .. } => "compliance",
        }
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Self::Dimensional {
                tolerance_min,
                tolerance_max,
                unit,
                ..
            } => {
                if tolerance_min > tolerance_max {
                    return Err(AppError::Validation(
                        "tolerance_min must not exceed tolerance_max".to_owned(),
                    ));
                }

                if unit.trim().is_empty() {
                    return Err(AppError::Validation(
                        "dimensional specification requires a unit".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Visual { condition, .. } => {
                if condition.trim().is_empty() {
                    return Err(AppError::Validation(
                        "visual specification requires a condition description".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Functional {
                test_description, ..
            } => {
                if test_description.trim().is_empty() {
                    return Err(AppError::Validation(
                        "functional specification requires a test description".to_owned(),
                    ));
                }

                Ok(())
            }
            Self::Compliance { check_method, .. } => {
                if check_method.trim().is_empty() {
                    return Err(AppError::Validation(
                        "compliance specification requires a check method".to_owned(),
                    ));
                }

                Ok(())
            }
        }
    }
}

/// Caller-entered result for one specification at inspection submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultInput {
    /// Specification the value was recorded against.
    pub specification_id: SpecificationId,
    /// Measured value for dimensional specifications.
    pub actual_value: Option<String>,
    /// Auditor judgement for visual/functional/compliance specifications.
    pub passed: Option<bool>,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Outcome of judging one result input against its specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    /// Stored actual value text.
    pub actual_value: String,
    /// Computed pass flag.
    pub is_pass: bool,
}

/// Input payload used to construct a validated specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificationInput {
    /// Stable specification identifier.
    pub id: SpecificationId,
    /// Owning product.
    pub product_id: ProductId,
    /// Specification display name.
    pub name: String,
    /// Type-specific requirement payload.
    pub requirement: SpecificationRequirement,
}

/// A reusable quality rule attached to one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    id: SpecificationId,
    product_id: ProductId,
    name: NonEmptyString,
    requirement: SpecificationRequirement,
}

impl Specification {
    /// Creates a validated specification.
    pub fn new(input: SpecificationInput) -> AppResult<Self> {
        let SpecificationInput {
            id,
            product_id,
            name,
            requirement,
        } = input;

        requirement.validate()?;

        Ok(Self {
            id,
            product_id,
            name: NonEmptyString::new(name)?,
            requirement,
        })
    }

    /// Returns the specification identifier.
    #[must_use]
    pub fn id(&self) -> SpecificationId {
        self.id
    }

    /// Returns the owning product identifier.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the specification display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the type-specific requirement payload.
    #[must_use]
    pub fn requirement(&self) -> &SpecificationRequirement {
        &self.requirement
    }

    /// Judges a caller-entered result against this specification.
    ///
    /// Dimensional requirements parse the actual value as a number and test
    /// the inclusive tolerance range; the other variants take the auditor's
    /// judgement directly. A functional requirement with `remarks_required`
    /// rejects inputs without a non-blank remark.
    pub fn evaluate(&self, input: &ResultInput) -> AppResult<RecordedOutcome> {
        match &self.requirement {
            SpecificationRequirement::Dimensional {
                tolerance_min,
                tolerance_max,
                ..
            } => {
                let raw = input
                    .actual_value
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "specification '{}' requires a measured value",
                            self.name.as_str()
                        ))
                    })?;

                let measured: f64 = raw.parse().map_err(|_| {
                    AppError::Validation(format!(
                        "specification '{}' requires a numeric value, got '{raw}'",
                        self.name.as_str()
                    ))
                })?;

                Ok(RecordedOutcome {
                    actual_value: raw.to_owned(),
                    is_pass: (*tolerance_min..=*tolerance_max).contains(&measured),
                })
            }
            SpecificationRequirement::Visual { .. } => {
                let passed = self.required_judgement(input)?;
                Ok(RecordedOutcome {
                    actual_value: if passed { "pass" } else { "fail" }.to_owned(),
                    is_pass: passed,
                })
            }
            SpecificationRequirement::Functional {
                remarks_required, ..
            } => {
                let passed = self.required_judgement(input)?;

                if *remarks_required
                    && input
                        .remarks
                        .as_deref()
                        .is_none_or(|value| value.trim().is_empty())
                {
                    return Err(AppError::Validation(format!(
                        "specification '{}' requires remarks",
                        self.name.as_str()
                    )));
                }

                Ok(RecordedOutcome {
                    actual_value: if passed { "pass" } else { "fail" }.to_owned(),
                    is_pass: passed,
                })
            }
            SpecificationRequirement::Compliance { .. } => {
                let passed = self.required_judgement(input)?;
                Ok(RecordedOutcome {
                    actual_value: if passed { "yes" } else { "no" }.to_owned(),
                    is_pass: passed,
                })
            }
        }
    }

    fn required_judgement(&self, input: &ResultInput) -> AppResult<bool> {
        input.passed.ok_or_else(|| {
            AppError::Validation(format!(
                "specification '{}' requires a pass/fail judgement",
                self.name.as_str()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use crate::product::ProductId;

    use super::{
        ResultInput, Specification, SpecificationId, SpecificationInput, SpecificationRequirement,
    };

    fn dimensional(tolerance_min: f64, tolerance_max: f64) -> Specification {
        Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id: ProductId::new(),
            name: "Shaft diameter".to_owned(),
            requirement: SpecificationRequirement::Dimensional {
                standard_value: 10.5,
                tolerance_min,
                tolerance_max,
                unit: "mm".to_owned(),
            },
        })
        .unwrap()
    }

    fn input(actual: Option<&str>, passed: Option<bool>, remarks: Option<&str>) -> ResultInput {
        ResultInput {
            specification_id: SpecificationId::new(),
            actual_value: actual.map(str::to_owned),
            passed,
            remarks: remarks.map(str::to_owned),
        }
    }

    #[test]
    fn inverted_tolerance_range_is_rejected() {
        let specification = Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id: ProductId::new(),
            name: "Shaft diameter".to_owned(),
            requirement: SpecificationRequirement::Dimensional {
                standard_value: 10.5,
                tolerance_min: 11.0,
                tolerance_max: 10.0,
                unit: "mm".to_owned(),
            },
        });

        assert!(specification.is_err());
    }

    #[test]
    fn dimensional_value_inside_tolerance_passes() {
        let outcome = dimensional(10.0, 11.0).evaluate(&input(Some("10.5"), None, None));
        assert!(outcome.is_ok_and(|value| value.is_pass && value.actual_value == "10.5"));
    }

    #[test]
    fn dimensional_tolerance_bounds_are_inclusive() {
        let specification = dimensional(10.0, 11.0);

        for boundary in ["10.0", "11.0"] {
            let outcome = specification.evaluate(&input(Some(boundary), None, None));
            assert!(outcome.is_ok_and(|value| value.is_pass));
        }

        let outside = specification.evaluate(&input(Some("11.01"), None, None));
        assert!(outside.is_ok_and(|value| !value.is_pass));
    }

    #[test]
    fn dimensional_non_numeric_value_is_rejected() {
        let outcome = dimensional(10.0, 11.0).evaluate(&input(Some("ten point five"), None, None));
        assert!(outcome.is_err());
    }

    #[test]
    fn dimensional_missing_value_is_rejected() {
        let outcome = dimensional(10.0, 11.0).evaluate(&input(None, Some(true), None));
        assert!(outcome.is_err());
    }

    #[test]
    fn functional_requires_remarks_when_flagged() {
        let specification = Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id: ProductId::new(),
            name: "Rotation test".to_owned(),
            requirement: SpecificationRequirement::Functional {
                test_description: "Rotate under load".to_owned(),
                remarks_required: true,
            },
        })
        .unwrap();

        let missing = specification.evaluate(&input(None, Some(true), Some("  ")));
        assert!(missing.is_err());

        let outcome = specification.evaluate(&input(None, Some(false), Some("seized at 40rpm")));
        assert!(outcome.is_ok_and(|value| !value.is_pass && value.actual_value == "fail"));
    }

    #[test]
    fn compliance_judgement_is_stored_as_yes_no() {
        let specification = Specification::new(SpecificationInput {
            id: SpecificationId::new(),
            product_id: ProductId::new(),
            name: "Material certificate".to_owned(),
            requirement: SpecificationRequirement::Compliance {
                check_method: "Certificate on file".to_owned(),
                evidence_required: false,
            },
        })
        .unwrap();

        let outcome = specification.evaluate(&input(None, Some(true), None));
        assert!(outcome.is_ok_and(|value| value.is_pass && value.actual_value == "yes"));
    }
}
