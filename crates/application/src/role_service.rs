use std::sync::Arc;

use qualigate_core::{AppError, AppResult, UserIdentity};
use qualigate_domain::Role;

use crate::role_ports::RoleRepository;

/// Role registry service enforcing the assignment rules of the approval
/// chain.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
    bootstrap_code: String,
}

impl RoleService {
    /// Creates a role service. `bootstrap_code` is the one-time registration
    /// code that gates creation of the first `quality_head`.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, bootstrap_code: impl Into<String>) -> Self {
        Self {
            repository,
            bootstrap_code: bootstrap_code.into(),
        }
    }

    /// Returns the role currently assigned to a subject. An identity with
    /// no role may authenticate but can perform no state-changing operation.
    pub async fn role_of(&self, subject: &str) -> AppResult<Option<Role>> {
        self.repository.find_role(subject).await
    }

    /// Resolves the actor's role, failing when none is assigned.
    pub(crate) async fn require_any_role(&self, actor: &UserIdentity) -> AppResult<Role> {
        self.repository
            .find_role(actor.subject())
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "subject '{}' has no assigned role",
                    actor.subject()
                ))
            })
    }

    /// Fails unless the actor currently holds the given role.
    pub(crate) async fn require_role(&self, actor: &UserIdentity, role: Role) -> AppResult<()> {
        let held = self.require_any_role(actor).await?;
        if held != role {
            return Err(AppError::Forbidden(format!(
                "subject '{}' holds role '{}', operation requires '{}'",
                actor.subject(),
                held.as_str(),
                role.as_str()
            )));
        }

        Ok(())
    }

    /// Overwrites the target subject's role assignment; `None` clears it.
    ///
    /// Only a `quality_head` may assign roles; it may not modify its own
    /// role, may not touch another `quality_head`, and may not mint a new
    /// `quality_head` through this path (that happens only via bootstrap).
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        target_subject: &str,
        role: Option<Role>,
    ) -> AppResult<()> {
        self.require_role(actor, Role::QualityHead).await?;

        if target_subject == actor.subject() {
            return Err(AppError::Validation(
                "a quality head cannot modify its own role".to_owned(),
            ));
        }

        if self.repository.find_role(target_subject).await? == Some(Role::QualityHead) {
            return Err(AppError::Validation(format!(
                "subject '{target_subject}' holds 'quality_head' and cannot be reassigned here"
            )));
        }

        if role == Some(Role::QualityHead) {
            return Err(AppError::Validation(
                "'quality_head' is granted only through bootstrap".to_owned(),
            ));
        }

        self.repository.save_role(target_subject, role).await
    }

    /// Creates the very first `quality_head` in an otherwise-empty registry.
    ///
    /// Gated by the one-time registration code; the existence check and the
    /// write are atomic in the repository, so of two concurrent callers the
    /// second observes `AlreadyInitialized`.
    pub async fn bootstrap_quality_head(
        &self,
        actor: &UserIdentity,
        registration_code: &str,
    ) -> AppResult<()> {
        if registration_code != self.bootstrap_code {
            return Err(AppError::Forbidden(
                "invalid bootstrap registration code".to_owned(),
            ));
        }

        self.repository
            .bootstrap_quality_head(actor.subject())
            .await
    }
}
