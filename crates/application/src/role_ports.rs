use async_trait::async_trait;

use qualigate_core::AppResult;
use qualigate_domain::Role;

/// Repository port for the role registry.
///
/// An identity holds at most one role; `save_role` is an exclusive
/// overwrite, never additive.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns the role currently assigned to a subject, if any.
    async fn find_role(&self, subject: &str) -> AppResult<Option<Role>>;

    /// Overwrites the subject's role assignment; `None` clears it.
    async fn save_role(&self, subject: &str, role: Option<Role>) -> AppResult<()>;

    /// Returns whether any subject currently holds `quality_head`.
    async fn quality_head_exists(&self) -> AppResult<bool>;

    /// Creates the very first `quality_head` assignment.
    ///
    /// The existence check and the write happen as one atomic operation;
    /// when a head already exists the call fails with `AlreadyInitialized`
    /// and writes nothing. First writer wins under concurrency.
    async fn bootstrap_quality_head(&self, subject: &str) -> AppResult<()>;
}
