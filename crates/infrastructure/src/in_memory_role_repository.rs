use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use qualigate_application::RoleRepository;
use qualigate_core::{AppError, AppResult};
use qualigate_domain::Role;

/// In-memory role registry implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<String, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory role registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, subject: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(subject).copied())
    }

    async fn save_role(&self, subject: &str, role: Option<Role>) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        match role {
            Some(role) => {
                roles.insert(subject.to_owned(), role);
            }
            None => {
                roles.remove(subject);
            }
        }

        Ok(())
    }

    async fn quality_head_exists(&self) -> AppResult<bool> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .any(|role| *role == Role::QualityHead))
    }

    async fn bootstrap_quality_head(&self, subject: &str) -> AppResult<()> {
        // Check and insert under one write guard; the second of two
        // concurrent bootstrap attempts observes the first one's write.
        let mut roles = self.roles.write().await;
        if roles.values().any(|role| *role == Role::QualityHead) {
            return Err(AppError::AlreadyInitialized(
                "a quality head already exists".to_owned(),
            ));
        }

        roles.insert(subject.to_owned(), Role::QualityHead);
        Ok(())
    }
}
