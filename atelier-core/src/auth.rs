//! Admin gate: only signed-in users with the `admin` profile role may edit

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::replace::BoxError;
use crate::storage::traits::{RowStore, SessionProvider};
use crate::storage::types::{AuthUser, Filter, Role};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("you must be signed in to edit the site")]
    NotSignedIn,
    #[error("no profile found for user {0}")]
    NoProfile(String),
    #[error("user {user} has role '{role}', editing requires admin")]
    NotAdmin { user: String, role: String },
    #[error("could not check permissions: {0}")]
    Lookup(#[source] BoxError),
}

/// Checks the session and the profile role before an edit starts
pub struct AdminGate<R: RowStore> {
    session: Arc<dyn SessionProvider>,
    rows: Arc<R>,
    profiles_table: String,
}

impl<R: RowStore> AdminGate<R> {
    pub fn new(session: Arc<dyn SessionProvider>, rows: Arc<R>, profiles_table: impl Into<String>) -> Self {
        Self {
            session,
            rows,
            profiles_table: profiles_table.into(),
        }
    }

    /// The signed-in admin, or why editing is refused
    pub async fn authorize(&self) -> Result<AuthUser, GateError> {
        let user = self
            .session
            .current_user()
            .await
            .map_err(|e| GateError::Lookup(e.into()))?
            .ok_or(GateError::NotSignedIn)?;

        let profile = self
            .rows
            .select_one(&self.profiles_table, &Filter::eq("id", user.id.as_str()))
            .await
            .map_err(|e| GateError::Lookup(e.into()))?
            .ok_or_else(|| GateError::NoProfile(user.id.to_string()))?;

        let role = Role::parse(profile.get("role").and_then(Value::as_str).unwrap_or_default());
        if !role.is_admin() {
            let role = match role {
                Role::Other(r) => r,
                _ => "customer".to_string(),
            };
            return Err(GateError::NotAdmin {
                user: user.id.to_string(),
                role,
            });
        }

        debug!(user = %user.id, "admin access granted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ids::UserId;
    use crate::storage::implementations::memory::{MemoryRowStore, MemorySession};
    use crate::storage::pointers::to_row;
    use serde_json::json;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: UserId::from_string(id),
            email: Some(format!("{}@atelier.test", id)),
        }
    }

    fn gate(session: MemorySession) -> (Arc<MemoryRowStore>, AdminGate<MemoryRowStore>) {
        let rows = Arc::new(MemoryRowStore::new());
        rows.seed("profiles", to_row(json!({"id": "u-admin", "role": "admin"})));
        rows.seed("profiles", to_row(json!({"id": "u-client", "role": "customer"})));
        let gate = AdminGate::new(Arc::new(session), rows.clone(), "profiles");
        (rows, gate)
    }

    #[tokio::test]
    async fn test_admin_is_allowed() {
        let (_, gate) = gate(MemorySession::signed_in(user("u-admin")));
        assert_eq!(gate.authorize().await.unwrap().id.as_str(), "u-admin");
    }

    #[tokio::test]
    async fn test_anonymous_is_refused() {
        let (_, gate) = gate(MemorySession::new());
        assert!(matches!(gate.authorize().await, Err(GateError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_customer_is_refused() {
        let (_, gate) = gate(MemorySession::signed_in(user("u-client")));
        match gate.authorize().await {
            Err(GateError::NotAdmin { role, .. }) => assert_eq!(role, "customer"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_profile_is_refused() {
        let (_, gate) = gate(MemorySession::signed_in(user("u-ghost")));
        assert!(matches!(gate.authorize().await, Err(GateError::NoProfile(_))));
    }
}
