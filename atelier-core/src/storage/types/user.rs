//! Session user types

use serde::{Deserialize, Serialize};

use crate::storage::ids::UserId;

/// The signed-in user as reported by the session provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Profile role stored in the profiles table
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Customer,
    Other(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            "customer" => Self::Customer,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}
