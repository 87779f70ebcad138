//! Password sign-in and the current session

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use atelier_core::storage::{AuthUser, SessionProvider, UserId};

use crate::client::{Client, check_status};

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        AuthUser {
            id: UserId::from_string(user.id),
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

/// Session against the hosted auth service. The access token lives in the
/// shared [`Client`], so stores built on the same client act as the user.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
}

impl SupabaseAuth {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let request = self
            .client
            .request(Method::POST, &self.client.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = self.client.send_json(request).await?;

        self.client.set_access_token(Some(token.access_token));
        let user = AuthUser::from(token.user);
        info!(user = %user.id, "signed in");
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        if self.client.access_token().is_none() {
            return Ok(());
        }
        let request = self
            .client
            .request(Method::POST, &self.client.url("/auth/v1/logout"));
        let result = self.client.send(request).await;
        self.client.set_access_token(None);
        result.map(|_| ())
    }
}

#[async_trait]
impl SessionProvider for SupabaseAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        if self.client.access_token().is_none() {
            return Ok(None);
        }
        let request = self
            .client
            .request(Method::GET, &self.client.url("/auth/v1/user"));
        let response = self.client.execute(request).await?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!("session token rejected");
            return Ok(None);
        }
        let user: UserResponse = check_status(response).await?.json().await?;
        Ok(Some(user.into()))
    }
}
