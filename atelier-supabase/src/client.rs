use anyhow::Context;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{Level, event, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for one hosted project.
///
/// Every request carries the project `apikey`. The bearer token is the
/// signed-in user's access token when there is one, the project key
/// otherwise. Clones share the token.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Client {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path under the project (`path` starts with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Request with the bearer token attached
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self.access_token().unwrap_or_else(|| self.api_key.clone());
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
    }

    /// Send without looking at the status
    #[instrument(level = "trace", skip(self, request))]
    pub async fn execute(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        Ok(request.send().await?)
    }

    /// Send and turn a non-success status into an error carrying the platform message
    #[instrument(level = "trace", skip(self, request))]
    pub async fn send(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        let response = self.execute(request).await?;
        check_status(response).await
    }

    /// Send and decode the JSON response body
    #[instrument(level = "trace", skip(self, request))]
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        event!(Level::TRACE, response = text);
        serde_json::from_str::<T>(&text).context("unexpected response body")
    }
}

/// Pass successful responses through, turn the rest into errors
pub async fn check_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    event!(Level::TRACE, %status, body = body);
    Err(anyhow::anyhow!(platform_message(status, &body)))
}

/// Human-readable message out of an error response.
///
/// The storage, rest and auth services each use their own error shape, so
/// the first of `message`, `msg`, `error_description` and `error` wins.
pub fn platform_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|field| json.get(field).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("Request failed with status {}", status),
        None => format!("Request failed with status {}: {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_message_fields() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            platform_message(status, r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#),
            "new row violates row-level security policy"
        );
        assert_eq!(
            platform_message(status, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(platform_message(status, r#"{"code":401,"msg":"Invalid JWT"}"#), "Invalid JWT");
    }

    #[test]
    fn test_platform_message_fallbacks() {
        assert_eq!(
            platform_message(StatusCode::BAD_GATEWAY, ""),
            "Request failed with status 502 Bad Gateway"
        );
        assert_eq!(
            platform_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "Request failed with status 502 Bad Gateway: upstream down"
        );
    }

    #[test]
    fn test_bearer_follows_access_token() {
        let client = Client::new("https://demo.supabase.co/", "anon-key").unwrap();
        assert_eq!(client.url("/rest/v1/products"), "https://demo.supabase.co/rest/v1/products");

        let request = client.request(Method::GET, &client.url("/auth/v1/user")).build().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer anon-key");

        let shared = client.clone();
        shared.set_access_token(Some("user-jwt".to_string()));
        let request = client.request(Method::GET, &client.url("/auth/v1/user")).build().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer user-jwt");
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        assert!(Client::new("https://demo.supabase.co", "bad\nkey").is_err());
    }
}
