//! REST client for the console backend.
//!
//! Every endpoint returns a `{success, data}` envelope; `success == false`
//! is surfaced as [`ApiError::Backend`] even when the HTTP status is 200.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use merchdesk_access::{Permission, PermissionCatalog, Role};
use merchdesk_core::{RoleId, UserId};

/// Errors crossing the client/backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("backend rejected request")]
    Backend,
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
}

/// HTTP client for the console backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: Some(token.into()),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let envelope: Envelope<T> =
            resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))?;

        if !envelope.success {
            return Err(ApiError::Backend);
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Parse("missing data in response envelope".to_string()))
    }

    /// `GET /roles/merchant/{user_id}` — the user's role with its permission
    /// list already flattened by the backend.
    pub async fn merchant_role(&self, user_id: UserId) -> Result<Role, ApiError> {
        self.send_envelope(self.request(Method::GET, &format!("/roles/merchant/{user_id}")))
            .await
    }

    /// `GET /permissions/grouped` — the full catalog, grouped by module and
    /// display group.
    pub async fn grouped_permissions(&self) -> Result<PermissionCatalog, ApiError> {
        let grouped: BTreeMap<String, BTreeMap<String, Vec<Permission>>> = self
            .send_envelope(self.request(Method::GET, "/permissions/grouped"))
            .await?;
        Ok(PermissionCatalog::from_grouped(grouped))
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        self.send_envelope(self.request(Method::GET, "/roles")).await
    }

    pub async fn create_role(&self, role: &Role) -> Result<Role, ApiError> {
        self.send_envelope(self.request(Method::POST, "/roles").json(role))
            .await
    }

    pub async fn update_role(&self, role: &Role) -> Result<Role, ApiError> {
        self.send_envelope(self.request(Method::PUT, &format!("/roles/{}", role.id)).json(role))
            .await
    }

    /// `DELETE /roles/{id}`.
    ///
    /// Fire-and-forget from the console's point of view: callers reload the
    /// role list afterwards and the last-role restriction is enforced
    /// server-side, so only transport failures are reported.
    pub async fn delete_role(&self, id: RoleId) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &format!("/roles/{id}"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }
        Ok(())
    }
}
