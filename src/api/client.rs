//! HTTP client for the CitySync backend's profile procedures.
//!
//! The backend is a thin pass-through in front of the profile document
//! store: get-profile, update-profile (upsert), and an echo endpoint used
//! as a connectivity probe. Authentication is an opaque user id carried in
//! the `x-user-id` header on every call; verifying it is the server's
//! concern, not this client's.

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::models::{ProfileUpdate, RemoteProfile};

use super::ApiError;

/// Header carrying the opaque user id on every request.
const USER_ID_HEADER: &str = "x-user-id";

/// HTTP request timeout in seconds. Caps how long a profile call can hang;
/// there are no retries behind it.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct HelloResponse {
    pub hello: String,
    pub date: String,
}

/// Client for the remote profile store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ProfileClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl ProfileClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        })
    }

    /// Re-bind the client to another user, sharing the connection pool.
    pub fn with_user(&self, user_id: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            user_id: user_id.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Fetch the caller's profile document. `None` when no document exists
    /// for this user yet.
    pub async fn get_profile(&self) -> Result<Option<RemoteProfile>> {
        let url = self.url("/api/user/profile");
        let response = self
            .client
            .get(&url)
            .header(USER_ID_HEADER, &self.user_id)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to send profile request")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_response(response).await?;

        // The server returns a JSON null when the document is absent
        let profile: Option<RemoteProfile> = response
            .json()
            .await
            .context("Failed to parse profile response")?;
        debug!(found = profile.is_some(), "Profile fetched");
        Ok(profile)
    }

    /// Upsert the set fields of the caller's profile document.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        let url = self.url("/api/user/profile");
        let response = self
            .client
            .post(&url)
            .header(USER_ID_HEADER, &self.user_id)
            .json(update)
            .send()
            .await
            .context("Failed to send profile update")?;

        Self::check_response(response).await?;
        debug!("Profile update accepted");
        Ok(())
    }

    /// Echo probe: confirms the backend is reachable and returns its clock.
    pub async fn hi(&self, name: &str) -> Result<HelloResponse> {
        let url = self.url("/api/hi");
        let response = self
            .client
            .post(&url)
            .header(USER_ID_HEADER, &self.user_id)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .context("Failed to send hi request")?;

        let response = Self::check_response(response).await?;
        response.json().await.context("Failed to parse hi response")
    }
}
