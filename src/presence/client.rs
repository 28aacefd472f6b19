use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::time::Duration;

use crate::{error::ApiError, identity::OpaqueId};

use super::models::{
    DataEnvelope, EmployeeRecord, LogEntry, MarkPresenceResponse, PasswordBody, StatusBody,
    TimezoneBody,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const STUDENTS_PATH: &str = "/api/students";
const MARK_PRESENCE_PATH: &str = "/api/mark_presence";
const LOGS_PATH: &str = "/api/logs";
const VALIDATE_PASSWORD_PATH: &str = "/validate_password";

/// The two calls the scan-to-mark path needs.
#[async_trait]
pub trait PresenceApi: Send + Sync {
    async fn mark_presence(
        &self,
        id: &OpaqueId,
        timezone: &str,
    ) -> Result<MarkPresenceResponse, ApiError>;

    async fn fetch_roster(&self) -> Result<Vec<EmployeeRecord>, ApiError>;
}

/// HTTP client for the attendance service.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn fetch_logs(&self, id: &OpaqueId) -> Result<Vec<LogEntry>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("{LOGS_PATH}/{id}")))
            .send()
            .await?;
        let envelope: DataEnvelope<LogEntry> = decode_success(response).await?;
        Ok(envelope.data)
    }

    /// `true` when the service accepts the shared admin password.
    pub async fn validate_password(&self, password: &str) -> Result<bool, ApiError> {
        if password.trim().is_empty() {
            return Ok(false);
        }

        let response = self
            .http
            .post(self.url(VALIDATE_PASSWORD_PATH))
            .json(&PasswordBody { password })
            .send()
            .await?;

        if !response.status().is_success() {
            log_warn!("login rejected with HTTP {}", response.status());
            return Ok(false);
        }

        let body: StatusBody = decode(response).await?;
        Ok(body.status == "ok")
    }
}

#[async_trait]
impl PresenceApi for ApiClient {
    async fn mark_presence(
        &self,
        id: &OpaqueId,
        timezone: &str,
    ) -> Result<MarkPresenceResponse, ApiError> {
        log_debug!("submitting presence mark for {id}");
        let response = self
            .http
            .post(self.url(&format!("{MARK_PRESENCE_PATH}/{id}")))
            .json(&TimezoneBody { timezone })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Error statuses usually still carry a JSON message worth showing.
        match serde_json::from_str::<MarkPresenceResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(err) => Err(ApiError::Decode(err)),
        }
    }

    async fn fetch_roster(&self) -> Result<Vec<EmployeeRecord>, ApiError> {
        let response = self.http.get(self.url(STUDENTS_PATH)).send().await?;
        let envelope: DataEnvelope<EmployeeRecord> = decode_success(response).await?;
        Ok(envelope.data)
    }
}

async fn decode_success<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::hash_identity;

    #[test]
    fn trailing_slash_is_dropped_from_base() {
        let client = ApiClient::new("http://kiosk.local:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base(), "http://kiosk.local:8000");
        assert_eq!(client.url(STUDENTS_PATH), "http://kiosk.local:8000/api/students");
    }

    #[test]
    fn mark_url_embeds_the_opaque_id() {
        let client = ApiClient::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        let id = hash_identity("123");
        assert_eq!(
            client.url(&format!("{MARK_PRESENCE_PATH}/{id}")),
            "http://localhost:8000/api/mark_presence/a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3"
        );
    }

    #[tokio::test]
    async fn blank_password_never_hits_the_network() {
        let client = ApiClient::new("http://unreachable.invalid", Duration::from_secs(1)).unwrap();
        assert!(!client.validate_password("   ").await.unwrap());
    }
}
