//! License service client.
//!
//! Before a session opens, the license key is exchanged for a token over
//! HTTP. When usage reporting is enabled, login and traffic events are sent
//! to the same service in the background; a failed report never affects the
//! session.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use chrono::Local;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Answer of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LicenseToken {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(default)]
    pub token: Option<String>,
}

/// One usage statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsageEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl UsageEvent {
    fn now() -> String {
        Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string()
    }

    /// A successful login.
    pub fn login(license_key: &str) -> Self {
        Self {
            name: USAGE_EVENT_LOGIN.to_string(),
            bytes: None,
            date: Self::now(),
            key: Some(license_key.to_string()),
        }
    }

    /// Bytes of statement text sent.
    pub fn data_in(bytes: u64) -> Self {
        Self {
            name: USAGE_EVENT_DATA_IN.to_string(),
            bytes: Some(bytes),
            date: Self::now(),
            key: None,
        }
    }

    /// Bytes of reply received.
    pub fn data_out(bytes: u64) -> Self {
        Self {
            name: USAGE_EVENT_DATA_OUT.to_string(),
            bytes: Some(bytes),
            date: Self::now(),
            key: None,
        }
    }
}

fn service_error(e: reqwest::Error) -> Error {
    Error::LicenseService {
        message: e.to_string(),
    }
}

/// HTTP client for the license service.
#[derive(Debug, Clone)]
pub struct LicenseClient {
    base_url: Url,
    client: Client,
}

impl LicenseClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::LicenseService {
            message: format!("invalid license server URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::LicenseService {
                message: format!("license server URL '{}' cannot be a base", base_url),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(service_error)?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Ask the service for a token for `host` and `license_key`.
    pub async fn retrieve_token(&self, host: &str, license_key: &str) -> Result<LicenseToken> {
        let url = self.endpoint(["api", "license-key", "retrieve-token", host, license_key]);
        debug!(%url, "retrieving license token");
        self.client
            .get(url)
            .send()
            .await
            .map_err(service_error)?
            .error_for_status()
            .map_err(service_error)?
            .json::<LicenseToken>()
            .await
            .map_err(service_error)
    }

    /// Retrieve a token and fail unless the key is valid.
    pub async fn validate(&self, host: &str, license_key: &str) -> Result<Option<String>> {
        let token = self.retrieve_token(host, license_key).await?;
        if !token.is_valid {
            return Err(Error::InvalidLicense {
                message: "Invalid license key".to_string(),
            });
        }
        Ok(token.token)
    }

    /// Send one usage event and wait for the answer.
    pub async fn report(&self, event: &UsageEvent) -> Result<()> {
        let url = self.endpoint(["api", "license-key", "update"]);
        self.client
            .patch(url)
            .json(event)
            .send()
            .await
            .map_err(service_error)?
            .error_for_status()
            .map_err(service_error)?;
        Ok(())
    }

    /// Send usage events in the background. Failures are logged and dropped.
    pub fn report_detached(&self, events: Vec<UsageEvent>) {
        let client = self.clone();
        tokio::spawn(async move {
            for event in events {
                if let Err(e) = client.report(&event).await {
                    warn!(event = %event.name, error = %e, "usage report failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_event_json() {
        let event = UsageEvent::login("ABC-123");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["Name"], "username");
        assert_eq!(json["Key"], "ABC-123");
        assert!(json.get("Bytes").is_none());
        assert!(json["Date"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_traffic_event_json() {
        let json = serde_json::to_value(UsageEvent::data_out(42)).unwrap();
        assert_eq!(json["Name"], "data_out");
        assert_eq!(json["Bytes"], 42);
        assert!(json.get("Key").is_none());
        assert_eq!(
            serde_json::to_value(UsageEvent::data_in(7)).unwrap()["Name"],
            "data_in"
        );
    }

    #[test]
    fn test_token_json() {
        let token: LicenseToken =
            serde_json::from_str(r#"{"isValid":true,"token":"t0k"}"#).unwrap();
        assert!(token.is_valid);
        assert_eq!(token.token.as_deref(), Some("t0k"));

        let token: LicenseToken = serde_json::from_str(r#"{"isValid":false}"#).unwrap();
        assert!(!token.is_valid);
        assert!(token.token.is_none());
    }

    #[test]
    fn test_endpoint_paths() {
        let client = LicenseClient::new("http://localhost:8080", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client
                .endpoint(["api", "license-key", "retrieve-token", "as400", "KEY 1"])
                .as_str(),
            "http://localhost:8080/api/license-key/retrieve-token/as400/KEY%201"
        );
        let client =
            LicenseClient::new("http://licenses.local/base/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(["api", "license-key", "update"]).as_str(),
            "http://licenses.local/base/api/license-key/update"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            LicenseClient::new("not a url", Duration::from_secs(1)),
            Err(Error::LicenseService { .. })
        ));
        assert!(LicenseClient::new("mailto:x@y", Duration::from_secs(1)).is_err());
    }
}
