//! Remote Transport
//!
//! Blocking HTTP transport to the licensing/update API. Requests are
//! `application/x-www-form-urlencoded` POSTs carrying a standard set of
//! fields on top of the per-operation parameters; responses are JSON,
//! decoded loosely. A missing field in an otherwise valid body is a merge
//! concern, never a transport error.

use crate::config::UpdaterConfig;
use serde_json::Value;
use thiserror::Error;

/// Operation tag for the update check.
pub const ACTION_CHECK_FOR_UPDATE: &str = "check-for-update";
/// Operation tag for the plugin-information lookup.
pub const ACTION_GET_PLUGIN_INFO: &str = "get-plugin-info";

/// Actions owned by this subsystem. The TLS-verification exception, when
/// configured, is scoped to exactly these.
const OWN_ACTIONS: [&str; 2] = [ACTION_CHECK_FOR_UPDATE, ACTION_GET_PLUGIN_INFO];

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status code: {0}")]
    Status(u16),
    #[error("Undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A blocking round-trip to the remote API.
pub trait RemoteTransport: Send + Sync {
    /// POST the given action and parameters, returning the decoded JSON
    /// body on a 200 response.
    fn post(&self, action: &str, params: &[(&str, &str)]) -> Result<Value, TransportError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    endpoint_url: String,
    host_version: String,
    site_url: String,
    license_key: Option<String>,
    client: reqwest::blocking::Client,
    /// Certificate verification disabled; used only for own actions.
    lenient_client: Option<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new(config: &UpdaterConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Packwatch-Updater")
            .build()?;

        let lenient_client = if config.skip_tls_verification {
            Some(
                reqwest::blocking::Client::builder()
                    .user_agent("Packwatch-Updater")
                    .danger_accept_invalid_certs(true)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            endpoint_url: config.endpoint_url.clone(),
            host_version: config.host_version.clone(),
            site_url: config.site_url.clone(),
            license_key: config.license_key.clone(),
            client,
            lenient_client,
        })
    }

    /// Standard fields plus per-operation parameters.
    fn build_body(&self, action: &str, params: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut body = vec![
            ("action".to_string(), action.to_string()),
            ("wp-version".to_string(), self.host_version.clone()),
            ("referer".to_string(), self.site_url.clone()),
        ];
        if let Some(key) = &self.license_key {
            body.push(("key".to_string(), key.clone()));
        }
        for (name, value) in params {
            body.push((name.to_string(), value.to_string()));
        }
        body
    }

    fn client_for(&self, action: &str) -> &reqwest::blocking::Client {
        match &self.lenient_client {
            Some(lenient) if OWN_ACTIONS.contains(&action) => lenient,
            _ => &self.client,
        }
    }
}

impl RemoteTransport for HttpTransport {
    fn post(&self, action: &str, params: &[(&str, &str)]) -> Result<Value, TransportError> {
        let body = self.build_body(action, params);
        let response = self
            .client_for(action)
            .post(&self.endpoint_url)
            .form(&body)
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(action, status = status.as_u16(), "remote request failed");
            return Err(TransportError::Status(status.as_u16()));
        }

        let text = response.text()?;
        let value: Value = serde_json::from_str(&text)?;
        Ok(value)
    }
}
