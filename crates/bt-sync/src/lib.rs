//! Remote spreadsheet sync for the baby tracker.
//!
//! The endpoint accepts `POST` with one event as JSON and answers `GET` with a
//! JSON array of every stored event. There is no authentication, and the
//! local store stays the source of truth whatever the outcome of a sync.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bt_core::Event;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Default request timeout for sync calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sync client errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The endpoint URL was empty or not http(s).
    #[error("invalid sync endpoint: {reason}")]
    InvalidEndpoint { reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status.
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The background push task did not complete.
    #[error("sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What to do when pushing an event fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// Drop the failure; it is only visible in debug logs.
    #[default]
    Ignore,
    /// Log the failure as a warning and carry on.
    Warn,
    /// Return the failure to the caller.
    Fail,
}

impl SyncPolicy {
    /// Applies the policy to a push outcome.
    pub fn handle(self, outcome: Result<(), SyncError>) -> Result<(), SyncError> {
        let Err(err) = outcome else {
            return Ok(());
        };
        match self {
            Self::Ignore => {
                tracing::debug!(error = %err, "event push failed, ignoring");
                Ok(())
            }
            Self::Warn => {
                tracing::warn!(error = %err, "event push failed");
                Ok(())
            }
            Self::Fail => Err(err),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ignore => "ignore",
            Self::Warn => "warn",
            Self::Fail => "fail",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            _ => Err(format!("unknown sync policy: {s}")),
        }
    }
}

/// Client for the sync endpoint.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SyncClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is blank or not an http(s) URL, or if
    /// the HTTP client fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SyncError> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidEndpoint {
                reason: "endpoint cannot be empty".to_string(),
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(SyncError::InvalidEndpoint {
                reason: format!("expected an http(s) URL, got {trimmed}"),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(SyncError::ClientBuild)?;

        Ok(Self {
            http,
            endpoint: trimmed.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one finalized event to the endpoint.
    pub async fn push(&self, event: &Event) -> Result<(), SyncError> {
        let response = self.http.post(&self.endpoint).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(type_name = %event.type_name, "pushed event");
        Ok(())
    }

    /// Pushes `event` on a background task.
    ///
    /// The handle resolves to the push outcome; dropping it detaches the task.
    pub fn spawn_push(&self, event: Event) -> JoinHandle<Result<(), SyncError>> {
        let client = self.clone();
        tokio::spawn(async move { client.push(&event).await })
    }

    /// Fetches every event stored at the endpoint.
    pub async fn load_all(&self) -> Result<Vec<Event>, SyncError> {
        let response = self.http.get(&self.endpoint).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let events: Vec<Event> = serde_json::from_str(&body)
            .map_err(|err| SyncError::InvalidResponse(err.to_string()))?;
        tracing::debug!(count = events.len(), "loaded remote events");
        Ok(events)
    }
}
