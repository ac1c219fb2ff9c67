use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::queue::ScanEvent;
use crate::api::scan::{ScanRequest, UserSummary};
use crate::model::scan_log::ScanAction;

/// Why a scan did not produce an attendance change. The display text of each
/// variant is what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Card not registered")]
    NotRegistered,

    #[error("API error: {0}")]
    Status(u16),

    #[error("API timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    /// 200 reply that still reported failure.
    #[error("{0}")]
    Rejected(String),
}

/// What the service recorded for an accepted scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedScan {
    pub action: ScanAction,
    pub name: String,
    pub department: Option<String>,
    pub message: String,
    pub timestamp: String,
}

/// Normalized result of one dispatch. Not `Clone`: it is applied to the
/// display exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub uid: String,
    pub result: Result<AcceptedScan, DispatchError>,
}

impl DispatchOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fields the kiosk reads from a 200 reply; anything missing gets a default.
#[derive(Debug, Deserialize)]
struct ScanReply {
    #[serde(default)]
    success: bool,
    action: Option<ScanAction>,
    #[serde(default)]
    message: String,
    user: Option<UserSummary>,
    #[serde(default)]
    timestamp: String,
    error: Option<String>,
}

/// Maps a finished HTTP exchange onto the outcome table.
pub fn outcome_from_response(status: u16, body: &[u8]) -> Result<AcceptedScan, DispatchError> {
    match status {
        200 => {
            let reply: ScanReply = serde_json::from_slice(body)
                .map_err(|e| DispatchError::Connection(format!("invalid response body: {e}")))?;

            if !reply.success {
                return Err(DispatchError::Rejected(
                    reply.error.unwrap_or_else(|| "Unknown error".to_string()),
                ));
            }

            let user = reply.user.unwrap_or(UserSummary {
                name: "Unknown User".to_string(),
                department: None,
            });
            Ok(AcceptedScan {
                action: reply.action.unwrap_or(ScanAction::Unknown),
                name: user.name,
                department: user.department,
                message: reply.message,
                timestamp: reply.timestamp,
            })
        }
        404 => Err(DispatchError::NotRegistered),
        other => Err(DispatchError::Status(other)),
    }
}

/// Sends accepted scans to the attendance service.
///
/// Each scan runs in its own task so neither the reader nor the UI tick waits
/// on the network. A semaphore caps how many requests are in flight; failed
/// scans are never retried.
#[derive(Clone)]
pub struct ScanDispatcher {
    client: reqwest::Client,
    url: Arc<str>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl ScanDispatcher {
    pub fn new(url: &str, timeout: Duration, workers: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: Arc::from(url),
            timeout,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        })
    }

    /// Spawns the dispatch and hands its outcome to `outcomes`. Must be called
    /// from within a tokio runtime.
    pub fn submit(
        &self,
        event: ScanEvent,
        outcomes: mpsc::UnboundedSender<DispatchOutcome>,
    ) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(event).await;
            if outcomes.send(outcome).is_err() {
                debug!("UI driver gone; dropping dispatch outcome");
            }
        })
    }

    /// Waiting for a worker slot counts against the timeout, so every scan
    /// gets its outcome within `timeout` of being dispatched.
    pub async fn dispatch(&self, event: ScanEvent) -> DispatchOutcome {
        let attempt = async {
            // The semaphore is never closed, so acquire only fails if it were.
            let _permit = self.permits.acquire().await.ok();
            self.send(&event.uid).await
        };

        let result = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout),
        };

        match &result {
            Ok(scan) => info!(uid = %event.uid, action = %scan.action, "Scan accepted by service"),
            Err(e) => warn!(uid = %event.uid, error = %e, "Scan dispatch failed"),
        }

        DispatchOutcome {
            uid: event.uid,
            result,
        }
    }

    async fn send(&self, uid: &str) -> Result<AcceptedScan, DispatchError> {
        let response = self
            .client
            .post(&*self.url)
            .json(&ScanRequest {
                rfid_uid: uid.to_string(),
            })
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        outcome_from_response(status, &body)
    }
}

fn classify(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Timeout
    } else {
        DispatchError::Connection(e.to_string())
    }
}
