use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::Transmission;
use crate::config::DEFAULT_API_URL;
use crate::error::{MailError, Result};

const TRANSMISSIONS_PATH: &str = "/api/v1/transmissions";

/// Counters returned by the transmissions endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionResults {
    #[serde(default)]
    pub total_accepted_recipients: u64,
    #[serde(default)]
    pub total_rejected_recipients: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Parsed API response, keeping the raw body alongside the counters
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionResponse {
    pub results: TransmissionResults,
    pub body: serde_json::Value,
}

impl TransmissionResponse {
    pub fn from_body(body: serde_json::Value) -> Result<Self> {
        let results = match body.get("results") {
            Some(results) => serde_json::from_value(results.clone())?,
            None => TransmissionResults::default(),
        };

        Ok(Self { results, body })
    }

    pub fn accepted(&self) -> u64 {
        self.results.total_accepted_recipients
    }

    pub fn rejected(&self) -> u64 {
        self.results.total_rejected_recipients
    }
}

/// Submits transmissions to SparkPost
#[async_trait]
pub trait TransmissionClient: Send + Sync {
    async fn post_transmission(
        &self,
        api_key: &str,
        transmission: &Transmission,
    ) -> Result<TransmissionResponse>;
}

/// HTTPS client for the SparkPost REST API
#[derive(Clone)]
pub struct HttpTransmissionClient {
    client: Client,
    base_url: String,
}

impl HttpTransmissionClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, TRANSMISSIONS_PATH)
    }
}

impl Default for HttpTransmissionClient {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[async_trait]
impl TransmissionClient for HttpTransmissionClient {
    async fn post_transmission(
        &self,
        api_key: &str,
        transmission: &Transmission,
    ) -> Result<TransmissionResponse> {
        let res = self
            .client
            .post(self.endpoint())
            .header("Authorization", api_key)
            .json(transmission)
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(status = %status, error = %body, "SparkPost API error");
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response = TransmissionResponse::from_body(res.json().await?)?;

        debug!(
            id = ?response.results.id,
            accepted = response.accepted(),
            rejected = response.rejected(),
            "Transmission accepted by SparkPost"
        );

        Ok(response)
    }
}

#[derive(Debug, Clone)]
enum Reply {
    AcceptAll,
    Results(TransmissionResults),
    Fail { status: u16, body: String },
}

/// In-memory client that records every transmission instead of sending it
#[derive(Clone)]
pub struct RecordingClient {
    sent: Arc<Mutex<Vec<Transmission>>>,
    reply: Reply,
}

impl RecordingClient {
    /// Accept every recipient of each transmission
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            reply: Reply::AcceptAll,
        }
    }

    /// Answer every transmission with the given counters
    pub fn with_results(accepted: u64, rejected: u64) -> Self {
        Self {
            reply: Reply::Results(TransmissionResults {
                total_accepted_recipients: accepted,
                total_rejected_recipients: rejected,
                id: None,
            }),
            ..Self::new()
        }
    }

    /// Fail every transmission with an API error
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Reply::Fail {
                status,
                body: body.into(),
            },
            ..Self::new()
        }
    }

    pub async fn sent(&self) -> Vec<Transmission> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransmissionClient for RecordingClient {
    async fn post_transmission(
        &self,
        _api_key: &str,
        transmission: &Transmission,
    ) -> Result<TransmissionResponse> {
        self.sent.lock().await.push(transmission.clone());

        let results = match &self.reply {
            Reply::AcceptAll => TransmissionResults {
                total_accepted_recipients: (transmission.recipients.len()
                    + transmission.cc.len()
                    + transmission.bcc.len()) as u64,
                ..TransmissionResults::default()
            },
            Reply::Results(results) => results.clone(),
            Reply::Fail { status, body } => {
                return Err(MailError::Api {
                    status: *status,
                    body: body.clone(),
                })
            }
        };

        let body = serde_json::json!({ "results": &results });
        Ok(TransmissionResponse { results, body })
    }
}
