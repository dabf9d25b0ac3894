//! reqwest-backed engine client
//!
//! Endpoints, relative to the base URL:
//! - `POST /simulate` `{"parameters": {...}}` -> `{"successProbability", "endingMedian", ...}`
//! - `POST /sensitivity` `{"parameters", "field", "variation"}` -> `{"successProbability", ...}`
//! - `GET /schema` -> `{"fields": [...]}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::EngineError;
use crate::model::{ParameterSet, SensitivityMetrics, SimulationMetrics};

use super::{EngineSchema, SimulationClient};

#[derive(Serialize)]
struct SimulateRequest<'a> {
    parameters: &'a ParameterSet,
}

#[derive(Serialize)]
struct SensitivityRequest<'a> {
    parameters: &'a ParameterSet,
    field: &'a str,
    variation: f64,
}

#[derive(Debug, Clone)]
pub struct HttpSimulationClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl HttpSimulationClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn send_error(&self, err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout {
                timeout_ms: self.timeout_ms(),
            }
        } else {
            EngineError::Transport(err.to_string())
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%status, "failed to read error body: {e}");
                    String::new()
                }
            };
            return Err(status_error(status, body));
        }

        let bytes = response.bytes().await.map_err(|e| self.send_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

/// Classify a non-success status. Validation failures carry the engine's own
/// message; anything else is treated as a failed exchange.
fn status_error(status: StatusCode, body: String) -> EngineError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => EngineError::Rejection {
            status: status.as_u16(),
            message: rejection_message(&body),
        },
        _ => EngineError::Transport(format!("engine returned {status}")),
    }
}

/// Pull `error` or `message` out of a JSON body, falling back to the raw text
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SimulationClient for HttpSimulationClient {
    async fn run_simulation(
        &self,
        params: &ParameterSet,
    ) -> Result<SimulationMetrics, EngineError> {
        let response = self
            .client
            .post(self.url("simulate"))
            .json(&SimulateRequest { parameters: params })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.decode(response).await
    }

    async fn run_sensitivity_point(
        &self,
        baseline: &ParameterSet,
        field: &str,
        variation: f64,
    ) -> Result<SensitivityMetrics, EngineError> {
        let response = self
            .client
            .post(self.url("sensitivity"))
            .json(&SensitivityRequest {
                parameters: baseline,
                field,
                variation,
            })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.decode(response).await
    }

    async fn engine_schema(&self) -> Result<EngineSchema, EngineError> {
        let response = self
            .client
            .get(self.url("schema"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.decode(response).await
    }
}
