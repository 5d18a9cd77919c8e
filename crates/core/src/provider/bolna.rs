//! Bolna voice-AI provider implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::metrics::PROVIDER_REQUESTS;

use super::{CallProvider, CallStarted, ProviderError};

/// Body of the call-start request.
#[derive(Debug, Serialize)]
struct StartCallBody<'a> {
    agent_id: &'a str,
    from_phone_number: &'a str,
    recipient_phone_number: &'a str,
}

/// HTTP client for the Bolna call API.
pub struct BolnaClient {
    client: Client,
    config: ProviderConfig,
}

impl BolnaClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| ProviderError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn execution_url(&self, execution_id: &str, suffix: &str) -> String {
        self.url(&format!(
            "/executions/{}{}",
            urlencoding::encode(execution_id),
            suffix
        ))
    }

    /// Send an authenticated request and decode the JSON body.
    ///
    /// Non-2xx answers become [`ProviderError::Api`] carrying the provider's
    /// status and body (JSON if it parses, plain string otherwise).
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Value, ProviderError> {
        let result = self.send_inner(request).await;
        let label = match &result {
            Ok(_) => "success",
            Err(ProviderError::Api { .. }) => "api_error",
            Err(ProviderError::Timeout) => "timeout",
            Err(_) => "error",
        };
        PROVIDER_REQUESTS.with_label_values(&[endpoint, label]).inc();
        result
    }

    async fn send_inner(&self, request: RequestBuilder) -> Result<Value, ProviderError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            warn!(status = status.as_u16(), "Call provider returned an error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl CallProvider for BolnaClient {
    fn name(&self) -> &str {
        "bolna"
    }

    async fn start_call(&self, recipient: &str) -> Result<CallStarted, ProviderError> {
        let body = StartCallBody {
            agent_id: &self.config.agent_id,
            from_phone_number: &self.config.from_phone_number,
            recipient_phone_number: recipient,
        };

        debug!(recipient = recipient, "Starting provider call");
        let payload = self
            .send("call", self.client.post(self.url("/call")).json(&body))
            .await?;

        let started = CallStarted::from_payload(payload);
        debug!(execution_id = ?started.execution_id, "Provider call started");
        Ok(started)
    }

    async fn execution(&self, execution_id: &str) -> Result<Value, ProviderError> {
        self.send(
            "execution",
            self.client.get(self.execution_url(execution_id, "")),
        )
        .await
    }

    async fn execution_log(&self, execution_id: &str) -> Result<Value, ProviderError> {
        self.send(
            "execution_log",
            self.client.get(self.execution_url(execution_id, "/log")),
        )
        .await
    }
}
