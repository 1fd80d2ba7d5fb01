use std::time::Duration;

use async_trait::async_trait;
use device_client::domain::DeviceCategory;
use serde::{Deserialize, Serialize};

use crate::config::EstimationConfig;

/// Attributes guessed by the estimation service for one device name.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub power_watts: f64,
    pub category: DeviceCategory,
}

#[derive(thiserror::Error, Debug)]
pub enum EstimationError {
    #[error("estimation upstream error: {0}")]
    Upstream(String),
    #[error("estimation response not parseable: {0}")]
    MalformedResponse(String),
    #[error("estimation response missing field '{0}'")]
    IncompleteResponse(&'static str),
}

impl EstimationError {
    /// Stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            EstimationError::Upstream(_) => "upstream",
            EstimationError::MalformedResponse(_) => "malformed",
            EstimationError::IncompleteResponse(_) => "incomplete",
        }
    }
}

/// Anything that can guess a wattage/category for a device name.
///
/// The production implementation talks to a language model; tests substitute
/// a canned one.
#[async_trait]
pub trait WattageEstimator: Send + Sync {
    async fn estimate(&self, name: &str) -> Result<Estimate, EstimationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct EstimatePayload {
    power_watts: Option<f64>,
    categoria: Option<String>,
}

/// Chat-completions client with a bounded timeout and no retries.
///
/// A failed call is terminal; the resolution cascade decides what happens
/// next, not this client.
pub struct EstimationClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

impl EstimationClient {
    pub fn new(cfg: &EstimationConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent("powerflow/0.1")
            .build()?;

        let api_key = cfg
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }
}

fn build_prompt(name: &str) -> String {
    let vocabulary = DeviceCategory::ALL.map(|c| c.label()).join(", ");
    format!(
        "Eres un asistente que estima el consumo de aparatos eléctricos del hogar. \
         Para el dispositivo \"{name}\", responde únicamente con un objeto JSON con \
         exactamente dos campos: \"power_watts\" (número, potencia típica en watts) y \
         \"categoria\" (una de: {vocabulary}). Sin texto adicional."
    )
}

/// Strip a markdown code fence (with or without a language tag) from around
/// the payload. Models wrap JSON this way often enough that it is part of
/// the wire format in practice.
fn strip_code_fences(s: &str) -> &str {
    let t = s.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

/// Parse the message content of a completion into an [`Estimate`].
fn parse_estimate_content(content: &str) -> Result<Estimate, EstimationError> {
    let cleaned = strip_code_fences(content);

    let payload: EstimatePayload = serde_json::from_str(cleaned)
        .map_err(|e| EstimationError::MalformedResponse(e.to_string()))?;

    let power_watts = payload
        .power_watts
        .ok_or(EstimationError::IncompleteResponse("power_watts"))?;
    let categoria = payload
        .categoria
        .ok_or(EstimationError::IncompleteResponse("categoria"))?;

    Ok(Estimate {
        power_watts,
        category: DeviceCategory::parse_lenient(&categoria),
    })
}

#[async_trait]
impl WattageEstimator for EstimationClient {
    async fn estimate(&self, name: &str) -> Result<Estimate, EstimationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(name),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut call = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        // Timeouts, connect failures and DNS errors all land here.
        let response = call
            .send()
            .await
            .map_err(|e| EstimationError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EstimationError::Upstream(format!(
                "endpoint returned {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EstimationError::MalformedResponse(format!("invalid completion body: {e}")))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| EstimationError::MalformedResponse("completion has no choices".to_string()))?;

        parse_estimate_content(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_content() {
        let est = parse_estimate_content(r#"{"power_watts": 120.0, "categoria": "Electrónica"}"#)
            .unwrap();
        assert_eq!(est.power_watts, 120.0);
        assert_eq!(est.category, DeviceCategory::Electronics);
    }

    #[test]
    fn strips_code_fence_with_language_tag() {
        let content = "```json\n{\"power_watts\": 40, \"categoria\": \"Iluminación\"}\n```";
        let est = parse_estimate_content(content).unwrap();
        assert_eq!(est.power_watts, 40.0);
        assert_eq!(est.category, DeviceCategory::Lighting);
    }

    #[test]
    fn strips_bare_code_fence() {
        let content = "```\n{\"power_watts\": 1500, \"categoria\": \"Climatización\"}\n```";
        let est = parse_estimate_content(content).unwrap();
        assert_eq!(est.category, DeviceCategory::Climate);
    }

    #[test]
    fn non_json_content_is_malformed() {
        let err = parse_estimate_content("not json").unwrap_err();
        assert!(matches!(err, EstimationError::MalformedResponse(_)));
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn missing_power_is_incomplete() {
        let err = parse_estimate_content(r#"{"categoria": "Otros"}"#).unwrap_err();
        assert!(matches!(err, EstimationError::IncompleteResponse("power_watts")));
    }

    #[test]
    fn missing_category_is_incomplete() {
        let err = parse_estimate_content(r#"{"power_watts": 55}"#).unwrap_err();
        assert!(matches!(err, EstimationError::IncompleteResponse("categoria")));
        assert_eq!(err.kind(), "incomplete");
    }

    #[test]
    fn unknown_category_label_falls_back_to_other() {
        let est = parse_estimate_content(r#"{"power_watts": 10, "categoria": "Jardinería"}"#)
            .unwrap();
        assert_eq!(est.category, DeviceCategory::Other);
    }

    #[test]
    fn prompt_embeds_name_and_vocabulary() {
        let prompt = build_prompt("freidora de aire");
        assert!(prompt.contains("freidora de aire"));
        for cat in DeviceCategory::ALL {
            assert!(prompt.contains(cat.label()));
        }
    }
}
