use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{LabelScore, TextClassifier};
use crate::error::{EsgError, Result};
use crate::settings::Settings;

/// Inference servers answer either one ranking per input (`[[...]]`) or a
/// single flat ranking (`[...]`). Failures come back as `{"error": "..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batched(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
    Failed { error: String },
}

/// Text classification over a Hugging Face style inference endpoint.
pub struct HttpClassifier {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpClassifier {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EsgError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpClassifier {
            client,
            url: model_url(&settings.endpoint, &settings.model),
            token: settings.api_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TextClassifier for HttpClassifier {
    fn classify(&self, text: &str, truncate: bool) -> Result<Vec<LabelScore>> {
        let payload = json!({
            "inputs": text,
            "parameters": { "truncation": truncate },
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| EsgError::Classification(format!("Request to {} failed: {}", self.url, e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| EsgError::Classification(format!("Failed to read response: {}", e)))?;
        debug!(%status, bytes = body.len(), "inference response");

        if !status.is_success() {
            return Err(EsgError::Classification(format!(
                "{} returned {}: {}",
                self.url,
                status,
                preview(&body, 200)
            )));
        }

        parse_response(&body)
    }
}

pub fn model_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{}",
        endpoint.trim_end_matches('/'),
        model.trim_matches('/')
    )
}

/// Decode an inference response into labels sorted best first.
pub fn parse_response(body: &str) -> Result<Vec<LabelScore>> {
    let parsed: InferenceResponse = serde_json::from_str(body).map_err(|e| {
        EsgError::Classification(format!(
            "Unexpected inference response ({}): {}",
            e,
            preview(body, 200)
        ))
    })?;

    let mut labels = match parsed {
        InferenceResponse::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
        InferenceResponse::Single(labels) => labels,
        InferenceResponse::Failed { error } => return Err(EsgError::Classification(error)),
    };

    labels.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(labels)
}

fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
