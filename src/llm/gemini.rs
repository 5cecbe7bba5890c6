//! Google AI Studio (Gemini) backend
//!
//! Calls the `generateContent` REST endpoint with JSON output mode and
//! returns the concatenated candidate text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use super::{GenerationError, GenerationRequest, NotificationGenerator};
use crate::config::GeneratorConfig;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

/// Safety filters sent with every request, all at BLOCK_NONE.
const SAFETY_SETTINGS: [SafetySetting; 4] = [
    SafetySetting { category: "HARM_CATEGORY_HARASSMENT", threshold: "BLOCK_NONE" },
    SafetySetting { category: "HARM_CATEGORY_HATE_SPEECH", threshold: "BLOCK_NONE" },
    SafetySetting { category: "HARM_CATEGORY_SEXUALLY_EXPLICIT", threshold: "BLOCK_NONE" },
    SafetySetting { category: "HARM_CATEGORY_DANGEROUS_CONTENT", threshold: "BLOCK_NONE" },
];

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// ============================================================================
// Backend
// ============================================================================

/// HTTP client for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiGenerator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiGenerator {
    /// Create a new client. The HTTP timeout matches the configured bounded wait.
    pub fn new(config: &GeneratorConfig, api_key: String) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(SYSTEM_INSTRUCTION.to_string()),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_k: 1,
                top_p: 1.0,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: "application/json",
            },
            safety_settings: SAFETY_SETTINGS.to_vec(),
        }
    }
}

/// Pull the candidate text out of a response, surfacing policy blocks.
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Rejected(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("no candidates".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(reason, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION") {
            return Err(GenerationError::Rejected(reason.to_string()));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::Malformed("empty candidate text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl NotificationGenerator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.model, state = %request.state, "Calling Gemini generateContent");

        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        extract_text(parsed)
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}
