use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::image::LabelImage;
use crate::providers::VisionProvider;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Finish reasons Gemini uses when it withholds an answer
const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Categories relaxed when `relax_safety_filters` is on; E-numbers and
/// chemical names ("sodium nitrite", "propylene glycol") trip them.
const RELAXED_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Gemini `generateContent` client for label photos
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
    relax_safety_filters: bool,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    ///
    /// # Errors
    /// Returns [`ScanError::Configuration`] if no API key is available.
    pub fn new(config: &ScannerConfig) -> Result<Self, ScanError> {
        let api_key = config.resolve_api_key()?;

        let client = Client::builder()
            .timeout(config.timeout_duration())
            .build()
            .map_err(|e| ScanError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(GoogleProvider {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            response_mime_type: config.response_mime_type.clone(),
            relax_safety_filters: config.relax_safety_filters,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str, image: &LabelImage) -> GenerateContentRequest<'a> {
        let safety_settings = if self.relax_safety_filters {
            RELAXED_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect()
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime().as_str(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: &self.response_mime_type,
            },
            safety_settings,
        }
    }
}

/// Pull the model's text out of a successful response body
fn interpret_response(body: &str) -> Result<String, ScanError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ScanError::Transport {
            message: format!("unreadable response from Google Gemini: {}", e),
            body: Some(body.to_string()),
        })?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone())
    {
        return Err(ScanError::ContentBlocked { reason });
    }

    let candidate = response.candidates.first().ok_or_else(|| ScanError::Transport {
        message: "Google Gemini returned no candidates".to_string(),
        body: Some(body.to_string()),
    })?;

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
    {
        return Err(ScanError::ContentBlocked {
            reason: reason.to_string(),
        });
    }

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(ScanError::Transport {
            message: "Google Gemini response contained no text".to_string(),
            body: Some(body.to_string()),
        });
    }

    debug!(
        "Google Gemini answered ({}): {} characters",
        response.model_version.as_deref().unwrap_or("unknown model"),
        text.len()
    );

    Ok(text)
}

#[async_trait]
impl VisionProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, prompt: &str, image: &LabelImage) -> Result<String, ScanError> {
        let start = Instant::now();

        // Google Gemini API endpoint
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(
            "Sending {} image ({} bytes) to {}",
            image.mime(),
            image.len(),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(prompt, image))
            .send()
            .await
            .map_err(|e| {
                // Convert before logging: the reqwest error still holds the keyed URL
                let err = ScanError::from(e);
                error!("Google Gemini request failed: {}", err);
                err
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            "Google Gemini response ({}, {} ms): {}",
            status,
            start.elapsed().as_millis(),
            body
        );

        // Check for HTTP errors
        if !status.is_success() {
            error!("Google Gemini API error ({}): {}", status, body);
            return Err(ScanError::Transport {
                message: format!("Google Gemini API error ({})", status),
                body: Some(body),
            });
        }

        interpret_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn test_provider(relax_safety_filters: bool) -> GoogleProvider {
        let config = ScannerConfig {
            api_key: Some("test-key".to_string()),
            relax_safety_filters,
            ..Default::default()
        };
        GoogleProvider::new(&config).unwrap()
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(test_provider(true).provider_name(), "google");
    }

    #[test]
    fn test_request_shape() {
        let provider = test_provider(true);
        let image = LabelImage::from_bytes(PNG_HEADER.to_vec()).unwrap();
        let request = serde_json::to_value(provider.build_request("read the label", &image)).unwrap();

        let parts = &request["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "read the label");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], image.to_base64());
        assert_eq!(request["generationConfig"]["temperature"], 0.0);
        assert_eq!(request["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(request["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(request["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn test_request_without_safety_relaxation() {
        let provider = test_provider(false);
        let image = LabelImage::from_bytes(PNG_HEADER.to_vec()).unwrap();
        let request = serde_json::to_value(provider.build_request("prompt", &image)).unwrap();
        assert!(request.get("safetySettings").is_none());
    }

    #[test]
    fn test_interpret_concatenates_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-1.5-flash-002"
        }"#;
        assert_eq!(interpret_response(body).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_interpret_prompt_block() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        match interpret_response(body).unwrap_err() {
            ScanError::ContentBlocked { reason } => assert_eq!(reason, "SAFETY"),
            other => panic!("Expected ContentBlocked, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_candidate_block() {
        let body = r#"{"candidates": [{"finishReason": "PROHIBITED_CONTENT"}]}"#;
        assert!(matches!(
            interpret_response(body).unwrap_err(),
            ScanError::ContentBlocked { .. }
        ));
    }

    #[test]
    fn test_interpret_empty_text_is_transport_failure() {
        let body = r#"{"candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]}"#;
        let err = interpret_response(body).unwrap_err();
        assert!(matches!(err, ScanError::Transport { .. }));
        assert_eq!(err.raw_response(), Some(body));
    }

    #[test]
    fn test_interpret_non_json_envelope() {
        let err = interpret_response("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, ScanError::Transport { .. }));
    }
}
