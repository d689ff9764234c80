//! Gemini `generateContent` tagger.
//!
//! Sends each batch as a JSON listing inside a single user turn and asks for
//! a JSON reply of the form
//! `{"redactions": [{"index": <int>, "type": "<category>"}]}`.

use super::inference::{InferenceClient, InferenceItem, InferenceLabel};
use crate::config::InferenceConfig;
use crate::domain::Category;
use crate::error::InferenceError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROMPT_HEADER: &str = "\
You tag personally identifying information in OCR output.
Each line below is one word as JSON: index, the word text, and the words around it.
Reply with ONLY this JSON:
{\"redactions\": [{\"index\": <int>, \"type\": \"name|email|phone|address|ip|id_number|credential|other\"}]}
Rules:
- Prefer precision; leave out anything you are unsure about.
- 'address' means postal addresses: street, house number, city, state, postcode.
- 'id_number' covers government, customer and account identifiers.
- List every word of a multi-word name or address separately.
Words:";

/// Carries the key so it never appears in a request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest error body kept in [`InferenceError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Blocking client for the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_ms: u64,
}

impl GeminiClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl InferenceClient for GeminiClient {
    fn classify(&self, items: &[InferenceItem]) -> Result<Vec<InferenceLabel>, InferenceError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: build_prompt(items)?,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http
            .post(self.url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    InferenceError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                InferenceError::MalformedResponse(e.without_url().to_string())
            }
        })?;

        let text = reply.first_text();
        debug!("{} returned {} bytes for {} words", self.model, text.len(), items.len());
        parse_labels(text, items.len())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn build_prompt(items: &[InferenceItem]) -> Result<String, InferenceError> {
    let mut prompt = String::from(PROMPT_HEADER);
    for item in items {
        let line = serde_json::to_string(item)
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;
        prompt.push('\n');
        prompt.push_str(&line);
    }
    Ok(prompt)
}

/// Parses the model's JSON reply, dropping indices outside the batch.
fn parse_labels(text: &str, batch_len: usize) -> Result<Vec<InferenceLabel>, InferenceError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: RedactionList = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

    Ok(parsed
        .redactions
        .into_iter()
        .filter_map(|r| {
            let index = usize::try_from(r.index?).ok()?;
            if index >= batch_len {
                return None;
            }
            let category = Category::normalize(r.kind.as_deref().unwrap_or("other"));
            category.is_pii().then_some(InferenceLabel { index, category })
        })
        .collect())
}

/// Models occasionally wrap JSON in a Markdown fence despite the MIME hint.
fn strip_code_fence(text: &str) -> &str {
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|t| t.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or("")
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RedactionList {
    #[serde(default)]
    redactions: Vec<RawRedaction>,
}

#[derive(Deserialize)]
struct RawRedaction {
    index: Option<i64>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_filters_and_normalizes() {
        let reply = r#"{"redactions": [
            {"index": 0, "type": "person"},
            {"index": 1, "type": "address"},
            {"index": 7, "type": "name"},
            {"index": -1, "type": "name"},
            {"index": 2, "type": "none"}
        ]}"#;
        let labels = parse_labels(reply, 3).unwrap();
        assert_eq!(
            labels,
            vec![
                InferenceLabel {
                    index: 0,
                    category: Category::Name
                },
                InferenceLabel {
                    index: 1,
                    category: Category::Address
                },
            ]
        );
    }

    #[test]
    fn test_parse_labels_fenced_and_empty() {
        let fenced = "```json\n{\"redactions\": [{\"index\": 0, \"type\": \"email\"}]}\n```";
        assert_eq!(parse_labels(fenced, 1).unwrap().len(), 1);
        assert!(parse_labels("", 1).unwrap().is_empty());
        assert!(matches!(
            parse_labels("not json", 1),
            Err(InferenceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "hi".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_url() {
        let client = GeminiClient::new(&InferenceConfig::new("k")).unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_transport_error_does_not_leak_key() {
        let mut config = InferenceConfig::new("secret-key-123");
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.timeout_ms = 2_000;
        let client = GeminiClient::new(&config).unwrap();

        let item = InferenceItem {
            index: 0,
            text: "Jane".to_string(),
            context: String::new(),
        };
        let err = client.classify(&[item]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Transport(_) | InferenceError::Timeout { .. }
        ));
        assert!(!err.to_string().contains("secret-key-123"));
    }
}
