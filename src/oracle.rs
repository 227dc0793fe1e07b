use crate::locale::LocaleConfig;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// One batch of texts to translate between two locales.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub source: &'a LocaleConfig,
    pub target: &'a LocaleConfig,
    pub texts: &'a [String],
}

/// External translation service.
///
/// Implementations must return one string per input text, in input order.
/// The caller tolerates shorter responses but cannot detect reordering.
pub trait TranslationOracle: Send + Sync {
    fn translate<'a>(&'a self, request: OracleRequest<'a>) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// OpenAI Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    response_format: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Non-success HTTP response from the oracle API
#[derive(Debug, thiserror::Error)]
#[error("Oracle API error ({status}): {body}")]
struct ApiError {
    status: StatusCode,
    body: String,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

/// Build the system prompt describing the batch contract
fn build_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        r#"You are a professional translator for a content management system. Translate every string from {} to {}.

## Input
A JSON object {{"texts": [...]}} holding an ordered list of strings. Each string is one field or one
text fragment of a rich-text document; fragments may start or end with spaces because they sit next
to differently formatted text.

## Output
Reply with a JSON object {{"translations": [...]}} and nothing else.
- Exactly one translation per input string, in the same order
- Never merge, split, drop or reorder strings
- Keep leading and trailing whitespace of every string

## DO NOT translate
- URLs, email addresses and file paths
- Template placeholders such as {{{{name}}}} or {{count}}
- Code, identifiers and product names

## Formatting
- Preserve markdown and punctuation style
- If a string has no sensible translation, return it unchanged"#,
        source_language, target_language
    )
}

/// Build the user message carrying the texts
fn build_user_prompt(texts: &[String]) -> String {
    json!({ "texts": texts }).to_string()
}

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the model's reply into the list of translations.
///
/// Accepts `{"translations": [...]}` or a bare array, optionally inside a
/// markdown code fence.
fn parse_translations(content: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(strip_code_fence(content))
        .context("Oracle reply is not valid JSON")?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("translations") {
            Some(Value::Array(items)) => items,
            _ => bail!("Oracle reply has no \"translations\" array"),
        },
        _ => bail!("Oracle reply is neither an object nor an array"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s),
            other => bail!("Translation {} is not a string: {}", i, other),
        })
        .collect()
}

/// Translation oracle backed by an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    retry: RetryConfig,
}

impl OpenAiOracle {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: model.into(),
            temperature: 0.2,
            retry: RetryConfig::oracle_call(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, request: &OracleRequest<'_>) -> ChatRequest {
        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&self.model);

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(&request.source.label, &request.target.label),
                },
                Message {
                    role: "user".to_string(),
                    content: build_user_prompt(request.texts),
                },
            ],
            temperature: if is_reasoning { None } else { Some(self.temperature) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
            response_format: json!({ "type": "json_object" }),
        }
    }

    async fn call(&self, request: OracleRequest<'_>) -> Result<Vec<String>> {
        if request.texts.is_empty() {
            return Ok(Vec::new());
        }

        let chat_request = self.build_request(&request);

        let translations = with_retry_if(
            &self.retry,
            &format!("Translation to {}", request.target.code),
            || async {
                let response = self
                    .client
                    .post(&self.api_url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .json(&chat_request)
                    .send()
                    .await
                    .context("Failed to send translation request")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(ApiError { status, body }.into());
                }

                let chat_response: ChatResponse = response
                    .json()
                    .await
                    .context("Failed to parse oracle response")?;

                let content = chat_response
                    .choices
                    .first()
                    .map(|c| c.message.content.as_str())
                    .context("Oracle response contained no choices")?;

                parse_translations(content)
            },
            is_retryable_error,
        )
        .await?;

        debug!(
            "Oracle returned {} of {} translations for {}",
            translations.len(),
            request.texts.len(),
            request.target.code
        );

        Ok(translations)
    }
}

impl TranslationOracle for OpenAiOracle {
    fn translate<'a>(&'a self, request: OracleRequest<'a>) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(self.call(request))
    }
}

/// Retry rate limits, server errors and transport failures.
/// Other 4xx responses and unusable replies fail immediately.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    if let Some(api_error) = error.downcast_ref::<ApiError>() {
        return api_error.status == StatusCode::TOO_MANY_REQUESTS
            || api_error.status.is_server_error();
    }
    error.downcast_ref::<reqwest::Error>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn locale(code: &str, label: &str) -> LocaleConfig {
        LocaleConfig {
            code: code.to_string(),
            label: label.to_string(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn chat_completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }
            ]
        })
    }

    fn oracle(server: &MockServer) -> OpenAiOracle {
        OpenAiOracle::new(
            reqwest::Client::new(),
            "test-key",
            format!("{}/v1/chat/completions", server.uri()),
            "gpt-4o-mini",
        )
        .with_retry(RetryConfig::new(3, Duration::from_millis(5)))
    }

    // ==================== Prompt Tests ====================

    #[test]
    fn test_system_prompt_names_languages_and_contract() {
        let prompt = build_system_prompt("English", "Czech");
        assert!(prompt.contains("from English to Czech"));
        assert!(prompt.contains(r#"{"translations": [...]}"#));
        assert!(prompt.contains("same order"));
        assert!(prompt.contains("{{name}}"));
    }

    #[test]
    fn test_user_prompt_is_json() {
        let prompt = build_user_prompt(&strings(&["Hello", "say \"hi\""]));
        let parsed: Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(parsed, json!({"texts": ["Hello", "say \"hi\""]}));
    }

    #[test]
    fn test_reasoning_models_skip_temperature() {
        let reasoning = OpenAiOracle::new(reqwest::Client::new(), "k", "http://x", "o3-mini");
        let (en, cz) = (locale("en", "English"), locale("cz", "Czech"));
        let texts = strings(&["a"]);
        let request = reasoning.build_request(&OracleRequest {
            source: &en,
            target: &cz,
            texts: &texts,
        });
        assert!(request.temperature.is_none());
        assert_eq!(request.reasoning_effort.as_deref(), Some("low"));

        let regular = OpenAiOracle::new(reqwest::Client::new(), "k", "http://x", "gpt-4o-mini")
            .with_temperature(0.1);
        let request = regular.build_request(&OracleRequest {
            source: &en,
            target: &cz,
            texts: &texts,
        });
        assert_eq!(request.temperature, Some(0.1));
        assert!(request.reasoning_effort.is_none());
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_object_reply() {
        let parsed = parse_translations(r#"{"translations": ["Ahoj", " svět"]}"#).unwrap();
        assert_eq!(parsed, strings(&["Ahoj", " svět"]));
    }

    #[test]
    fn test_parse_bare_array_in_code_fence() {
        let parsed = parse_translations("```json\n[\"a\", \"b\"]\n```").unwrap();
        assert_eq!(parsed, strings(&["a", "b"]));
    }

    #[test]
    fn test_parse_rejects_non_string_items() {
        let err = parse_translations(r#"{"translations": ["a", 2]}"#).unwrap_err();
        assert!(err.to_string().contains("Translation 1 is not a string"));
    }

    #[test]
    fn test_parse_rejects_missing_array() {
        assert!(parse_translations(r#"{"result": []}"#).is_err());
        assert!(parse_translations("not json").is_err());
        assert!(parse_translations("42").is_err());
    }

    #[test]
    fn test_strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    // ==================== Retryability Tests ====================

    #[test]
    fn test_is_retryable_error() {
        let api = |status: StatusCode| {
            is_retryable_error(&anyhow::Error::from(ApiError {
                status,
                body: String::new(),
            }))
        };
        assert!(api(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(api(StatusCode::BAD_GATEWAY));
        assert!(api(StatusCode::TOO_MANY_REQUESTS));
        assert!(!api(StatusCode::UNAUTHORIZED));
        assert!(!api(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_error(&anyhow::anyhow!("Oracle reply is not valid JSON")));
    }

    #[test]
    fn test_api_error_message_names_status() {
        let err = ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Oracle API error (503 Service Unavailable): overloaded"
        );
    }

    // ==================== Integration Tests with Wiremock ====================

    #[tokio::test]
    async fn test_translate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_string_contains("to Czech"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
                r#"{"translations": ["Ahoj", "Svět"]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let (en, cz) = (locale("en", "English"), locale("cz", "Czech"));
        let texts = strings(&["Hello", "World"]);
        let result = oracle(&server)
            .translate(OracleRequest {
                source: &en,
                target: &cz,
                texts: &texts,
            })
            .await
            .expect("should succeed");

        assert_eq!(result, strings(&["Ahoj", "Svět"]));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let (en, cz) = (locale("en", "English"), locale("cz", "Czech"));
        let result = oracle(&server)
            .translate(OracleRequest {
                source: &en,
                target: &cz,
                texts: &[],
            })
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let (en, pl) = (locale("en", "English"), locale("pl", "Polish"));
        let texts = strings(&["Hello"]);
        let err = oracle(&server)
            .translate(OracleRequest {
                source: &en,
                target: &pl,
                texts: &texts,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let (en, pl) = (locale("en", "English"), locale("pl", "Polish"));
        let texts = strings(&["Hello"]);
        let result = oracle(&server)
            .translate(OracleRequest {
                source: &en,
                target: &pl,
                texts: &texts,
            })
            .await;

        assert!(result.unwrap_err().to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_completion("Sorry, I can't do that")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (en, pl) = (locale("en", "English"), locale("pl", "Polish"));
        let texts = strings(&["Hello"]);
        let result = oracle(&server)
            .translate(OracleRequest {
                source: &en,
                target: &pl,
                texts: &texts,
            })
            .await;

        assert!(result.is_err());
    }
}
