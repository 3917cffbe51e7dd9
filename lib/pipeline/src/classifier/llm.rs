use super::prompt::{
    extraction_schema, extraction_user_message, strategy_schema, strategy_user_message,
    EXTRACTION_SYSTEM, STRATEGY_SYSTEM,
};
use super::{ClassificationError, Classifier, ExtractionDraft, StrategyDecision};
use dealscout_core::{Strategy, ValueCatalog};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Endpoint of an OpenAI-compatible chat completions server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token; unset means no auth
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    8_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Classifier backed by structured-output chat completions.
///
/// One attempt per call, temperature 0. The response content must parse as
/// JSON matching the declared schema; anything else is an error.
pub struct LlmClassifier {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawDecision {
    strategy: String,
    #[serde(default)]
    rationale: String,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig) -> Result<Self, ClassificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClassificationError::Unavailable(format!("HTTP client: {}", e)))?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn request<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        schema_name: &str,
        schema: Value,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: 0.0,
            response_format: json!({
                "type": "json_schema",
                "json_schema": { "name": schema_name, "schema": schema }
            }),
        }
    }

    fn complete(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: Value,
    ) -> Result<Value, ClassificationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request(system, user, schema_name, schema);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                ClassificationError::Timeout(self.config.timeout_ms)
            } else if e.is_connect() {
                ClassificationError::Unavailable(self.base_url.clone())
            } else {
                ClassificationError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ClassificationError::Malformed(e.to_string()))?;
        debug!(model = %self.config.model, schema = schema_name, "classifier responded");
        parse_content(parsed)
    }
}

fn parse_content(response: ChatResponse) -> Result<Value, ClassificationError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ClassificationError::Malformed("response has no content".to_string()))?;
    serde_json::from_str(content.trim()).map_err(|e| ClassificationError::Malformed(e.to_string()))
}

fn parse_decision(value: Value) -> Result<StrategyDecision, ClassificationError> {
    let raw: RawDecision = serde_json::from_value(value)
        .map_err(|e| ClassificationError::SchemaViolation(e.to_string()))?;
    let strategy: Strategy = raw
        .strategy
        .parse()
        .map_err(ClassificationError::SchemaViolation)?;
    Ok(StrategyDecision::new(strategy, raw.rationale))
}

/// Models often spell "not mentioned" as `null`; those fields are dropped
/// before the draft is typed.
fn parse_draft(value: Value) -> Result<ExtractionDraft, ClassificationError> {
    let Value::Object(mut fields) = value else {
        return Err(ClassificationError::SchemaViolation(
            "extraction is not a JSON object".to_string(),
        ));
    };
    fields.retain(|_, v| !v.is_null());
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ClassificationError::SchemaViolation(e.to_string()))
}

impl Classifier for LlmClassifier {
    fn classify(
        &self,
        text: &str,
        catalog: &ValueCatalog,
    ) -> Result<StrategyDecision, ClassificationError> {
        let user = strategy_user_message(text, catalog);
        let value = self.complete(STRATEGY_SYSTEM, &user, "strategy_decision", strategy_schema())?;
        parse_decision(value)
    }

    fn extract(&self, text: &str, catalog: &ValueCatalog) -> Result<ExtractionDraft, ClassificationError> {
        let user = extraction_user_message(text, catalog);
        let value = self.complete(
            EXTRACTION_SYSTEM,
            &user,
            "search_filters",
            extraction_schema(catalog),
        )?;
        parse_draft(value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::DraftValue;
    use super::*;

    fn response(content: Option<&str>) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice {
                message: ChatReply {
                    content: content.map(str::to_string),
                },
            }],
        }
    }

    #[test]
    fn test_parse_decision() {
        let value = parse_content(response(Some(
            r#"{"strategy": "flexible", "rationale": "exploratory wording"}"#,
        )))
        .unwrap();
        let decision = parse_decision(value).unwrap();
        assert_eq!(decision.strategy, Strategy::Flexible);
        assert_eq!(decision.rationale, "exploratory wording");
    }

    #[test]
    fn test_unknown_strategy_is_schema_violation() {
        let result = parse_decision(json!({ "strategy": "fuzzy", "rationale": "" }));
        assert!(matches!(result, Err(ClassificationError::SchemaViolation(_))));
    }

    #[test]
    fn test_non_json_content_is_malformed() {
        assert!(matches!(
            parse_content(response(Some("Sure! Here are your filters"))),
            Err(ClassificationError::Malformed(_))
        ));
        assert!(matches!(
            parse_content(response(None)),
            Err(ClassificationError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_draft_drops_nulls() {
        let draft = parse_draft(json!({
            "industry": ["fintech"],
            "location": null,
            "funding_amount": { "gte": 1.0e7, "lte": null }
        }))
        .unwrap();
        assert_eq!(draft.fields.len(), 2);
        assert_eq!(
            draft.fields["funding_amount"],
            DraftValue::Range { gte: Some(1.0e7), lte: None }
        );
    }

    #[test]
    fn test_parse_draft_rejects_array() {
        assert!(matches!(
            parse_draft(json!(["fintech"])),
            Err(ClassificationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let classifier = LlmClassifier::new(LlmConfig::default()).unwrap();
        let body = serde_json::to_value(classifier.request("sys", "user", "s", json!({}))).unwrap();
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "s");
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let classifier = LlmClassifier::new(LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 500,
            ..LlmConfig::default()
        })
        .unwrap();
        let result = classifier.classify("fintech", &ValueCatalog::empty());
        assert!(matches!(
            result,
            Err(ClassificationError::Unavailable(_)) | Err(ClassificationError::Timeout(_))
        ));
    }
}
