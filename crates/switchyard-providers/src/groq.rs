use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use switchyard_core::{
    AnswerConfig, Completion, CompletionProvider, CompletionRequest, Error, Result,
    SwitchyardConfig, TokenUsage,
};

/// Groq API endpoint URL.
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Env var key for Groq API key.
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";

/// Groq chat completion provider.
pub struct GroqProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Groq API key.
    api_key: String,
    /// Model name to use.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Completion length limit.
    max_tokens: usize,
}

impl GroqProvider {
    /// Creates a provider for the given key and model with default sampling
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or model name is empty.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_GROQ_API_KEY.to_owned()));
        }
        if model.is_empty() {
            return Err(Error::Config("Groq model name is empty".to_owned()));
        }

        let defaults = AnswerConfig::default();
        Ok(Self {
            client: Client::default(),
            api_key,
            model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        })
    }

    /// Creates a provider from configuration, falling back to the
    /// `GROQ_API_KEY` and `GROQ_MODEL` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key or no model is configured.
    pub fn from_config(config: &SwitchyardConfig) -> Result<Self> {
        let api_key = config
            .get_api_key("groq")
            .ok_or_else(|| Error::MissingApiKey(ENV_GROQ_API_KEY.to_owned()))?;
        let model = config.groq_model().ok_or_else(|| {
            Error::Config("No Groq model configured (set answer.groq_model or GROQ_MODEL)".to_owned())
        })?;

        Ok(Self::new(api_key, model)?
            .with_temperature(config.answer.temperature)
            .with_max_tokens(config.answer.max_tokens))
    }

    /// Sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Completion length cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model name sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &CompletionRequest) -> GroqRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &request.system_prompt {
            messages.push(GroqMessage {
                role: "system".to_owned(),
                content: system_prompt.clone(),
            });
        }
        messages.push(GroqMessage {
            role: "user".to_owned(),
            content: request.prompt.clone(),
        });

        GroqRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Request payload sent to the Groq chat completion API.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    temperature: f32,
    max_tokens: usize,
}

/// Message delivered to the Groq API.
#[derive(Debug, Serialize)]
struct GroqMessage {
    /// Role of the message author (`system` or `user`).
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: GroqUsage,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: String,
}

/// Token usage metrics for a Groq response.
#[derive(Debug, Default, Deserialize)]
struct GroqUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "Groq"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let start = Instant::now();
        let payload = self.build_request(request);

        let response = self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|err| Error::Provider(format!("Groq API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Provider(format!(
                "Groq API error {status}: {error_text}"
            )));
        }

        let groq_response: GroqResponse = response.json().await.map_err(|err| {
            Error::InvalidResponse(format!("Failed to parse Groq response: {err}"))
        })?;

        let latency_ms = start.elapsed().as_millis() as u64;

        let text = groq_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidResponse("No response from Groq".to_owned()))?;

        tracing::debug!(
            "Groq/{} answered in {latency_ms}ms ({} prompt tokens)",
            self.model,
            groq_response.usage.prompt_tokens
        );

        Ok(Completion {
            text,
            provider: format!("Groq/{}", self.model),
            tokens_used: TokenUsage {
                input: groq_response.usage.prompt_tokens,
                output: groq_response.usage.completion_tokens,
            },
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GroqProvider {
        match GroqProvider::new("test_key".to_owned(), "llama-3.3-70b-versatile".to_owned()) {
            Ok(provider) => provider,
            Err(error) => panic!("provider construction failed: {error}"),
        }
    }

    #[test]
    fn groq_provider_with_api_key() {
        let provider = provider();
        assert_eq!(provider.name(), "Groq");
        assert_eq!(provider.model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn empty_api_key_rejected() {
        let result = GroqProvider::new(String::new(), "model".to_owned());
        assert!(matches!(result, Err(Error::MissingApiKey(_))));
    }

    #[test]
    fn empty_model_rejected() {
        let result = GroqProvider::new("key".to_owned(), String::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn request_payload_shape() -> anyhow::Result<()> {
        let provider = provider().with_temperature(0.0).with_max_tokens(64);
        let request = CompletionRequest::new("QUESTION: hi").with_system_prompt("be brief");
        let payload = serde_json::to_value(provider.build_request(&request))?;
        assert_eq!(
            payload,
            json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "QUESTION: hi"}
                ],
                "temperature": 0.0,
                "max_tokens": 64
            })
        );
        Ok(())
    }

    #[test]
    fn response_without_usage_parses() -> anyhow::Result<()> {
        let parsed: GroqResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "ok"}}]}))?;
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.usage.prompt_tokens, 0);
        Ok(())
    }
}
