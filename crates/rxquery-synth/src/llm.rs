//! Text-completion clients for hosted language models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use rxquery_core::config::{LlmConfig, LlmProvider};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Gemini reads the key from this header, so it never appears in a URL.
const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

/// Error text can reach API clients; strip the request URL first.
fn transport_error(e: reqwest::Error) -> LlmError {
    LlmError::Network(e.without_url().to_string())
}

fn decode_error(e: reqwest::Error) -> LlmError {
    LlmError::Serialization(e.without_url().to_string())
}

/// A black-box text completion capability: prompt in, text out.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Short `provider/model` label for logs and audit records.
    fn describe(&self) -> String;
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    api_base_url: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Config(format!("{:?} requires an API key", self.config.provider)))
    }

    async fn gemini_generate(&self, prompt: &str) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Request<'a> {
            contents: Vec<Content<'a>>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base_url, self.config.model
        );

        let resp = self
            .client
            .post(&url)
            .header(GEMINI_KEY_HEADER, self.api_key()?)
            .json(&Request {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig { temperature: 0.0 },
            })
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("Gemini error {status}: {text}")));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(decode_error)?;

        let text = result
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(text)
    }

    async fn openai_chat(&self, prompt: &str) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&Request {
                model: &self.config.model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.0,
            })
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(LlmError::Api(format!("OpenAI error: {}", resp.status())));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(decode_error)?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn ollama_generate(&self, prompt: &str) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Serialize)]
        struct Options {
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Request {
                model: &self.config.model,
                prompt,
                stream: false,
                options: Options { temperature: 0.0 },
            })
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(LlmError::Api(format!("Ollama error: {}", resp.status())));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(decode_error)?;
        Ok(result.response)
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self.config.provider {
            LlmProvider::Gemini => self.gemini_generate(prompt).await,
            LlmProvider::OpenAi => self.openai_chat(prompt).await,
            LlmProvider::Ollama => self.ollama_generate(prompt).await,
        }
    }

    fn describe(&self) -> String {
        let provider = match self.config.provider {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        };
        format!("{provider}/{}", self.config.model)
    }
}
