//! OpenAI-compatible providers for embeddings and chat completions
//!
//! Both clients call the REST API directly with `reqwest`. Requests are
//! never retried; the first failure is reported to the caller.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, LlmConfig, OpenAiConfig};
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

const PROVIDER: &str = "OpenAI";

/// Connection settings shared by the embeddings and chat clients
#[derive(Clone)]
struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    fn new(config: &OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON reply
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        if self.api_key.is_empty() {
            return Err(Error::authentication(PROVIDER, "OPENAI_API_KEY is not set"));
        }

        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::authentication(PROVIDER, format!("API returned {}: {}", status, detail))
                }
                _ => Error::provider(PROVIDER, format!("API returned {}: {}", status, detail)),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("failed to parse response: {}", e)))
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// Embeddings API types

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding provider backed by `{base_url}/embeddings`
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder
    pub fn new(openai: &OpenAiConfig, config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(openai)?,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::debug!("Embedding {} texts with {}", texts.len(), self.model);

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response: EmbeddingResponse = self.client.post("embeddings", &request).await?;
        order_embeddings(response.data, texts.len())
    }
}

/// Put vectors back in input order and check one came back per input
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::provider(
            PROVIDER,
            format!("expected {} embeddings, received {}", expected, data.len()),
        ));
    }

    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::provider(PROVIDER, "embedding indices do not match inputs"));
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::provider(PROVIDER, "API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_request(batch).await?);
        }
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Chat completions API types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    #[serde(default)]
    content: Option<String>,
}

/// Chat model backed by `{base_url}/chat/completions`
pub struct OpenAiChat {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Create a new chat client
    pub fn new(openai: &OpenAiConfig, config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(openai)?,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiChat {
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        let system = PromptBuilder::system_prompt(context);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!(
            "Requesting completion from {} ({} context chars)",
            self.model,
            context.len()
        );

        let response: ChatResponse = self.client.post("chat/completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(PROVIDER, "API returned no choices"))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
