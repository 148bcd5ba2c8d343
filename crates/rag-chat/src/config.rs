//! Configuration for the RAG service
//!
//! Built once at start-up from the environment (after loading an optional
//! `.env` file) and passed by reference into every component constructor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// OpenAI-compatible provider credentials and endpoint
    pub openai: OpenAiConfig,
    /// Embedding configuration
    pub embedding: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Generation model configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Parent directory for request-scoped upload directories
    pub upload_dir: PathBuf,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_dir: std::env::temp_dir().join("rag_uploads"),
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// OpenAI-compatible API configuration, shared by embeddings and chat
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (empty means unauthenticated; provider calls will fail)
    pub api_key: String,
    /// API base URL, without trailing slash
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

// Keep the key out of logs
impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Maximum number of inputs sent in one embeddings request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 1000,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 100,
        }
    }
}

/// Generation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat model name
    pub model: String,
    /// Sampling temperature (0.0 for repeatable answers)
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Maximum characters of each source returned to the caller
    pub max_source_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_source_chars: 1000,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Directory holding the index files
    pub persist_directory: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            persist_directory: PathBuf::from("chroma_db"),
        }
    }
}

impl RagConfig {
    /// Load configuration from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::configuration(format!("Invalid .env file: {}", e))),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            config.openai.api_key = key.trim().to_string();
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            config.openai.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = var("CHROMA_DIR") {
            config.vector_db.persist_directory = PathBuf::from(dir);
        }
        if let Some(model) = var("MODEL_NAME") {
            config.llm.model = model;
        }
        if let Some(model) = var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(host) = var("HOST") {
            config.server.host = host;
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            config.server.upload_dir = PathBuf::from(dir);
        }

        parse_into(&var, "EMBEDDING_BATCH_SIZE", &mut config.embedding.batch_size)?;
        parse_into(&var, "CHUNK_SIZE", &mut config.chunking.chunk_size)?;
        parse_into(&var, "CHUNK_OVERLAP", &mut config.chunking.chunk_overlap)?;
        parse_into(&var, "RETRIEVAL_TOP_K", &mut config.retrieval.top_k)?;
        parse_into(&var, "SOURCE_PREVIEW_CHARS", &mut config.retrieval.max_source_chars)?;
        parse_into(&var, "PORT", &mut config.server.port)?;
        parse_into(&var, "MAX_UPLOAD_SIZE", &mut config.server.max_upload_size)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(Error::configuration("CHUNK_SIZE must be greater than zero"));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(Error::configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::configuration("RETRIEVAL_TOP_K must be greater than zero"));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::configuration("EMBEDDING_BATCH_SIZE must be greater than zero"));
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_into<T, F>(var: &F, key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| Error::configuration(format!("Invalid {} '{}': {}", key, raw, e)))?;
    }
    Ok(())
}
