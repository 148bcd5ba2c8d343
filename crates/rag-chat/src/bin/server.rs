//! RAG Server binary
//!
//! Run with: cargo run -p rag-chat --bin rag-chat-server

use rag_chat::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vector index: {}", config.vector_db.persist_directory.display());
    tracing::info!("  - Embedding model: {}", config.embedding.model);
    tracing::info!("  - Chat model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    // Create and start server
    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nEndpoints:");
    println!("  POST /ingest - Upload documents (multipart field 'files')");
    println!("  POST /chat   - Ask a question");
    println!("  GET  /health - Liveness check");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
