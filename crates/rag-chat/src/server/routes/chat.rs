//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /chat - Answer a question from the indexed documents
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| Error::invalid_request(e.body_text()))?;
    let start = Instant::now();

    tracing::info!("Question: \"{}\"", request.question);

    let answer = state.retrieval_qa().ask(&request.question).await?;

    tracing::info!(
        "Answered with {} sources in {}ms",
        answer.sources.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(ChatResponse::from_answer(
        answer,
        state.config().retrieval.max_source_chars,
    )))
}
