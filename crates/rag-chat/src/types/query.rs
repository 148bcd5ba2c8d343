//! Request types

use serde::{Deserialize, Serialize};

/// Chat request body for `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The question to answer
    pub question: String,
}
