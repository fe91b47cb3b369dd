#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("summarization request failed: {0}")]
    Summarize(String),
}

pub type Result<T> = std::result::Result<T, Error>;
