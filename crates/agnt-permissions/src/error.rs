#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("grant config json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("denied")]
    Denied,
}

pub type Result<T> = std::result::Result<T, Error>;
