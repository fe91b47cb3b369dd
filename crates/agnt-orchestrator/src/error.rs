#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timed out waiting for the plan lock after {0:?}")]
    LockTimeout(std::time::Duration),

    #[error("plan has a dependency cycle among: {0:?}")]
    Cycle(Vec<String>),

    #[error("unknown subtask id: {0}")]
    SubtaskNotFound(String),

    #[error(transparent)]
    Stream(#[from] agnt_stream::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
