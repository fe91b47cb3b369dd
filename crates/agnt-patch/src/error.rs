#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("patch parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
