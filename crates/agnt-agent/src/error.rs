#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Stream(#[from] agnt_stream::Error),

    #[error(transparent)]
    Context(#[from] agnt_context::Error),

    #[error(transparent)]
    Permission(#[from] agnt_permissions::Error),

    #[error(transparent)]
    Tool(#[from] agnt_tools::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
