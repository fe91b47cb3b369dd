pub mod decoder;
pub mod error;
pub mod http;
mod types;

pub use decoder::{decode, DecodeCallbacks, FinishReason, TurnResult};
pub use error::Error;
pub use http::{stream_once, ProviderConfig};
