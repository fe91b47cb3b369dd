//! Context-window management: token tracking, the
//! summarize/truncate trigger policy, and per-tool tool-result compression.

mod compress;
mod error;
mod manager;
mod policy;
mod summarize;
mod tracker;
mod truncate;

pub use compress::compress_tool_result;
pub use error::{Error, Result};
pub use manager::manage_context;
pub use policy::{SUMMARIZE_THRESHOLD, TRUNCATE_THRESHOLD};
pub use summarize::{build_transcript, summarize_messages, Summarizer};
pub use tracker::TokenTracker;
pub use truncate::{truncate_messages, DEFAULT_KEEP};
