//! The agent control loop: response classification, inline
//! tool-call recovery, tool dispatch under the permission gate, context-window
//! management, and stall detection.

mod classify;
mod control;
mod error;
mod inline;
mod observer;
mod stall;
mod summarizer;

pub use classify::{detect_action_signal, has_completion_signal, ActionSignal};
pub use control::{complete_with_tools, LoopConfig};
pub use error::{Error, Result};
pub use inline::{recover_inline_calls, InlineCall};
pub use observer::{LoopObserver, NullObserver};
pub use stall::{is_failure_result, StallConfig, StallDetector, StallOutcome};
pub use summarizer::StreamSummarizer;
