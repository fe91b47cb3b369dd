//! Unified-diff parsing and application: per-file
//! all-or-nothing patch application with fuzzy hunk-matching and specific
//! reject diagnostics.

mod apply;
mod error;
mod parse;
mod reject;

pub use apply::{apply, ApplyReport};
pub use error::{Error, Result};
pub use parse::{parse_patch, FilePatch, Hunk, HunkLine};
pub use reject::Reject;
