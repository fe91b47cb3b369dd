//! Task decomposition and crash-safe parallel orchestration: a JSON plan file guarded by layered in-process and cross-process
//! locks, ready-set computation, retry escalation, and a bounded-concurrency
//! executor.

mod decompose;
mod error;
mod executor;
mod lock;
mod markdown;
mod plan;
mod ready;
mod retry;
mod store;

pub use decompose::{decompose, extract_json, DecompositionModel, StreamDecompositionModel};
pub use error::{Error, Result};
pub use executor::{run_plan, SubtaskOutcome, SubtaskRunner, DEFAULT_MAX_RETRIES};
pub use lock::{PlanLock, PlanLockGuard};
pub use markdown::render_markdown;
pub use plan::{Complexity, Subtask, SubtaskStatus, TaskPlan, TaskType};
pub use ready::{parallel_groups, ready_subtask_ids};
pub use retry::{escalate_for_retry, reset_for_retry};
pub use store::PlanStore;
