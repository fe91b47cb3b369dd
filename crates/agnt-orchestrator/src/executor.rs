//! Parallel execution over the plan: repeatedly pick the
//! current ready set bounded by the recommended agent count, run it
//! concurrently, and fold the outcomes back into the plan.

use std::future::Future;

use futures::future::join_all;

use crate::error::Result;
use crate::markdown::render_markdown;
use crate::plan::{Subtask, SubtaskStatus, TaskPlan};
use crate::ready::ready_subtask_ids;
use crate::retry::reset_for_retry;
use crate::store::PlanStore;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub enum SubtaskOutcome {
    Completed,
    Failed(String),
    Skipped(String),
}

pub trait SubtaskRunner: Send + Sync {
    fn run(&self, subtask: &Subtask) -> impl Future<Output = SubtaskOutcome> + Send;
}

/// Drives the plan to completion (or to a stuck state with no ready
/// subtasks) against `store`, dispatching each ready batch to `runner`.
pub async fn run_plan<R: SubtaskRunner>(store: &PlanStore, runner: &R, relaxed: bool, max_retries: u32) -> Result<TaskPlan> {
    let mut plan = store.load_resetting_interrupted().await?;

    loop {
        if plan.is_complete() {
            return Ok(plan);
        }

        let ready_ids = ready_subtask_ids(&plan, relaxed);
        if ready_ids.is_empty() {
            return Ok(plan);
        }

        let batch_size = plan.recommended_agent_count.max(1) as usize;
        let batch: Vec<String> = ready_ids.into_iter().take(batch_size).collect();

        let claimed = store
            .update(|plan| {
                for id in &batch {
                    if let Some(subtask) = plan.subtask_mut(id) {
                        subtask.status = SubtaskStatus::InProgress;
                    }
                }
            })
            .await?;

        let subtasks: Vec<Subtask> = batch
            .iter()
            .filter_map(|id| claimed.subtask(id).cloned())
            .collect();
        let outcomes = join_all(subtasks.iter().map(|subtask| runner.run(subtask))).await;

        let settled = store
            .update(|plan| {
                for (subtask, outcome) in subtasks.iter().zip(outcomes.iter()) {
                    let Some(target) = plan.subtask_mut(&subtask.id) else { continue };
                    match outcome {
                        SubtaskOutcome::Completed => target.status = SubtaskStatus::Completed,
                        SubtaskOutcome::Skipped(_) => target.status = SubtaskStatus::Skipped,
                        SubtaskOutcome::Failed(reason) => {
                            if target.retry_count >= max_retries {
                                target.status = SubtaskStatus::Failed;
                                tracing::warn!(subtask = %target.id, %reason, "subtask exhausted its retries");
                            } else {
                                reset_for_retry(target);
                            }
                        }
                    }
                }
            })
            .await?;

        store.write_markdown_mirror(&render_markdown(&settled));
        plan = settled;
    }
}
