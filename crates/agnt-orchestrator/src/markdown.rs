//! Renders a plan as a human-readable markdown mirror. This
//! output is informational only: the orchestrator never reads it back.

use crate::plan::{SubtaskStatus, TaskPlan};
use crate::ready;

fn status_icon(status: SubtaskStatus) -> &'static str {
    match status {
        SubtaskStatus::Pending => "⏳",
        SubtaskStatus::InProgress => "🔄",
        SubtaskStatus::Completed => "✅",
        SubtaskStatus::Failed => "❌",
        SubtaskStatus::Skipped => "⏭️",
    }
}

pub fn render_markdown(plan: &TaskPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", plan.summary));
    out.push_str(&format!("Original request: {}\n\n", plan.original_request));
    out.push_str(&format!("Recommended agents: {}\n", plan.recommended_agent_count));
    out.push_str(&format!("Strategy: {}\n", plan.parallelization_strategy));
    out.push_str(&format!("Risk: {}\n\n", plan.risk_assessment));

    match ready::parallel_groups(plan) {
        Ok(phases) => {
            for (index, phase) in phases.iter().enumerate() {
                out.push_str(&format!("## Phase {}\n\n", index + 1));
                for id in phase {
                    if let Some(subtask) = plan.subtask(id) {
                        out.push_str(&format!("- {} **{}** — {}\n", status_icon(subtask.status), subtask.id, subtask.description));
                    }
                }
                out.push('\n');
            }
        }
        Err(_) => {
            out.push_str("## Subtasks (dependency cycle detected, showing flat list)\n\n");
            for subtask in &plan.subtasks {
                out.push_str(&format!("- {} **{}** — {}\n", status_icon(subtask.status), subtask.id, subtask.description));
            }
        }
    }

    out
}
