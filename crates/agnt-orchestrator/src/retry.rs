//! Retry escalation: repeated failure on a subtask upgrades
//! it to a stronger model before the next attempt.

use crate::plan::{Complexity, Subtask, SubtaskStatus};

/// Bumps the retry count and decides whether the next attempt should use
/// the thinking model: after one failure of a complex task, or after the
/// second retry of any task.
pub fn escalate_for_retry(subtask: &mut Subtask) {
    subtask.retry_count += 1;
    let complex_first_retry = subtask.retry_count == 1
        && matches!(subtask.complexity, Complexity::Complex | Complexity::VeryComplex);
    if complex_first_retry || subtask.retry_count >= 2 {
        subtask.use_thinking_model = true;
    }
}

/// Resets a failed subtask back to pending for another attempt, escalating
/// as `escalate_for_retry` describes.
pub fn reset_for_retry(subtask: &mut Subtask) {
    subtask.status = SubtaskStatus::Pending;
    subtask.assigned_agent = None;
    escalate_for_retry(subtask);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_task_does_not_escalate_on_first_retry() {
        let mut subtask = Subtask::new("a", "do a");
        subtask.complexity = Complexity::Simple;
        escalate_for_retry(&mut subtask);
        assert_eq!(subtask.retry_count, 1);
        assert!(!subtask.use_thinking_model);
    }

    #[test]
    fn complex_task_escalates_on_first_retry() {
        let mut subtask = Subtask::new("a", "do a");
        subtask.complexity = Complexity::Complex;
        escalate_for_retry(&mut subtask);
        assert_eq!(subtask.retry_count, 1);
        assert!(subtask.use_thinking_model);
    }

    #[test]
    fn any_task_escalates_on_second_retry() {
        let mut subtask = Subtask::new("a", "do a");
        subtask.complexity = Complexity::Simple;
        escalate_for_retry(&mut subtask);
        escalate_for_retry(&mut subtask);
        assert_eq!(subtask.retry_count, 2);
        assert!(subtask.use_thinking_model);
    }

    #[test]
    fn reset_for_retry_clears_assignment_and_reopens_the_subtask() {
        let mut subtask = Subtask::new("a", "do a");
        subtask.status = SubtaskStatus::Failed;
        subtask.assigned_agent = Some("agent-1".to_string());
        reset_for_retry(&mut subtask);
        assert_eq!(subtask.status, SubtaskStatus::Pending);
        assert!(subtask.assigned_agent.is_none());
        assert_eq!(subtask.retry_count, 1);
    }
}
