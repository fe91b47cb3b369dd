//! The plan data model: a JSON document
//! keyed with camelCase property names, held as the shared source of truth
//! for every worker agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Research,
    Testing,
    Review,
    Documentation,
    #[default]
    #[serde(other)]
    Implementation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Complex,
    VeryComplex,
    #[default]
    #[serde(other)]
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub status: SubtaskStatus,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub use_thinking_model: bool,
    #[serde(default)]
    pub assigned_agent: Option<String>,
}

impl Subtask {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            task_type: TaskType::default(),
            complexity: Complexity::default(),
            status: SubtaskStatus::default(),
            dependencies: Vec::new(),
            retry_count: 0,
            use_thinking_model: false,
            assigned_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    pub task_id: String,
    pub original_request: String,
    pub summary: String,
    pub subtasks: Vec<Subtask>,
    pub recommended_agent_count: u32,
    pub parallelization_strategy: String,
    pub risk_assessment: String,
    pub created_at: DateTime<Utc>,
}

impl TaskPlan {
    /// A single-subtask plan, used when decomposition fails or produces
    /// unparseable JSON.
    pub fn degenerate(original_request: impl Into<String>) -> Self {
        let original_request = original_request.into();
        Self {
            task_id: format!("task-{}", uuid::Uuid::new_v4()),
            summary: original_request.clone(),
            subtasks: vec![Subtask::new(format!("subtask-{}", uuid::Uuid::new_v4()), original_request.clone())],
            original_request,
            recommended_agent_count: 1,
            parallelization_strategy: "sequential".to_string(),
            risk_assessment: "unknown".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_mut(&mut self, id: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    pub fn is_complete(&self) -> bool {
        self.subtasks
            .iter()
            .all(|s| matches!(s.status, SubtaskStatus::Completed | SubtaskStatus::Skipped))
    }

    /// Any subtask left `in_progress` is assumed to be from an interrupted
    /// run: reset to pending with its agent assignment cleared. Retry count
    /// is NOT incremented for interruptions.
    pub fn reset_interrupted(&mut self) {
        for subtask in &mut self.subtasks {
            if subtask.status == SubtaskStatus::InProgress {
                subtask.status = SubtaskStatus::Pending;
                subtask.assigned_agent = None;
            }
        }
    }
}
