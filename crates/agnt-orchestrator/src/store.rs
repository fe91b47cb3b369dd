//! Crash-safe read-modify-write access to the plan file: read, apply a
//! mutation, write to a temp sibling, then atomically rename over the
//! original.
//!
//! The plan file may be shared by several live processes working the same
//! plan concurrently, so `read`/`update` never touch `in_progress` subtasks
//! on their own — doing so would reclaim work another process still owns.
//! Only [`PlanStore::load_resetting_interrupted`], meant to be called once
//! per process at startup, reclaims subtasks left `in_progress` by a run
//! that crashed before this process existed.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::lock::PlanLock;
use crate::plan::TaskPlan;

pub struct PlanStore {
    path: PathBuf,
    lock: PlanLock,
}

impl PlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self { lock: PlanLock::new(&path), path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_from_disk(&self) -> Result<TaskPlan> {
        let bytes = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_to_disk(&self, plan: &TaskPlan) -> Result<()> {
        let tmp_path = {
            let mut name = self.path.as_os_str().to_owned();
            name.push(format!(".tmp.{}", std::process::id()));
            PathBuf::from(name)
        };
        let json = serde_json::to_vec_pretty(plan)?;
        {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Creates the plan file if it doesn't exist yet.
    pub async fn init(&self, plan: &TaskPlan) -> Result<()> {
        let _guard = self.lock.acquire().await?;
        if self.path.exists() {
            return Ok(());
        }
        self.write_to_disk(plan)
    }

    /// Reads the current plan as-is. Does not touch `in_progress` subtasks —
    /// another process may legitimately own one right now.
    pub async fn read(&self) -> Result<TaskPlan> {
        let _guard = self.lock.acquire().await?;
        self.read_from_disk()
    }

    /// Full read-modify-write cycle under lock: load, apply `f`, persist
    /// atomically. Does not reset `in_progress` subtasks.
    pub async fn update<F>(&self, f: F) -> Result<TaskPlan>
    where
        F: FnOnce(&mut TaskPlan),
    {
        let _guard = self.lock.acquire().await?;
        let mut plan = self.read_from_disk()?;
        f(&mut plan);
        self.write_to_disk(&plan)?;
        Ok(plan)
    }

    /// Reads the plan and resets any subtask left `in_progress` by a run
    /// that crashed before this process started, persisting the reset.
    /// Call once per process, before entering the run loop — never from
    /// inside the steady-state `read`/`update` cycle, where an
    /// `in_progress` subtask may belong to another live process.
    pub async fn load_resetting_interrupted(&self) -> Result<TaskPlan> {
        let _guard = self.lock.acquire().await?;
        let mut plan = self.read_from_disk()?;
        plan.reset_interrupted();
        self.write_to_disk(&plan)?;
        Ok(plan)
    }

    /// Best-effort human-readable mirror. Informational only, never read
    /// back by the orchestrator.
    pub fn write_markdown_mirror(&self, markdown: &str) {
        let md_path = self.path.with_extension("md");
        if let Err(error) = std::fs::write(&md_path, markdown) {
            tracing::warn!(?error, path = %md_path.display(), "failed to write plan markdown mirror");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SubtaskStatus;

    #[tokio::test]
    async fn init_then_read_round_trips_the_plan() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("current-plan.json"));
        let plan = TaskPlan::degenerate("do the thing");
        store.init(&plan).await.unwrap();

        let reloaded = store.read().await.unwrap();
        assert_eq!(reloaded.task_id, plan.task_id);
    }

    #[tokio::test]
    async fn update_persists_mutations_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("current-plan.json"));
        let plan = TaskPlan::degenerate("do the thing");
        let subtask_id = plan.subtasks[0].id.clone();
        store.init(&plan).await.unwrap();

        store
            .update(|plan| {
                plan.subtask_mut(&subtask_id).unwrap().status = SubtaskStatus::Completed;
            })
            .await
            .unwrap();

        let reloaded = store.read().await.unwrap();
        assert_eq!(reloaded.subtask(&subtask_id).unwrap().status, SubtaskStatus::Completed);
    }

    #[tokio::test]
    async fn load_resetting_interrupted_resets_in_progress_subtasks_to_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("current-plan.json"));
        let mut plan = TaskPlan::degenerate("do the thing");
        plan.subtasks[0].status = SubtaskStatus::InProgress;
        plan.subtasks[0].assigned_agent = Some("agent-1".to_string());
        store.init(&plan).await.unwrap();

        let reloaded = store.load_resetting_interrupted().await.unwrap();
        assert_eq!(reloaded.subtasks[0].status, SubtaskStatus::Pending);
        assert!(reloaded.subtasks[0].assigned_agent.is_none());

        // The reset is persisted, not just returned.
        let reread = store.read().await.unwrap();
        assert_eq!(reread.subtasks[0].status, SubtaskStatus::Pending);
    }

    #[tokio::test]
    async fn read_does_not_reset_in_progress_subtasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("current-plan.json"));
        let mut plan = TaskPlan::degenerate("do the thing");
        plan.subtasks[0].status = SubtaskStatus::InProgress;
        plan.subtasks[0].assigned_agent = Some("agent-1".to_string());
        store.init(&plan).await.unwrap();

        let reloaded = store.read().await.unwrap();
        assert_eq!(reloaded.subtasks[0].status, SubtaskStatus::InProgress);
        assert_eq!(reloaded.subtasks[0].assigned_agent.as_deref(), Some("agent-1"));
    }

    #[tokio::test]
    async fn update_does_not_reset_other_in_progress_subtasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("current-plan.json"));
        let mut plan = TaskPlan::degenerate("do the thing");
        let mut second = crate::plan::Subtask::new("second", "second step");
        second.status = SubtaskStatus::InProgress;
        second.assigned_agent = Some("agent-2".to_string());
        plan.subtasks.push(second);
        store.init(&plan).await.unwrap();

        let first_id = plan.subtasks[0].id.clone();
        store
            .update(|plan| {
                plan.subtask_mut(&first_id).unwrap().status = SubtaskStatus::Completed;
            })
            .await
            .unwrap();

        let reloaded = store.read().await.unwrap();
        assert_eq!(reloaded.subtasks[1].status, SubtaskStatus::InProgress);
        assert_eq!(reloaded.subtasks[1].assigned_agent.as_deref(), Some("agent-2"));
    }
}
