//! A read-modify-write guard for the plan file: one
//! in-process semaphore permit layered over an advisory cross-process file
//! lock, so a single machine can run many orchestrator instances against
//! the same plan without corrupting it.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use fs2::FileExt;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::{Error, Result};

const LOCK_DEADLINE: Duration = Duration::from_secs(30);
const BACKOFF_START: Duration = Duration::from_millis(50);
const BACKOFF_CAP: Duration = Duration::from_millis(500);

/// Guards the plan file at `path` against concurrent read-modify-write
/// cycles, both within this process and across processes on the same host.
pub struct PlanLock {
    path: PathBuf,
    in_process: Arc<Semaphore>,
}

impl PlanLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), in_process: Arc::new(Semaphore::new(1)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_sibling(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquires the in-process permit, then the cross-process advisory lock,
    /// retrying with exponential backoff until `LOCK_DEADLINE` elapses.
    pub async fn acquire(&self) -> Result<PlanLockGuard<'_>> {
        let permit = self
            .in_process
            .acquire()
            .await
            .expect("semaphore is never closed");

        let lock_path = self.lock_sibling();
        let deadline = Instant::now() + LOCK_DEADLINE;
        let mut backoff = BACKOFF_START;

        let file = loop {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path)?;

            match file.try_lock_exclusive() {
                Ok(()) => break file,
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_CAP);
                }
                Err(_) => return Err(Error::LockTimeout(LOCK_DEADLINE)),
            }
        };

        let contents = format!("{}:{}", std::process::id(), Utc::now().to_rfc3339());
        let _ = std::fs::write(&lock_path, contents);

        // Delete-on-close: unlink now, the held fd keeps the lock alive
        // until it is dropped (Unix semantics; harmless no-op elsewhere
        // since the next acquirer simply recreates the sibling).
        let _ = std::fs::remove_file(&lock_path);

        Ok(PlanLockGuard { _permit: permit, file })
    }
}

pub struct PlanLockGuard<'a> {
    _permit: SemaphorePermit<'a>,
    file: std::fs::File,
}

impl Drop for PlanLockGuard<'_> {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
