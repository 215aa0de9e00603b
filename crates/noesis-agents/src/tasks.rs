//! Task scheduler — relevance-weighted short-horizon task registry.
//!
//! Tasks are keyed by their normalized text. Re-scheduling an existing task
//! boosts its relevance instead of duplicating it, and relevance decays with
//! wall-clock time so stale tasks fall below the dispatch threshold on their
//! own.

use chrono::{DateTime, Utc};
use noesis_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: String,
    pub relevance: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

pub struct TaskScheduler {
    path: PathBuf,
    tasks: Mutex<HashMap<String, ScheduledTask>>,
}

impl TaskScheduler {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tasks = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<ScheduledTask>>(&content) {
                Ok(list) => {
                    debug!("Loaded {} tasks from {}", list.len(), path.display());
                    list.into_iter().map(|t| (t.task.clone(), t)).collect()
                }
                Err(e) => {
                    warn!("Task store unparsable ({}), starting empty", e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            path,
            tasks: Mutex::new(tasks),
        })
    }

    /// Register a task. Scheduling a task that already exists boosts the
    /// stored relevance by half the incoming score, capped at 1.0, and
    /// refreshes its update time.
    pub fn schedule(&self, task: impl Into<String>, relevance: f64) {
        let task = task.into();
        let key = task.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let relevance = relevance.clamp(0.0, 1.0);
        let now = Utc::now();

        let mut tasks = self.tasks.lock().expect("task lock poisoned");
        match tasks.get_mut(&key) {
            Some(existing) => {
                existing.relevance = (existing.relevance + relevance * 0.5).min(1.0);
                existing.last_updated = now;
            }
            None => {
                tasks.insert(
                    key,
                    ScheduledTask {
                        task,
                        relevance,
                        created_at: now,
                        last_updated: now,
                    },
                );
            }
        }
        self.persist(&tasks);
    }

    /// Decay every task's relevance by `rate` per hour since its last
    /// update, floored at 0. Tasks are never removed — they just sink.
    pub fn decay(&self, rate: f64) {
        let now = Utc::now();
        let mut tasks = self.tasks.lock().expect("task lock poisoned");
        for task in tasks.values_mut() {
            let hours = (now - task.last_updated).num_seconds() as f64 / 3600.0;
            if hours <= 0.0 {
                continue;
            }
            task.relevance = (task.relevance - rate * hours).max(0.0);
            task.last_updated = now;
        }
        self.persist(&tasks);
    }

    /// Tasks at or above `threshold`, most relevant first.
    pub fn due_above(&self, threshold: f64) -> Vec<ScheduledTask> {
        let tasks = self.tasks.lock().expect("task lock poisoned");
        let mut due: Vec<ScheduledTask> = tasks
            .values()
            .filter(|t| t.relevance >= threshold)
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        due
    }

    pub fn all(&self) -> Vec<ScheduledTask> {
        self.due_above(0.0)
    }

    fn persist(&self, tasks: &HashMap<String, ScheduledTask>) {
        let mut list: Vec<&ScheduledTask> = tasks.values().collect();
        list.sort_by(|a, b| a.task.cmp(&b.task));
        let json = match serde_json::to_string_pretty(&list) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize task store: {}", e);
                return;
            }
        };
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, &json) {
            error!("Failed to write task store tmp: {}", e);
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            error!("Failed to rename task store: {}", e);
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (tempfile::TempDir, TaskScheduler) {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = TaskScheduler::open(dir.path().join("tasks.json")).unwrap();
        (dir, scheduler)
    }

    #[test]
    fn schedule_and_list() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("write report", 0.6);
        scheduler.schedule("file taxes", 0.9);
        let due = scheduler.due_above(0.5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].task, "file taxes");
    }

    #[test]
    fn duplicate_boosts_instead_of_duplicating() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("write report", 0.6);
        scheduler.schedule("Write Report", 0.8);
        let all = scheduler.all();
        assert_eq!(all.len(), 1);
        // 0.6 + 0.8 * 0.5
        assert!((all[0].relevance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn boost_caps_at_one() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("urgent", 0.9);
        scheduler.schedule("urgent", 0.9);
        assert_eq!(scheduler.all()[0].relevance, 1.0);
    }

    #[test]
    fn empty_task_is_ignored() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("   ", 0.9);
        assert!(scheduler.all().is_empty());
    }

    #[test]
    fn decay_floors_at_zero() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("fading", 0.3);
        {
            let mut tasks = scheduler.tasks.lock().unwrap();
            for t in tasks.values_mut() {
                t.last_updated = Utc::now() - chrono::Duration::hours(10);
            }
        }
        scheduler.decay(0.1);
        assert_eq!(scheduler.all()[0].relevance, 0.0);
    }

    #[test]
    fn decay_is_proportional_to_elapsed_hours() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("slipping", 0.8);
        {
            let mut tasks = scheduler.tasks.lock().unwrap();
            for t in tasks.values_mut() {
                t.last_updated = Utc::now() - chrono::Duration::hours(2);
            }
        }
        scheduler.decay(0.1);
        let r = scheduler.all()[0].relevance;
        assert!((r - 0.6).abs() < 0.01, "expected ~0.6, got {}", r);
    }

    #[test]
    fn threshold_excludes_low_relevance() {
        let (_dir, scheduler) = scheduler();
        scheduler.schedule("minor", 0.2);
        scheduler.schedule("major", 0.8);
        let due = scheduler.due_above(0.5);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].task, "major");
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        {
            let scheduler = TaskScheduler::open(&path).unwrap();
            scheduler.schedule("persist me", 0.7);
        }
        let scheduler = TaskScheduler::open(&path).unwrap();
        let all = scheduler.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].task, "persist me");
        assert!((all[0].relevance - 0.7).abs() < 1e-9);
    }
}
