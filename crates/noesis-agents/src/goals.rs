//! Goal tracker — authoritative persisted registry of long-term goals.
//!
//! State is rewritten whole-file (tmp + rename) on every mutation and
//! reloaded at construction; the in-memory map is never a cache of
//! something else. Single-writer per process.

use chrono::{DateTime, Duration, Utc};
use noesis_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub description: String,
    pub priority: f64,
    pub deadline: Option<DateTime<Utc>>,
    pub status: GoalStatus,
    pub subgoals: Vec<String>,
}

/// Fields an `update` call may change. `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct GoalUpdate {
    pub description: Option<String>,
    pub priority: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<GoalStatus>,
    pub subgoals: Option<Vec<String>>,
}

pub struct GoalTracker {
    path: PathBuf,
    goals: Mutex<HashMap<Uuid, Goal>>,
}

impl GoalTracker {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let goals = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<Goal>>(&content) {
                Ok(list) => {
                    debug!("Loaded {} goals from {}", list.len(), path.display());
                    list.into_iter().map(|g| (g.id, g)).collect()
                }
                Err(e) => {
                    warn!("Goal store unparsable ({}), starting empty", e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            path,
            goals: Mutex::new(goals),
        })
    }

    pub fn add(
        &self,
        description: impl Into<String>,
        priority: f64,
        deadline: Option<DateTime<Utc>>,
    ) -> Uuid {
        let goal = Goal {
            id: Uuid::new_v4(),
            description: description.into(),
            priority: priority.clamp(0.0, 1.0),
            deadline,
            status: GoalStatus::Active,
            subgoals: Vec::new(),
        };
        let id = goal.id;
        let mut goals = self.goals.lock().expect("goal lock poisoned");
        goals.insert(id, goal);
        self.persist(&goals);
        id
    }

    pub fn update(&self, id: Uuid, update: GoalUpdate) -> bool {
        let mut goals = self.goals.lock().expect("goal lock poisoned");
        let Some(goal) = goals.get_mut(&id) else {
            return false;
        };
        if let Some(description) = update.description {
            goal.description = description;
        }
        if let Some(priority) = update.priority {
            goal.priority = priority.clamp(0.0, 1.0);
        }
        if let Some(deadline) = update.deadline {
            goal.deadline = Some(deadline);
        }
        if let Some(status) = update.status {
            goal.status = status;
        }
        if let Some(subgoals) = update.subgoals {
            goal.subgoals = subgoals;
        }
        self.persist(&goals);
        true
    }

    /// Archive is the only way a goal leaves the active set — goals are
    /// never auto-deleted.
    pub fn archive(&self, id: Uuid) -> bool {
        let mut goals = self.goals.lock().expect("goal lock poisoned");
        match goals.get_mut(&id) {
            Some(goal) if goal.status == GoalStatus::Active => {
                goal.status = GoalStatus::Completed;
                self.persist(&goals);
                true
            }
            _ => false,
        }
    }

    /// Active goals, highest priority first.
    pub fn active(&self) -> Vec<Goal> {
        let goals = self.goals.lock().expect("goal lock poisoned");
        let mut active: Vec<Goal> = goals
            .values()
            .filter(|g| g.status == GoalStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        active
    }

    /// Deadline-driven priority boost: a passed deadline gains +0.2, a
    /// deadline within 3 days gains +0.1; priority clamps to [0, 1].
    /// Completed goals are untouched.
    pub fn reprioritize(&self) {
        let now = Utc::now();
        let mut goals = self.goals.lock().expect("goal lock poisoned");
        for goal in goals.values_mut() {
            if goal.status != GoalStatus::Active {
                continue;
            }
            let Some(deadline) = goal.deadline else {
                continue;
            };
            let days_left = (deadline - now).num_days();
            if deadline <= now {
                goal.priority = (goal.priority + 0.2).min(1.0);
            } else if days_left <= 3 {
                goal.priority = (goal.priority + 0.1).min(1.0);
            }
        }
        self.persist(&goals);
    }

    fn persist(&self, goals: &HashMap<Uuid, Goal>) {
        let mut list: Vec<&Goal> = goals.values().collect();
        list.sort_by_key(|g| g.id);
        let json = match serde_json::to_string_pretty(&list) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize goal store: {}", e);
                return;
            }
        };
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, &json) {
            error!("Failed to write goal store tmp: {}", e);
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            error!("Failed to rename goal store: {}", e);
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.path
    }
}

/// Convenience for reprioritization tests and deadline math.
pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}
