//! Cognitive agents for Noesis: the uniform agent seam, the explicit
//! startup-populated registry, the built-in agent set, and the goal/task
//! registries agents read and feed.

pub mod agent;
pub mod builtin;
pub mod goals;
pub mod registry;
pub mod tasks;

pub use agent::{CognitiveAgent, GOAL_TRACKER_SERVICE, TASK_SCHEDULER_SERVICE};
pub use builtin::{GoalKeeper, MemoryRetriever, Reasoner, Scheduler};
pub use goals::{Goal, GoalStatus, GoalTracker, GoalUpdate};
pub use registry::AgentRegistry;
pub use tasks::{ScheduledTask, TaskScheduler};
