//! The built-in agent set. Each agent receives its collaborators at
//! construction; nothing here reaches for globals.

mod goal_keeper;
mod memory_retriever;
mod reasoner;
mod scheduler;

pub use goal_keeper::GoalKeeper;
pub use memory_retriever::MemoryRetriever;
pub use reasoner::Reasoner;
pub use scheduler::Scheduler;
