//! The Noesis hub: two-round agent dispatch, deterministic thought fusion,
//! the cycle runner, and the meta-learning reflection supervisor.

pub mod cycle;
pub mod dispatch;
pub mod fusion;
pub mod reflect;

pub use cycle::{CycleOutcome, Hub};
pub use dispatch::Dispatcher;
pub use fusion::{detect_contradictions, fuse, FusionOutcome};
pub use reflect::{Reflection, ReflectionSupervisor};
