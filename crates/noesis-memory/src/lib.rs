//! Long-term memory for Noesis: an append-only structured store with
//! content-hash deduplication, a human-readable narrative log, a recall-event
//! audit trail, and the recall service wrapping the similarity index.

pub mod index;
pub mod record;
pub mod recall;
pub mod store;

pub use index::StoreIndex;
pub use recall::RecallService;
pub use record::{content_hash, MemoryRecord, ProfileReflection, SummaryRecord};
pub use store::{LoadScope, MemoryStore, RecallEvent};
