//! External-collaborator boundary for Noesis.
//!
//! Two collaborators live behind traits here: text generation and
//! embedding/similarity search. Both are constructed once at process start
//! and passed explicitly to whoever needs them — no process-wide caches.
//! Generation never raises: every call resolves to a [`Generated`] outcome,
//! degraded calls carrying a fixed fallback string.

pub mod embedding;
pub mod openai;
pub mod provider;

pub use embedding::{EmbeddingProvider, OpenAiEmbeddings, SimilarityIndex, UnavailableIndex};
pub use openai::OpenAiProvider;
pub use provider::{DisabledGeneration, Generated, GenerationProvider, TextStream, FALLBACK_TEXT};
