//! Noesis gateway — HTTP surface and CLI wiring for the reasoning hub.

pub mod server;

pub use server::{router, serve};
