//! # DiabeCare Core
//!
//! Domain types, traits, and error definitions for the DiabeCare assistant.
//! This crate has **no framework dependencies**: it defines the domain model
//! that the provider, memory, agent and gateway crates implement against.
//!
//! ## Seams
//!
//! - [`Provider`] abstracts the hosted completion service, so the
//!   orchestrator can be driven by a scripted provider in tests.
//! - [`MemoryStore`] abstracts the recent-history file, with a file-backed
//!   and an in-memory implementation in `diabecare-memory`.

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{MemoryError, ProviderError};
pub use memory::{MemoryStore, Recall, RecallStatus};
pub use message::{ChatTurn, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
