//! Conversation orchestration for DiabeCare.
//!
//! - [`prompt`] builds the fixed system instruction and the structured
//!   health-report request.
//! - [`orchestrator`] runs a chat exchange against the bounded history
//!   store, or a one-shot analysis that bypasses it.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{ChatOrchestrator, EMPTY_MESSAGE_REPLY, context_window};
pub use prompt::{HealthData, SugarReading, analysis_messages, analysis_prompt, system_prompt};
