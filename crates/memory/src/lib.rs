//! Chat history storage implementations for DiabeCare.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileMemory;
pub use in_memory::InMemoryStore;
