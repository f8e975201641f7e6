pub mod analyze;
pub mod chat;
pub mod doctor;
pub mod memory;
pub mod serve;
