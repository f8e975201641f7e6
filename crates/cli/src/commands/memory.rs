//! `diabecare memory` — Inspect or clear the chat history file.

use diabecare_config::AppConfig;
use diabecare_core::memory::{MemoryStore, RecallStatus};
use diabecare_memory::FileMemory;

fn store(config: &AppConfig) -> FileMemory {
    FileMemory::new(&config.memory.path, config.memory.max_turns)
}

pub async fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let memory = store(config);
    let recall = memory.load().await;

    println!("🧠 Chat History");
    println!("===============");
    println!("  File:       {}", memory.path().display());
    println!("  Max turns:  {}", memory.max_turns());

    match &recall.status {
        RecallStatus::Missing => {
            println!("  (no history yet)");
            return Ok(());
        }
        RecallStatus::Corrupt(reason) | RecallStatus::Unreadable(reason) => {
            println!("  ⚠️  History file could not be read: {reason}");
            return Ok(());
        }
        RecallStatus::Loaded => {}
    }

    println!("  Turns:      {}", recall.turns.len());
    println!();
    for (i, turn) in recall.turns.iter().enumerate() {
        println!("  {:>2}. [{}] {}", i + 1, turn.role, turn.content);
    }

    Ok(())
}

pub async fn clear(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let memory = store(config);
    memory.clear().await?;
    println!("🗑️  Memory cleared successfully!");
    Ok(())
}
