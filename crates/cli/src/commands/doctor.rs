//! `diabecare doctor` — Diagnose configuration.
//!
//! The provider is only contacted when `--check-provider` is given.

use std::path::Path;

use diabecare_config::{AppConfig, RECOMMENDED_MODEL};
use diabecare_core::memory::{MemoryStore, RecallStatus};
use diabecare_core::provider::Provider;
use diabecare_memory::FileMemory;

pub async fn run(
    config_path: Option<&Path>,
    check_provider: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 DiabeCare Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ℹ️  No config file at {} — using defaults and environment", path.display());
    }

    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running other checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ GROQ_API_KEY is not set — create .env with your key");
        issues += 1;
    }

    println!("  ✅ Provider: {} ({})", config.provider.name, config.provider.base_url);
    if config.model == RECOMMENDED_MODEL {
        println!("  ✅ Model: {}", config.model);
    } else {
        println!(
            "  ℹ️  Model: {} (recommended: {RECOMMENDED_MODEL})",
            config.model
        );
    }
    println!("  ✅ Request timeout: {}s", config.request_timeout_secs);

    if check_provider {
        if config.has_api_key() {
            let provider = diabecare_providers::build_from_config(&config)?;
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider reachable"),
                Ok(false) => {
                    println!("  ❌ Provider rejected the request, check the API key");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider unreachable: {}", e.raw_message());
                    issues += 1;
                }
            }
        } else {
            println!("  ℹ️  Skipping provider check, no API key");
        }
    }

    let memory = FileMemory::new(&config.memory.path, config.memory.max_turns);
    let recall = memory.load().await;
    match &recall.status {
        RecallStatus::Loaded => println!(
            "  ✅ History file: {} ({}/{} turns)",
            memory.path().display(),
            recall.turns.len(),
            config.memory.max_turns
        ),
        RecallStatus::Missing => println!(
            "  ✅ History file: {} (not created yet)",
            memory.path().display()
        ),
        RecallStatus::Corrupt(reason) | RecallStatus::Unreadable(reason) => {
            println!("  ⚠️  History file unusable, it will be replaced: {reason}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
