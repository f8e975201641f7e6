//! `diabecare chat` — One chat exchange against the configured history file.

use diabecare_config::AppConfig;

pub async fn run(config: &AppConfig, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    config.require_api_key()?;
    let orchestrator = diabecare_gateway::build_orchestrator(config)?;

    eprint!("  Thinking...");
    let reply = orchestrator.chat(message).await;
    eprint!("\r              \r");
    println!("{reply}");

    Ok(())
}
