//! `diabecare analyze` — One-shot health report. The history file is not touched.

use diabecare_agent::{HealthData, SugarReading};
use diabecare_config::AppConfig;

pub async fn run(
    config: &AppConfig,
    sugar: Option<String>,
    medication: Option<String>,
    activity: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.require_api_key()?;
    let orchestrator = diabecare_gateway::build_orchestrator(config)?;

    let data = HealthData {
        sugar,
        medication,
        activity,
    };
    if SugarReading::classify(&data).requires_urgent_action() {
        eprintln!("  ⚠️  Reading {} mg/dL is outside the safe range.", data.sugar());
    }

    eprint!("  Analyzing...");
    let report = orchestrator.analyze(&data).await;
    eprint!("\r              \r");
    println!("{report}");

    Ok(())
}
