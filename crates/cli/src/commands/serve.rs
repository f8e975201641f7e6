//! `diabecare serve` — Start the HTTP API server.

use diabecare_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🚀 Starting DiabeCare API with model: {}", config.model);
    println!("📍 API will be available at: http://{}", config.bind_addr());

    diabecare_gateway::start(config).await?;

    Ok(())
}
