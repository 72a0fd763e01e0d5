use anyhow::Context;

use bomledger_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bomledger_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = bomledger_api::app::services::build_services(&config)
        .await
        .context("failed to initialise stores")?;
    let app = bomledger_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        shipment_policy = config.shipment_policy.as_str(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
