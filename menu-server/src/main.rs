use menu_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env and logging first so config warnings are visible
    let _log_guard = setup_environment();

    tracing::info!("Lounge menu server starting...");

    let config = Config::from_env();
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let state = ServerState::initialize(&config).await?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
