use clipvault_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    clipvault_api::telemetry::init_telemetry(config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, router) = clipvault_api::setup::initialize_app(config.clone()).await?;

    let sweeper = clipvault_api::setup::services::spawn_sweeper(&config, &state);

    clipvault_api::setup::server::start_server(&config, router).await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    Ok(())
}
