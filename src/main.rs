use live_sales::{AppState, Config, Store, load_data, router};
use std::net::SocketAddr;
use tokio::{fs, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    info!(
        hosts = data.hosts.len(),
        accounts = data.accounts.len(),
        sales = data.sales.len(),
        "loaded {}",
        config.data_path.display()
    );
    if config.api_token.is_none() {
        info!("APP_API_TOKEN not set, api is open");
    }

    let state = AppState::new(&config, Store::new(config.data_path.clone(), data));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
