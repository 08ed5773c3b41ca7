use axum::serve;
use estate_pulse::api::routes::create_app;
use estate_pulse::config::AppConfig;
use estate_pulse::PropertyStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}, storage={:?} at '{}'",
        config.server_address(),
        config.storage.backend,
        config.storage.data_dir
    );

    let mut store = PropertyStore::with_key(config.storage.open(), config.storage.key.clone());
    let properties = store.load()?;
    log::info!("Property catalog ready with {} entries", properties.len());

    let app = create_app(Arc::new(Mutex::new(store)), config.server.static_dir.as_deref());

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Estate Pulse API listening on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
