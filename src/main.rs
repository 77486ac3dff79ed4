use anyhow::Result;
use dotenv::dotenv;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use macro_event_impact::config::AppConfig;
use macro_event_impact::routes;
use macro_event_impact::services::store::DataStore;
use macro_event_impact::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;
    info!("Using PORT: {}", config.port);

    let countries = config.country_registry()?;

    // The daily source is mandatory; without it there is nothing to serve.
    let store = DataStore::new(config.sources.clone());
    let dataset = store.load().map_err(|e| {
        error!("Failed to load event data: {}", e);
        e
    })?;

    let state = Arc::new(AppState::new(dataset, countries));

    // Bind to 0.0.0.0 so the service is reachable inside containers
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
