// src/handlers/countries.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::state::AppState;

pub async fn get_countries(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for country profiles");
    Ok(warp::reply::json(state.countries.profiles()))
}
