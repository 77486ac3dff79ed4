// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;
use log::info;
use warp::http::StatusCode;
use warp::reject::{InvalidQuery, Rejection};
use warp::{Filter, Reply};

use crate::handlers::countries::get_countries;
use crate::handlers::error::ApiError;
use crate::handlers::events::{
    get_dashboard, get_distributions, get_events, get_group_means, get_options, get_summary,
    ReactionQuery,
};
use crate::handlers::intraday::get_intraday;
use crate::state::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(invalid) = err.find::<InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = invalid.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());
    let query = warp::query::<ReactionQuery>();

    let health_route = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<AppState>| {
            warp::reply::json(&serde_json::json!({
                "ok": true,
                "daily_records": state.dataset.daily().len(),
                "intraday_available": state.dataset.intraday().is_available(),
            }))
        });

    let options_route = warp::path!("api" / "v1" / "options")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_options);

    let events_route = warp::path!("api" / "v1" / "events")
        .and(warp::get())
        .and(query.clone())
        .and(state_filter.clone())
        .and_then(get_events);

    let summary_route = warp::path!("api" / "v1" / "summary")
        .and(warp::get())
        .and(query.clone())
        .and(state_filter.clone())
        .and_then(get_summary);

    let group_means_route = warp::path!("api" / "v1" / "group_means")
        .and(warp::get())
        .and(query.clone())
        .and(state_filter.clone())
        .and_then(get_group_means);

    let distributions_route = warp::path!("api" / "v1" / "distributions")
        .and(warp::get())
        .and(query.clone())
        .and(state_filter.clone())
        .and_then(get_distributions);

    let intraday_route = warp::path!("api" / "v1" / "intraday")
        .and(warp::get())
        .and(query.clone())
        .and(state_filter.clone())
        .and_then(get_intraday);

    let dashboard_route = warp::path!("api" / "v1" / "dashboard")
        .and(warp::get())
        .and(query)
        .and(state_filter.clone())
        .and_then(get_dashboard);

    let countries_route = warp::path!("api" / "v1" / "countries")
        .and(warp::get())
        .and(state_filter)
        .and_then(get_countries);

    info!("All routes configured successfully.");

    health_route
        .or(options_route)
        .or(events_route)
        .or(summary_route)
        .or(group_means_route)
        .or(distributions_route)
        .or(intraday_route)
        .or(dashboard_route)
        .or(countries_route)
        .recover(handle_rejection)
}
