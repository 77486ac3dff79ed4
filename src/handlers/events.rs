// src/handlers/events.rs
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::intraday::{intraday_view, IntradayView};
use crate::models::{EventReaction, GroupDistribution, GroupMean, ReturnWindow, SummaryMetrics};
use crate::services::calculations::{group_distributions, group_means, summarize};
use crate::services::filter::{filter_records, sort_most_recent_first, Selection, SelectorOptions};
use crate::state::AppState;

/// Selector and window query parameters shared by every data endpoint.
/// Selector values are comma-separated; leave a parameter out to select
/// every observed value, pass it empty to select none. Commas always split,
/// even percent-encoded, so a label containing a comma cannot be selected
/// over the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReactionQuery {
    pub countries: Option<String>,
    pub events: Option<String>,
    pub assets: Option<String>,
    pub window: Option<String>,
}

impl ReactionQuery {
    pub fn selection(&self, defaults: &Selection) -> Selection {
        Selection::from_query(
            self.countries.as_deref(),
            self.events.as_deref(),
            self.assets.as_deref(),
            defaults,
        )
    }

    pub fn window(&self) -> Result<ReturnWindow, ApiError> {
        match self.window.as_deref() {
            None | Some("") => Ok(ReturnWindow::default()),
            Some(raw) => raw
                .parse::<ReturnWindow>()
                .map_err(|e| ApiError::bad_request(e.to_string())),
        }
    }
}

fn filtered_daily(query: &ReactionQuery, state: &AppState) -> (Selection, Vec<EventReaction>) {
    let selection = query.selection(&state.defaults);
    let filtered = filter_records(state.dataset.daily(), &selection);
    debug!(
        "Selection {:?} kept {} of {} daily records",
        selection,
        filtered.len(),
        state.dataset.daily().len()
    );
    (selection, filtered)
}

pub async fn get_options(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for selector options");
    Ok(warp::reply::json(&SelectorOptions::from(&state.defaults)))
}

pub async fn get_events(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for event-level data");
    let (_, filtered) = filtered_daily(&query, &state);
    Ok(warp::reply::json(&sort_most_recent_first(filtered)))
}

pub async fn get_summary(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for summary metrics");
    let (_, filtered) = filtered_daily(&query, &state);
    Ok(warp::reply::json(&summarize(&filtered)))
}

pub async fn get_group_means(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let window = query.window().map_err(warp::reject::custom)?;
    info!("Handling request for average {} reaction", window);
    let (_, filtered) = filtered_daily(&query, &state);
    Ok(warp::reply::json(&group_means(&filtered, window)))
}

pub async fn get_distributions(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let window = query.window().map_err(warp::reject::custom)?;
    info!("Handling request for {} return distributions", window);
    let (_, filtered) = filtered_daily(&query, &state);
    Ok(warp::reply::json(&group_distributions(&filtered, window)))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub selection: Selection,
    pub window: ReturnWindow,
    pub summary: SummaryMetrics,
    pub group_means: Vec<GroupMean>,
    pub distributions: Vec<GroupDistribution>,
    pub events: Vec<EventReaction>,
    pub intraday: IntradayView,
}

/// Everything one filter change recomputes, in a single body.
pub async fn get_dashboard(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let window = query.window().map_err(warp::reject::custom)?;
    info!("Handling dashboard request ({} window)", window);
    let (selection, filtered) = filtered_daily(&query, &state);

    let response = DashboardResponse {
        summary: summarize(&filtered),
        group_means: group_means(&filtered, window),
        distributions: group_distributions(&filtered, window),
        intraday: intraday_view(&state, &selection),
        events: sort_most_recent_first(filtered),
        selection,
        window,
    };
    Ok(warp::reply::json(&response))
}
