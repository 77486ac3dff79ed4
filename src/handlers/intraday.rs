// src/handlers/intraday.rs
use log::info;
use serde::Serialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::events::ReactionQuery;
use crate::models::IntradayRecord;
use crate::services::filter::{filter_records, sort_most_recent_first, Selection};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IntradayRow {
    #[serde(flatten)]
    pub record: IntradayRecord,
    /// Announcement time in the country's market timezone, if configured.
    /// Source timestamps with an offset are converted; naive ones are read
    /// as market-local wall-clock time.
    pub market_local_time: Option<String>,
}

/// `available == false` means the deployment has no intraday data at all;
/// an available view may still have no rows after filtering.
#[derive(Debug, Serialize)]
pub struct IntradayView {
    pub available: bool,
    pub records: Vec<IntradayRow>,
}

pub fn intraday_view(state: &AppState, selection: &Selection) -> IntradayView {
    let intraday = state.dataset.intraday();
    let filtered = filter_records(intraday.records(), selection);
    let records = sort_most_recent_first(filtered)
        .into_iter()
        .map(|record| {
            let local = if record.utc_normalized {
                state
                    .countries
                    .market_local_time(&record.country, record.event_datetime)
            } else {
                state.countries.localize(&record.country, record.event_datetime)
            };
            IntradayRow {
                market_local_time: local.map(|local| local.to_rfc3339()),
                record,
            }
        })
        .collect();

    IntradayView {
        available: intraday.is_available(),
        records,
    }
}

pub async fn get_intraday(query: ReactionQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for intraday data");
    let selection = query.selection(&state.defaults);
    Ok(warp::reply::json(&intraday_view(&state, &selection)))
}
