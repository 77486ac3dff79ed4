// src/bin/inspect_reactions.rs
use dotenv::dotenv;
use log::info;

use macro_event_impact::config::AppConfig;
use macro_event_impact::models::ReturnWindow;
use macro_event_impact::services::calculations::{group_means, summarize};
use macro_event_impact::services::filter::{filter_records, Selection};
use macro_event_impact::services::store::DataStore;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    info!("Daily source: {}", config.sources.daily.display());

    let dataset = DataStore::new(config.sources).load()?;
    let selection = Selection::defaults(dataset.daily());
    info!("Countries: {:?}", selection.countries);
    info!("Events: {:?}", selection.events);
    info!("Assets: {:?}", selection.assets);

    let filtered = filter_records(dataset.daily(), &selection);
    let summary = summarize(&filtered);
    info!(
        "Total events: {}, countries: {}, assets: {}",
        summary.total_events, summary.countries, summary.assets
    );

    for window in ReturnWindow::ALL {
        info!("Average {}:", window.label());
        for group in group_means(&filtered, window) {
            info!(
                "  {:<20} {:<8} {:>8.3}% (n={})",
                group.event, group.country, group.mean_return, group.observations
            );
        }
    }

    if dataset.intraday().is_available() {
        info!("Intraday records: {}", dataset.intraday().records().len());
    } else {
        info!("No intraday data available");
    }
    Ok(())
}
