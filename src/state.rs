// src/state.rs
use std::sync::Arc;

use crate::services::countries::CountryRegistry;
use crate::services::filter::Selection;
use crate::services::store::Dataset;

/// Read-only state shared by every request.
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub countries: CountryRegistry,
    /// Full observed selector sets from the daily collection.
    pub defaults: Selection,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, countries: CountryRegistry) -> Self {
        let defaults = Selection::defaults(dataset.daily());
        AppState {
            dataset,
            countries,
            defaults,
        }
    }
}
