// src/services/filter.rs
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{EventReaction, Record, ReturnWindow};

/// Current choice along each filter dimension. An empty set selects nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub countries: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub assets: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, S>(countries: I, events: I, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            countries: countries.into_iter().map(Into::into).collect(),
            events: events.into_iter().map(Into::into).collect(),
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    /// Every observed value in the daily collection, per dimension.
    pub fn defaults(daily: &[EventReaction]) -> Self {
        Selection {
            countries: daily.iter().map(|r| r.country.clone()).collect(),
            events: daily.iter().map(|r| r.event.clone()).collect(),
            assets: daily.iter().map(|r| r.asset.clone()).collect(),
        }
    }

    /// Build a selection from comma-separated query values. A dimension that
    /// is absent falls back to `defaults`; one that is present but blank
    /// selects nothing. There is no escaping, so labels must not contain commas.
    pub fn from_query(
        countries: Option<&str>,
        events: Option<&str>,
        assets: Option<&str>,
        defaults: &Selection,
    ) -> Self {
        Selection {
            countries: parse_selector(countries, &defaults.countries),
            events: parse_selector(events, &defaults.events),
            assets: parse_selector(assets, &defaults.assets),
        }
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.countries.contains(record.country())
            && self.events.contains(record.event())
            && self.assets.contains(record.asset())
    }
}

fn parse_selector(raw: Option<&str>, default: &BTreeSet<String>) -> BTreeSet<String> {
    match raw {
        None => default.clone(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Choices offered to the presentation layer, lexicographically ordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOptions {
    pub countries: Vec<String>,
    pub events: Vec<String>,
    pub assets: Vec<String>,
    pub windows: Vec<ReturnWindow>,
}

impl From<&Selection> for SelectorOptions {
    fn from(selection: &Selection) -> Self {
        SelectorOptions {
            countries: selection.countries.iter().cloned().collect(),
            events: selection.events.iter().cloned().collect(),
            assets: selection.assets.iter().cloned().collect(),
            windows: ReturnWindow::ALL.to_vec(),
        }
    }
}

/// Keep the records whose country, event and asset are all selected.
/// Input order is preserved.
pub fn filter_records<R: Record + Clone>(records: &[R], selection: &Selection) -> Vec<R> {
    records
        .iter()
        .filter(|r| selection.matches(*r))
        .cloned()
        .collect()
}

/// Display order for record tables: most recent first. Ties keep input order.
pub fn sort_most_recent_first<R: Record>(mut records: Vec<R>) -> Vec<R> {
    records.sort_by(|a, b| b.event_datetime().cmp(&a.event_datetime()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntradayRecord;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn reaction(day: u32, country: &str, event: &str, asset: &str) -> EventReaction {
        EventReaction {
            event_datetime: at(2024, 1, day),
            country: country.to_string(),
            event: event.to_string(),
            asset: asset.to_string(),
            event_day_return_pct: Some(0.1),
            next_day_return_pct: None,
        }
    }

    fn sample() -> Vec<EventReaction> {
        vec![
            reaction(11, "US", "CPI", "SPY"),
            reaction(12, "INDIA", "CPI", "NIFTY"),
            reaction(5, "US", "Non Farm Payrolls", "SPY"),
            reaction(8, "INDIA", "Repo Rate", "NIFTY"),
        ]
    }

    #[test]
    fn defaults_are_sorted_distinct_values() {
        let options = SelectorOptions::from(&Selection::defaults(&sample()));
        assert_eq!(options.countries, vec!["INDIA", "US"]);
        assert_eq!(options.events, vec!["CPI", "Non Farm Payrolls", "Repo Rate"]);
        assert_eq!(options.assets, vec!["NIFTY", "SPY"]);
        assert_eq!(options.windows, vec![ReturnWindow::EventDay, ReturnWindow::NextDay]);
    }

    #[test]
    fn default_selection_keeps_everything_in_order() {
        let records = sample();
        let filtered = filter_records(&records, &Selection::defaults(&records));
        assert_eq!(filtered, records);
    }

    #[test]
    fn filter_is_a_conjunction() {
        let records = sample();
        let selection = Selection::new(vec!["US", "INDIA"], vec!["CPI"], vec!["SPY"]);
        let filtered = filter_records(&records, &selection);
        assert_eq!(filtered, vec![reaction(11, "US", "CPI", "SPY")]);
    }

    #[test]
    fn filter_is_idempotent() {
        let records = sample();
        let selection = Selection::new(vec!["INDIA"], vec!["CPI", "Repo Rate"], vec!["NIFTY"]);
        let once = filter_records(&records, &selection);
        let twice = filter_records(&once, &selection);
        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_selector_selects_nothing() {
        let records = sample();
        let defaults = Selection::defaults(&records);
        let selection = Selection::from_query(None, None, Some(""), &defaults);
        assert!(selection.assets.is_empty());
        assert!(filter_records(&records, &selection).is_empty());
    }

    #[test]
    fn query_values_are_trimmed_and_absent_dimensions_default() {
        let defaults = Selection::defaults(&sample());
        let selection = Selection::from_query(Some(" US , INDIA,"), None, Some("SPY"), &defaults);
        assert_eq!(selection.countries, defaults.countries);
        assert_eq!(selection.events, defaults.events);
        assert_eq!(selection.assets.len(), 1);
        assert!(selection.assets.contains("SPY"));
    }

    #[test]
    fn commas_inside_a_label_split_it() {
        let records = vec![reaction(11, "US", "Rate, Decision", "SPY")];
        let defaults = Selection::defaults(&records);
        let selection = Selection::from_query(None, Some("Rate, Decision"), None, &defaults);
        assert_eq!(selection.events, BTreeSet::from(["Rate".to_string(), "Decision".to_string()]));
        assert!(filter_records(&records, &selection).is_empty());
    }

    #[test]
    fn intraday_records_use_the_same_selection() {
        let intraday = vec![
            IntradayRecord {
                event_datetime: at(2024, 1, 11),
                country: "US".into(),
                event: "CPI".into(),
                asset: "SPY".into(),
                event_day_return_pct: None,
                next_day_return_pct: None,
                extra: BTreeMap::new(),
                utc_normalized: false,
            },
            IntradayRecord {
                event_datetime: at(2024, 1, 12),
                country: "INDIA".into(),
                event: "CPI".into(),
                asset: "NIFTY".into(),
                event_day_return_pct: None,
                next_day_return_pct: None,
                extra: BTreeMap::new(),
                utc_normalized: false,
            },
        ];
        let selection = Selection::new(vec!["US"], vec!["CPI"], vec!["SPY", "NIFTY"]);
        let filtered = filter_records(&intraday, &selection);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].country, "US");
    }

    #[test]
    fn sorts_most_recent_first() {
        let sorted = sort_most_recent_first(sample());
        let days: Vec<_> = sorted.iter().map(|r| r.event_datetime).collect();
        assert_eq!(days, vec![at(2024, 1, 12), at(2024, 1, 11), at(2024, 1, 8), at(2024, 1, 5)]);
    }
}
