// src/services/calculations.rs
use log::debug;
use std::collections::{BTreeSet, HashMap};

use crate::models::{EventReaction, GroupDistribution, GroupMean, Record, ReturnWindow, SummaryMetrics};

/// Exact counts over the filtered set.
pub fn summarize<R: Record>(records: &[R]) -> SummaryMetrics {
    let countries: BTreeSet<&str> = records.iter().map(|r| r.country()).collect();
    let assets: BTreeSet<&str> = records.iter().map(|r| r.asset()).collect();
    SummaryMetrics {
        total_events: records.len(),
        countries: countries.len(),
        assets: assets.len(),
    }
}

fn calculate_average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Non-missing values of `window` per (event, country), groups in order of
/// first appearance.
fn group_values(records: &[EventReaction], window: ReturnWindow) -> Vec<((String, String), Vec<f64>)> {
    let mut groups: Vec<((String, String), Vec<f64>)> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        let key = (record.event.as_str(), record.country.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(((record.event.clone(), record.country.clone()), Vec::new()));
            groups.len() - 1
        });
        if let Some(value) = window.select(record) {
            groups[slot].1.push(value);
        }
    }
    groups
}

/// Mean of the selected return per (event, country). Missing values are
/// skipped; a group with nothing left produces no entry.
pub fn group_means(records: &[EventReaction], window: ReturnWindow) -> Vec<GroupMean> {
    group_values(records, window)
        .into_iter()
        .filter_map(|((event, country), values)| {
            let Some(mean_return) = calculate_average(&values) else {
                debug!("No {} values for {} / {}, skipping group", window, event, country);
                return None;
            };
            Some(GroupMean {
                event,
                country,
                mean_return,
                observations: values.len(),
            })
        })
        .collect()
}

/// Quantile of sorted data by linear interpolation between closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Box-plot statistics per (event, country), same grouping and exclusion
/// rules as [`group_means`]. Outliers fall outside 1.5 IQR of the quartiles.
pub fn group_distributions(records: &[EventReaction], window: ReturnWindow) -> Vec<GroupDistribution> {
    group_values(records, window)
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|((event, country), mut values)| {
            values.sort_by(f64::total_cmp);
            let q1 = quantile(&values, 0.25);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;
            let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
            let inside = |v: &&f64| **v >= low_fence && **v <= high_fence;
            let lower_whisker = values.iter().find(inside).copied().unwrap_or(q1);
            let upper_whisker = values.iter().rev().find(inside).copied().unwrap_or(q3);
            let outliers = values
                .iter()
                .copied()
                .filter(|v| *v < low_fence || *v > high_fence)
                .collect();

            GroupDistribution {
                event,
                country,
                count: values.len(),
                min: values[0],
                q1,
                median: quantile(&values, 0.5),
                q3,
                max: values[values.len() - 1],
                lower_whisker,
                upper_whisker,
                outliers,
            }
        })
        .collect()
}
