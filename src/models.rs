// src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Common read access shared by daily and intraday records, so both
/// collections go through the same filter.
pub trait Record {
    fn event_datetime(&self) -> NaiveDateTime;
    fn country(&self) -> &str;
    fn event(&self) -> &str;
    fn asset(&self) -> &str;
}

/// One macro event observed on one asset, with close-to-close returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReaction {
    pub event_datetime: NaiveDateTime,
    pub country: String,
    pub event: String,
    pub asset: String,
    /// (close on event day / previous close - 1) * 100. `None` when missing.
    pub event_day_return_pct: Option<f64>,
    /// Event-day close to next trading-day close, in percent.
    pub next_day_return_pct: Option<f64>,
}

impl Record for EventReaction {
    fn event_datetime(&self) -> NaiveDateTime {
        self.event_datetime
    }

    fn country(&self) -> &str {
        &self.country
    }

    fn event(&self) -> &str {
        &self.event
    }

    fn asset(&self) -> &str {
        &self.asset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayRecord {
    pub event_datetime: NaiveDateTime,
    pub country: String,
    pub event: String,
    pub asset: String,
    pub event_day_return_pct: Option<f64>,
    pub next_day_return_pct: Option<f64>,
    /// Any further columns of the intraday source, kept verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// True when the source timestamp carried an offset and `event_datetime`
    /// is UTC. Naive timestamps are market-local wall-clock time.
    #[serde(skip)]
    pub utc_normalized: bool,
}

impl Record for IntradayRecord {
    fn event_datetime(&self) -> NaiveDateTime {
        self.event_datetime
    }

    fn country(&self) -> &str {
        &self.country
    }

    fn event(&self) -> &str {
        &self.event
    }

    fn asset(&self) -> &str {
        &self.asset
    }
}

/// The intraday collection. `Unavailable` means the deployment has no
/// intraday data at all, which is different from an available collection
/// that filters down to nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IntradayData {
    #[default]
    Unavailable,
    Available(Vec<IntradayRecord>),
}

impl IntradayData {
    /// An empty source carries no information, so it collapses to `Unavailable`.
    pub fn from_records(records: Vec<IntradayRecord>) -> Self {
        if records.is_empty() {
            IntradayData::Unavailable
        } else {
            IntradayData::Available(records)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, IntradayData::Available(_))
    }

    pub fn records(&self) -> &[IntradayRecord] {
        match self {
            IntradayData::Unavailable => &[],
            IntradayData::Available(records) => records,
        }
    }
}

/// Which return field downstream aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnWindow {
    #[default]
    EventDay,
    NextDay,
}

impl ReturnWindow {
    pub const ALL: [ReturnWindow; 2] = [ReturnWindow::EventDay, ReturnWindow::NextDay];

    pub fn select(self, record: &EventReaction) -> Option<f64> {
        match self {
            ReturnWindow::EventDay => record.event_day_return_pct,
            ReturnWindow::NextDay => record.next_day_return_pct,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReturnWindow::EventDay => "Event Day Return",
            ReturnWindow::NextDay => "Next Day Return",
        }
    }

    fn key(self) -> &'static str {
        match self {
            ReturnWindow::EventDay => "event_day",
            ReturnWindow::NextDay => "next_day",
        }
    }
}

impl fmt::Display for ReturnWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWindow(pub String);

impl fmt::Display for UnknownWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown return window '{}', expected 'event_day' or 'next_day'",
            self.0
        )
    }
}

impl std::error::Error for UnknownWindow {}

impl FromStr for ReturnWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event_day" | "event_day_return_pct" => Ok(ReturnWindow::EventDay),
            "next_day" | "next_day_return_pct" => Ok(ReturnWindow::NextDay),
            _ => Err(UnknownWindow(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummaryMetrics {
    pub total_events: usize,
    pub countries: usize,
    pub assets: usize,
}

/// Mean of the selected return over one (event, country) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub event: String,
    pub country: String,
    pub mean_return: f64,
    /// Number of non-missing values that went into the mean.
    pub observations: usize,
}

/// Box-plot statistics of the selected return over one (event, country) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub event: String,
    pub country: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest and largest values within 1.5 IQR of the quartiles; the
    /// box-plot whisker ends. `min`/`max` still include outliers.
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}
