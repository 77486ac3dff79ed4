// src/services/store.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::models::{EventReaction, IntradayData, IntradayRecord};

const EVENT_DATETIME: &str = "event_datetime";
const COUNTRY: &str = "country";
const EVENT: &str = "event";
const ASSET: &str = "asset";
const EVENT_DAY_RETURN: &str = "event_day_return_pct";
const NEXT_DAY_RETURN: &str = "next_day_return_pct";

const CORE_COLUMNS: [&str; 6] = [
    EVENT_DATETIME,
    COUNTRY,
    EVENT,
    ASSET,
    EVENT_DAY_RETURN,
    NEXT_DAY_RETURN,
];

/// Cell values read as a missing return (compared case-insensitively): the
/// NA spellings spreadsheet and dataframe exports write by default.
const MISSING_MARKERS: [&str; 19] = [
    "",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "-nan",
    "1.#IND",
    "1.#QNAN",
    "<NA>",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "None",
    "n/a",
    "nan",
    "null",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// I/O and parse failures while reading an event source.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read csv from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("{origin}: missing required column '{column}'")]
    MissingColumn { origin: String, column: &'static str },
    #[error("{origin} line {line}: invalid {column} value '{value}'")]
    InvalidField {
        origin: String,
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// The only failure the store surfaces: the mandatory daily source could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("daily event data unavailable: {0}")]
    DataUnavailable(#[from] DataError),
}

/// Parse a date or date-time cell. Offsets are converted to UTC; naive values are taken as-is.
pub fn parse_event_datetime(raw: &str) -> Option<NaiveDateTime> {
    parse_event_datetime_with_offset(raw).map(|(dt, _)| dt)
}

/// Like [`parse_event_datetime`], also reporting whether the cell carried an
/// offset (and so was normalised to UTC).
pub fn parse_event_datetime_with_offset(raw: &str) -> Option<(NaiveDateTime, bool)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some((dt.naive_utc(), true));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some((dt.naive_utc(), true));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some((dt, false));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| (dt, false))
}

fn is_missing_marker(raw: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| raw.eq_ignore_ascii_case(marker))
}

fn locate(headers: &StringRecord, column: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
}

fn require(headers: &StringRecord, column: &'static str, origin: &str) -> Result<usize, DataError> {
    locate(headers, column).ok_or_else(|| DataError::MissingColumn {
        origin: origin.to_string(),
        column,
    })
}

/// One csv row plus the context needed to report a bad cell.
struct Row<'a> {
    origin: &'a str,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn invalid(&self, column: &'static str, value: &str) -> DataError {
        DataError::InvalidField {
            origin: self.origin.to_string(),
            line: self.line(),
            column,
            value: value.to_string(),
        }
    }

    fn cell(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("").trim()
    }

    fn text(&self, idx: usize, column: &'static str) -> Result<String, DataError> {
        let value = self.cell(idx);
        if value.is_empty() {
            return Err(self.invalid(column, value));
        }
        Ok(value.to_string())
    }

    fn datetime(&self, idx: usize) -> Result<NaiveDateTime, DataError> {
        self.datetime_with_offset(idx).map(|(dt, _)| dt)
    }

    fn datetime_with_offset(&self, idx: usize) -> Result<(NaiveDateTime, bool), DataError> {
        let value = self.cell(idx);
        parse_event_datetime_with_offset(value).ok_or_else(|| self.invalid(EVENT_DATETIME, value))
    }

    fn return_pct(&self, idx: Option<usize>, column: &'static str) -> Result<Option<f64>, DataError> {
        let Some(idx) = idx else {
            return Ok(None);
        };
        let value = self.cell(idx);
        if is_missing_marker(value) {
            return Ok(None);
        }
        match value.parse::<f64>() {
            Ok(pct) if pct.is_finite() => Ok(Some(pct)),
            _ => Err(self.invalid(column, value)),
        }
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Read the daily reaction table. Every row must parse; one bad row fails the whole read.
pub fn read_daily<R: Read>(reader: R, origin: &str) -> Result<Vec<EventReaction>, DataError> {
    let csv_error = |source| DataError::Csv {
        origin: origin.to_string(),
        source,
    };
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let idx_datetime = require(&headers, EVENT_DATETIME, origin)?;
    let idx_country = require(&headers, COUNTRY, origin)?;
    let idx_event = require(&headers, EVENT, origin)?;
    let idx_asset = require(&headers, ASSET, origin)?;
    let idx_event_day = require(&headers, EVENT_DAY_RETURN, origin)?;
    let idx_next_day = require(&headers, NEXT_DAY_RETURN, origin)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let row = Row {
            origin,
            record: &record,
        };
        records.push(EventReaction {
            event_datetime: row.datetime(idx_datetime)?,
            country: row.text(idx_country, COUNTRY)?,
            event: row.text(idx_event, EVENT)?,
            asset: row.text(idx_asset, ASSET)?,
            event_day_return_pct: row.return_pct(Some(idx_event_day), EVENT_DAY_RETURN)?,
            next_day_return_pct: row.return_pct(Some(idx_next_day), NEXT_DAY_RETURN)?,
        });
    }

    debug!("Read {} daily records from {}", records.len(), origin);
    Ok(records)
}

/// Read the intraday table. Only the four identifying columns are required.
pub fn read_intraday<R: Read>(reader: R, origin: &str) -> Result<Vec<IntradayRecord>, DataError> {
    let csv_error = |source| DataError::Csv {
        origin: origin.to_string(),
        source,
    };
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let idx_datetime = require(&headers, EVENT_DATETIME, origin)?;
    let idx_country = require(&headers, COUNTRY, origin)?;
    let idx_event = require(&headers, EVENT, origin)?;
    let idx_asset = require(&headers, ASSET, origin)?;
    let idx_event_day = locate(&headers, EVENT_DAY_RETURN);
    let idx_next_day = locate(&headers, NEXT_DAY_RETURN);

    let extra_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            !CORE_COLUMNS
                .iter()
                .any(|core| h.trim().eq_ignore_ascii_case(core))
        })
        .map(|(idx, h)| (idx, h.trim().to_string()))
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let row = Row {
            origin,
            record: &record,
        };
        let extra: BTreeMap<String, String> = extra_columns
            .iter()
            .map(|(idx, name)| (name.clone(), row.cell(*idx).to_string()))
            .collect();

        let (event_datetime, utc_normalized) = row.datetime_with_offset(idx_datetime)?;
        records.push(IntradayRecord {
            event_datetime,
            country: row.text(idx_country, COUNTRY)?,
            event: row.text(idx_event, EVENT)?,
            asset: row.text(idx_asset, ASSET)?,
            event_day_return_pct: row.return_pct(idx_event_day, EVENT_DAY_RETURN)?,
            next_day_return_pct: row.return_pct(idx_next_day, NEXT_DAY_RETURN)?,
            extra,
            utc_normalized,
        });
    }

    debug!("Read {} intraday records from {}", records.len(), origin);
    Ok(records)
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|source| DataError::Io {
        origin: path.display().to_string(),
        source,
    })
}

pub fn load_daily(path: &Path) -> Result<Vec<EventReaction>, DataError> {
    info!("Loading daily reactions from {}", path.display());
    read_daily(open(path)?, &path.display().to_string())
}

pub fn load_intraday(path: &Path) -> Result<Vec<IntradayRecord>, DataError> {
    info!("Loading intraday reactions from {}", path.display());
    read_intraday(open(path)?, &path.display().to_string())
}

/// Map an intraday read onto the collection state. Any read or parse
/// failure becomes `Unavailable`; the cause is only logged.
pub fn intraday_or_unavailable(result: Result<Vec<IntradayRecord>, DataError>) -> IntradayData {
    match result {
        Ok(records) => {
            let data = IntradayData::from_records(records);
            if !data.is_available() {
                info!("Intraday source is empty, continuing without intraday data");
            }
            data
        }
        Err(e) => {
            warn!("Intraday data unavailable, continuing with daily data only: {}", e);
            IntradayData::Unavailable
        }
    }
}

/// Where the two collections come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub daily: PathBuf,
    pub intraday: Option<PathBuf>,
}

/// Both record collections, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    daily: Vec<EventReaction>,
    intraday: IntradayData,
}

impl Dataset {
    pub fn from_parts(daily: Vec<EventReaction>, intraday: IntradayData) -> Self {
        Dataset { daily, intraday }
    }

    pub fn load(sources: &DataSources) -> Result<Self, LoadError> {
        let daily = load_daily(&sources.daily)?;
        let intraday = match &sources.intraday {
            Some(path) => intraday_or_unavailable(load_intraday(path)),
            None => {
                info!("No intraday source configured");
                IntradayData::Unavailable
            }
        };
        info!(
            "Dataset loaded: {} daily records, intraday available: {}",
            daily.len(),
            intraday.is_available()
        );
        Ok(Dataset { daily, intraday })
    }

    pub fn daily(&self) -> &[EventReaction] {
        &self.daily
    }

    pub fn intraday(&self) -> &IntradayData {
        &self.intraday
    }
}

/// Loads the dataset once and hands out the shared result afterwards.
/// Owned by the process entry point and passed down by reference.
pub struct DataStore {
    sources: DataSources,
    dataset: OnceLock<Arc<Dataset>>,
}

impl DataStore {
    pub fn new(sources: DataSources) -> Self {
        DataStore {
            sources,
            dataset: OnceLock::new(),
        }
    }

    /// A failed load is not cached, so a later call retries the sources.
    pub fn load(&self) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.dataset.get() {
            debug!("Returning cached dataset");
            return Ok(Arc::clone(dataset));
        }
        let loaded = Arc::new(Dataset::load(&self.sources)?);
        Ok(Arc::clone(self.dataset.get_or_init(|| loaded)))
    }
}
