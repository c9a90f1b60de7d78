//! Candle CSV loading and export.
//!
//! Files carry a `timestamp,open,high,low,close,volume` header. Timestamps are
//! RFC 3339 or `YYYY-MM-DD HH:MM:SS` (read as UTC). Rows are sorted by time;
//! duplicate timestamps keep the first row. Rows with non-finite values or
//! inconsistent OHLC are dropped with a warning. A non-positive price is a
//! hard error because it means the file is not price data at all.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use tickforge_core::domain::Candle;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name} row {row}: unparseable timestamp '{value}'")]
    Timestamp {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("{source_name} row {row}: non-positive price {price}")]
    NonPositivePrice {
        source_name: String,
        row: usize,
        price: f64,
    },

    #[error("no usable candles in {0}")]
    Empty(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Load and validate candles from a CSV file.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_candles(file, &path.display().to_string())
}

/// Parse candles from any reader. `source_name` only labels errors.
pub fn read_candles<R: Read>(reader: R, source_name: &str) -> Result<Vec<Candle>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();
    let mut dropped = 0usize;

    for (i, record) in csv_reader.deserialize::<CandleRow>().enumerate() {
        // header is line 1
        let row = i + 2;
        let record = record.map_err(|source| LoadError::Csv {
            source_name: source_name.to_string(),
            source,
        })?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            source_name: source_name.to_string(),
            row,
            value: record.timestamp.clone(),
        })?;
        let candle = Candle::new(timestamp, record.open, record.high, record.low, record.close, record.volume);

        let prices = [candle.open, candle.high, candle.low, candle.close];
        if prices.iter().any(|p| !p.is_finite()) || !candle.volume.is_finite() {
            warn!(source = source_name, row, "dropping candle with non-finite values");
            dropped += 1;
            continue;
        }
        if let Some(&price) = prices.iter().find(|p| **p <= 0.0) {
            return Err(LoadError::NonPositivePrice {
                source_name: source_name.to_string(),
                row,
                price,
            });
        }
        if !candle.is_sane() {
            warn!(source = source_name, row, "dropping candle with inconsistent OHLC");
            dropped += 1;
            continue;
        }
        candles.push(candle);
    }

    candles.sort_by_key(|c| c.timestamp);
    let before = candles.len();
    candles.dedup_by_key(|c| c.timestamp);
    if candles.len() < before {
        warn!(source = source_name, duplicates = before - candles.len(), "dropping duplicate timestamps");
    }

    if candles.is_empty() {
        return Err(LoadError::Empty(source_name.to_string()));
    }
    debug!(source = source_name, candles = candles.len(), dropped, "candles loaded");
    Ok(candles)
}

/// Write candles in the format `load_candles` reads.
pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| LoadError::Csv {
        source_name: path.display().to_string(),
        source,
    })?;
    for candle in candles {
        writer
            .serialize(CandleRow {
                timestamp: candle.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
            })
            .map_err(|source| LoadError::Csv {
                source_name: path.display().to_string(),
                source,
            })?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "timestamp,open,high,low,close,volume\n";

    fn parse(body: &str) -> Result<Vec<Candle>, LoadError> {
        read_candles(format!("{HEADER}{body}").as_bytes(), "test.csv")
    }

    #[test]
    fn accepts_both_timestamp_formats_and_sorts() {
        let candles = parse(
            "2024-01-01 00:01:00,101,102,100,101.5,10\n\
             2024-01-01T00:00:00Z,100,101,99,100.5,12\n",
        )
        .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(candles[1].close, 101.5);
    }

    #[test]
    fn drops_nan_and_insane_rows() {
        let candles = parse(
            "2024-01-01 00:00:00,100,101,99,100.5,10\n\
             2024-01-01 00:01:00,NaN,101,99,100,10\n\
             2024-01-01 00:02:00,100,99,101,100,10\n\
             2024-01-01 00:03:00,100,101,99,100.2,10\n",
        )
        .unwrap();
        assert_eq!(candles.len(), 2);
    }

    #[test]
    fn duplicate_timestamps_keep_first() {
        let candles = parse(
            "2024-01-01 00:00:00,100,101,99,100.5,10\n\
             2024-01-01 00:00:00,200,201,199,200.5,10\n",
        )
        .unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 100.0);
    }

    #[test]
    fn non_positive_price_is_fatal() {
        let err = parse("2024-01-01 00:00:00,0,1,0,0.5,10\n").unwrap_err();
        assert!(matches!(err, LoadError::NonPositivePrice { row: 2, .. }));
    }

    #[test]
    fn bad_timestamp_names_the_row() {
        let err = parse(
            "2024-01-01 00:00:00,100,101,99,100.5,10\n\
             yesterday,100,101,99,100.5,10\n",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 3, ref value, .. } if value == "yesterday"));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(parse(""), Err(LoadError::Empty(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_candles(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candles.csv");
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let candles: Vec<Candle> = (0..5)
            .map(|i| {
                let base = 50.0 + i as f64 * 0.25;
                Candle::new(start + chrono::Duration::minutes(i), base, base + 0.5, base - 0.5, base + 0.1, 7.0)
            })
            .collect();

        write_candles(&path, &candles).unwrap();
        assert_eq!(load_candles(&path).unwrap(), candles);
    }
}
