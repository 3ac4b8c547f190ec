//! Candle and premium loading, plus synthetic sessions for development.
//!
//! Underlying candles are read from CSV with a header
//! `timestamp,open,high,low,close` (extra columns such as `volume` are
//! ignored) and grouped by trading day. Premium series are read from CSV
//! with a header `timestamp,underlying,strike,right,expiry,premium`.
//!
//! Rows are kept in file order: a day whose rows are out of order or have
//! holes is flagged by the session, not repaired here.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;

use orb_core::domain::{Candle, Instrument, OptionRight};

use crate::chain::HistoricalChain;
use crate::error::RunError;

/// Candles grouped by trading day, in day order.
pub type DayCandles = BTreeMap<NaiveDate, Vec<Candle>>;

/// Minute candles per synthetic session (09:15 through 15:29).
pub const SYNTHETIC_SESSION_MINUTES: i64 = 375;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct PremiumRow {
    timestamp: String,
    underlying: String,
    strike: f64,
    right: String,
    expiry: NaiveDate,
    premium: f64,
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_right(raw: &str) -> Option<OptionRight> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "CE" | "CALL" => Some(OptionRight::Ce),
        "PE" | "PUT" => Some(OptionRight::Pe),
        _ => None,
    }
}

/// Read underlying candles from any CSV source.
pub fn read_candles<R: Read>(reader: R, origin: &Path) -> Result<DayCandles, RunError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut days = DayCandles::new();
    for (i, row) in rdr.deserialize::<CandleRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| RunError::BadRow {
            path: origin.to_path_buf(),
            row: i + 1,
            reason: format!("unparseable timestamp {:?}", row.timestamp),
        })?;
        days.entry(timestamp.date())
            .or_default()
            .push(Candle::new(timestamp, row.open, row.high, row.low, row.close));
    }
    Ok(days)
}

/// Load underlying candles from a CSV file.
pub fn load_candles_csv(path: &Path) -> Result<DayCandles, RunError> {
    let file = std::fs::File::open(path).map_err(|e| RunError::io(path, e))?;
    let days = read_candles(file, path)?;
    info!(
        path = %path.display(),
        days = days.len(),
        candles = days.values().map(Vec::len).sum::<usize>(),
        "candles loaded"
    );
    Ok(days)
}

/// Read option premium series from any CSV source.
pub fn read_premiums<R: Read>(reader: R, origin: &Path) -> Result<HistoricalChain, RunError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut chain = HistoricalChain::new();
    for (i, row) in rdr.deserialize::<PremiumRow>().enumerate() {
        let row = row?;
        let bad = |reason: String| RunError::BadRow {
            path: origin.to_path_buf(),
            row: i + 1,
            reason,
        };
        let at = parse_timestamp(&row.timestamp)
            .ok_or_else(|| bad(format!("unparseable timestamp {:?}", row.timestamp)))?;
        let right = parse_right(&row.right).ok_or_else(|| bad(format!("unknown option right {:?}", row.right)))?;
        let instrument = Instrument::new(row.underlying, right, row.strike, row.expiry);
        chain.insert(instrument, at, row.premium);
    }
    Ok(chain)
}

/// Load option premium series from a CSV file.
pub fn load_premiums_csv(path: &Path) -> Result<HistoricalChain, RunError> {
    let file = std::fs::File::open(path).map_err(|e| RunError::io(path, e))?;
    let chain = read_premiums(file, path)?;
    info!(
        path = %path.display(),
        contracts = chain.len(),
        observations = chain.observation_count(),
        "premiums loaded"
    );
    Ok(chain)
}

/// Write candles back out in the format `read_candles` accepts.
pub fn write_candles_csv(days: &DayCandles, path: &Path) -> Result<(), RunError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["timestamp", "open", "high", "low", "close"])?;
    for candle in days.values().flatten() {
        wtr.write_record([
            candle.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.2}", candle.open),
            format!("{:.2}", candle.high),
            format!("{:.2}", candle.low),
            format!("{:.2}", candle.close),
        ])?;
    }
    wtr.flush().map_err(|e| RunError::io(path, e))?;
    Ok(())
}

/// Deterministic BLAKE3 hash over every candle, in day order.
pub fn dataset_hash(days: &DayCandles) -> String {
    let mut hasher = blake3::Hasher::new();
    for candle in days.values().flatten() {
        hasher.update(candle.timestamp.to_string().as_bytes());
        hasher.update(&candle.open.to_le_bytes());
        hasher.update(&candle.high.to_le_bytes());
        hasher.update(&candle.low.to_le_bytes());
        hasher.update(&candle.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic minute sessions for weekdays in `[start, end]`.
///
/// A seeded random walk: the same `label` always yields the same data.
/// Each session runs from `market_open` for 375 minutes and opens with a
/// small gap from the previous close.
pub fn synthetic_days(
    label: &str,
    start: NaiveDate,
    end: NaiveDate,
    first_open: f64,
    market_open: NaiveTime,
) -> DayCandles {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut days = DayCandles::new();
    let mut price = first_open;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        price *= 1.0 + rng.gen_range(-0.004..0.004);
        let drift: f64 = rng.gen_range(-0.000_05..0.000_05);
        let session_start = current.and_time(market_open);
        let mut candles = Vec::with_capacity(SYNTHETIC_SESSION_MINUTES as usize);

        for minute in 0..SYNTHETIC_SESSION_MINUTES {
            let open = price;
            let close = open * (1.0 + drift + rng.gen_range(-0.000_6..0.000_6));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.000_3));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.000_3));
            candles.push(Candle::new(
                session_start + Duration::minutes(minute),
                open,
                high,
                low,
                close,
            ));
            price = close;
        }

        days.insert(current, candles);
        current += Duration::days(1);
    }
    days
}
