use std::io::Write;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::store::engine::Database;
use crate::store::record::Timestamp;
use crate::KvError;

/// Options for the `pkv ts` subcommand.
pub struct TsOptions {
    /// Path to the database file.
    pub path: String,
    /// Key to look up.
    pub key: String,
    /// Output in JSON format.
    pub json: bool,
}

#[derive(Serialize)]
struct TsReport<'a> {
    key: &'a str,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last: Option<String>,
}

/// Format a stored timestamp as `YYYY-MM-DD HH:MM:SS.mmm` UTC.
///
/// Nanosecond precision is stored on disk but truncated to milliseconds
/// for display.
pub fn format_timestamp(ts: Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp(ts.seconds as i64, ts.nanos as u32) {
        Some(utc) => utc.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format!("invalid timestamp ({}s {}ns)", ts.seconds, ts.nanos),
    }
}

/// Print a record's creation and last-modification timestamps.
pub fn execute(opts: &TsOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    let mut db = Database::open(&opts.path)?;
    let entry = db.get(opts.key.as_bytes())?;

    if opts.json {
        let report = match &entry {
            Some(entry) => TsReport {
                key: &opts.key,
                found: true,
                first: Some(format_timestamp(entry.first)),
                last: Some(format_timestamp(entry.last)),
            },
            None => TsReport {
                key: &opts.key,
                found: false,
                first: None,
                last: None,
            },
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| KvError::Io(format!("cannot serialize report: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    match entry {
        Some(entry) => {
            wprintln!(writer, "first: {}", format_timestamp(entry.first))?;
            wprintln!(writer, "last:  {}", format_timestamp(entry.last))?;
        }
        None => wprintln!(writer, "{}", "not found".yellow())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        let ts = Timestamp {
            seconds: 1_700_000_000,
            nanos: 123_456_789,
        };
        assert_eq!(format_timestamp(ts), "2023-11-14 22:13:20.123");
    }

    #[test]
    fn test_format_timestamp_epoch() {
        let ts = Timestamp {
            seconds: 0,
            nanos: 0,
        };
        assert_eq!(format_timestamp(ts), "1970-01-01 00:00:00.000");
    }
}
