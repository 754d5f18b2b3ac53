use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::store::engine::Database;
use crate::store::record::Timestamp;
use crate::KvError;

/// Options for the `pkv get` subcommand.
pub struct GetOptions {
    /// Path to the database file.
    pub path: String,
    /// Key to look up.
    pub key: String,
    /// Output in JSON format.
    pub json: bool,
}

#[derive(Serialize)]
struct GetReport<'a> {
    key: &'a str,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last: Option<Timestamp>,
}

/// Look up a key and print its value, or `not found`.
///
/// A missing key is not an error: the command still exits 0 so that
/// shell scripts can probe for keys without `set -e` gymnastics.
pub fn execute(opts: &GetOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    let mut db = Database::open(&opts.path)?;
    let entry = db.get(opts.key.as_bytes())?;

    if opts.json {
        let report = match &entry {
            Some(entry) => GetReport {
                key: &opts.key,
                found: true,
                value: Some(String::from_utf8_lossy(&entry.value).into_owned()),
                first: Some(entry.first),
                last: Some(entry.last),
            },
            None => GetReport {
                key: &opts.key,
                found: false,
                value: None,
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
        Some(entry) => wprintln!(
            writer,
            "value: {}",
            String::from_utf8_lossy(&entry.value).bold()
        )?,
        None => wprintln!(writer, "{}", "not found".yellow())?,
    }
    Ok(())
}
