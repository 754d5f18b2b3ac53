use std::io::Write;

use serde::Serialize;

use crate::cli::wprintln;
use crate::store::constants::{DATABASE_VERSION, PAGE_SIZE};
use crate::store::engine::Database;
use crate::KvError;

/// Options for the `pkv info` subcommand.
pub struct InfoOptions {
    /// Path to the database file.
    pub path: String,
    /// Output in JSON format.
    pub json: bool,
}

#[derive(Serialize)]
struct InfoReport<'a> {
    path: &'a str,
    version: u64,
    page_size: usize,
    page_count: u64,
    data_pages: u64,
    file_bytes: u64,
}

/// Print header-page metadata for a database file.
///
/// Reads only page 0; the version check happens as part of the open.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    let db = Database::open(&opts.path)?;
    let page_count = db.page_count();

    let report = InfoReport {
        path: &opts.path,
        version: DATABASE_VERSION,
        page_size: PAGE_SIZE,
        page_count,
        data_pages: page_count - 1,
        file_bytes: page_count * PAGE_SIZE as u64,
    };

    if opts.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| KvError::Io(format!("cannot serialize report: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(writer, "path:       {}", report.path)?;
    wprintln!(writer, "version:    {}", report.version)?;
    wprintln!(writer, "page size:  {}", report.page_size)?;
    wprintln!(writer, "pages:      {}", report.page_count)?;
    wprintln!(writer, "data pages: {}", report.data_pages)?;
    wprintln!(writer, "file size:  {} bytes", report.file_bytes)?;
    Ok(())
}
