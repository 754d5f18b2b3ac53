use std::io::Write;

use colored::Colorize;

use crate::cli::wprintln;
use crate::store::engine::Database;
use crate::KvError;

/// Options for the `pkv del` subcommand.
pub struct DelOptions {
    /// Path to the database file.
    pub path: String,
    /// Key to delete.
    pub key: String,
}

/// Delete a record if present. Deleting an absent key reports
/// `not found` and exits 0; the operation is idempotent.
pub fn execute(opts: &DelOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    let mut db = Database::open(&opts.path)?;
    match db.delete(opts.key.as_bytes())? {
        Some(_) => wprintln!(writer, "deleted")?,
        None => wprintln!(writer, "{}", "not found".yellow())?,
    }
    Ok(())
}
