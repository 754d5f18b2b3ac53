use std::io::Write;

use crate::cli::wprintln;
use crate::store::engine::Database;
use crate::KvError;

/// Options for the `pkv set` subcommand.
pub struct SetOptions {
    /// Path to the database file.
    pub path: String,
    /// Key to store under.
    pub key: String,
    /// Value to store.
    pub value: String,
}

/// Insert a record, overwriting any existing value for the key.
///
/// Overwriting keeps the record's creation timestamp and refreshes its
/// last-modification timestamp.
pub fn execute(opts: &SetOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    let mut db = Database::open(&opts.path)?;
    db.set(opts.key.as_bytes(), opts.value.as_bytes())?;
    wprintln!(writer, "ok")?;
    Ok(())
}
