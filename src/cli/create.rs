use std::io::Write;

use crate::cli::wprintln;
use crate::store::engine::Database;
use crate::KvError;

/// Options for the `pkv create` subcommand.
pub struct CreateOptions {
    /// Path of the database file to create.
    pub path: String,
    /// Expected number of records; fixes the page count for the file's
    /// lifetime.
    pub elements: u64,
}

/// Create a new database file sized for roughly `elements` records.
///
/// Fails if the file already exists: the page count cannot be changed
/// after creation, so an accidental overwrite would be unrecoverable.
pub fn execute(opts: &CreateOptions, writer: &mut dyn Write) -> Result<(), KvError> {
    Database::create(&opts.path, opts.elements)?;

    // Reopen to report the geometry; this also re-verifies the header
    // that was just written.
    let db = Database::open(&opts.path)?;
    wprintln!(
        writer,
        "created {} ({} pages, sized for ~{} records)",
        opts.path,
        db.page_count(),
        opts.elements
    )?;
    Ok(())
}
