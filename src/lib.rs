//! Single-file paged hash-table key/value store.
//!
//! `pagekv` keeps all state in one file of fixed 4096-byte pages: a
//! header page followed by data pages that form a static hash table with
//! open addressing (linear probing). Each key hashes to a home page; a
//! full home page spills forward along a ring of data pages. Concurrent
//! processes share a database safely through advisory byte-range locks
//! taken per page, so readers and writers of unrelated pages never wait
//! on each other.
//!
//! # CLI Reference
//!
//! The `pkv` binary exposes the store on the command line.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `pkv create <path> <n>` | Create a database sized for roughly `n` records |
//! | `pkv set <path> <key> <value>` | Insert or overwrite a record |
//! | `pkv get <path> <key>` | Print a record's value |
//! | `pkv del <path> <key>` | Delete a record |
//! | `pkv ts <path> <key>` | Print a record's creation and modification times |
//! | `pkv info <path>` | Print header-page metadata |
//!
//! All subcommands accept `--color <auto|always|never>` and
//! `--output <file>`; `get`, `ts`, and `info` also accept `--json`.
//!
//! # Library API
//!
//! ```no_run
//! use pagekv::store::engine::Database;
//!
//! Database::create("kv.pkv", 1000).unwrap();
//! let mut db = Database::open("kv.pkv").unwrap();
//! db.set(b"name", b"ada").unwrap();
//! let entry = db.get(b"name").unwrap().unwrap();
//! assert_eq!(entry.value, b"ada");
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`store::engine`] | Open-addressing engine: probing, locking, get/set/delete |
//! | [`store::file`] | File creation/open, page I/O, per-page advisory locks |
//! | [`store::data_page`] | Data page layout and in-page record operations |
//! | [`store::header_page`] | Header page (version, page count) |
//! | [`store::record`] | Record layout: zero-copy views and owned builders |
//! | [`store::pool`] | Fixed pool of page and record buffers |
//! | [`store::codec`] | Little-endian field codec |
//! | [`store::constants`] | On-disk layout constants |
//!
//! Keys and values are byte strings of 1–100 bytes. Every record carries
//! a creation and a last-modification timestamp; overwriting a key
//! preserves the creation time.

#[cfg(feature = "cli")]
pub mod cli;
pub mod store;

use thiserror::Error;

/// Errors returned by `pagekv` operations.
///
/// A missing key is not an error; lookups report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum KvError {
    /// The file cannot be created or opened (missing, wrong permissions,
    /// or already exists on create).
    #[error("cannot open database: {0}")]
    CannotOpen(String),

    /// The header page's version constant does not match this build.
    #[error("version mismatch: {0}")]
    BadVersion(String),

    /// A read, write, or seek failed or came up short.
    #[error("I/O error: {0}")]
    Io(String),

    /// A page lock acquisition was interrupted.
    #[error("lock error: {0}")]
    Lock(String),

    /// The buffer pool has no free buffer.
    #[error("buffer pool exhausted: {0}")]
    PoolExhausted(String),

    /// A key, value, or CLI argument is out of range.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Every page in the record's probe chain is full.
    #[error("database full: {0}")]
    Full(String),
}
