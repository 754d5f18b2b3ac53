//! On-disk format and paged hash-table engine.
//!
//! This module contains the layers of the store, leaves first: the
//! little-endian field codec, the fixed buffer pool, record and page
//! views over raw bytes, the file layer with per-page advisory locks,
//! and the probing engine that ties them together.
//!
//! Start with [`engine::Database`] to open or create a database file,
//! then use its `get`/`set`/`delete` methods.

pub mod codec;
pub mod constants;
pub mod data_page;
pub mod engine;
pub mod file;
pub mod header_page;
pub mod pool;
pub mod record;
