//! On-disk layout constants.
//!
//! A database file is a sequence of fixed-size pages. Page 0 is the header
//! page; every later page is a data page. All multi-byte fields are
//! little-endian and are read/written through [`crate::store::codec`].

// ── Pages ───────────────────────────────────────────────────────────

/// Size of every page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Magic/version constant stored in the header page. A file whose header
/// carries a different value is rejected on open.
pub const DATABASE_VERSION: u64 = 3_834_052_067;

// ── Header page (page 0) ────────────────────────────────────────────

/// Offset of the reserved page id field. 8 bytes, currently always 0.
pub const HEADER_PAGE_ID_OFFSET: usize = 0;
/// Offset of the database version field. 8 bytes.
pub const HEADER_VERSION_OFFSET: usize = 8;
/// Offset of the total page count (header page included). 8 bytes.
pub const HEADER_PAGE_COUNT_OFFSET: usize = 16;

// ── Data page header ────────────────────────────────────────────────

/// Offset of the home index shared by every record on the page. 8 bytes.
pub const PAGE_HOME_HASH_OFFSET: usize = 0;
/// Offset of the pristine flag: 1 until the first insert, 0 forever after. 1 byte.
pub const PAGE_FREE_FLAG_OFFSET: usize = 8;
/// Offset of the live record count. 2 bytes.
pub const PAGE_ENTRY_COUNT_OFFSET: usize = 9;
/// Offset of the remaining-bytes counter for the data region. 2 bytes.
pub const PAGE_FREE_SPACE_OFFSET: usize = 11;
/// Offset where packed records begin.
pub const PAGE_DATA_OFFSET: usize = 13;
/// Bytes available for records on an empty data page.
pub const PAGE_DATA_CAPACITY: usize = PAGE_SIZE - PAGE_DATA_OFFSET;

// ── Records ─────────────────────────────────────────────────────────

/// Offset of a record's total length field. 2 bytes.
pub const RECORD_LENGTH_OFFSET: usize = 0;
/// Offset of the key length field. 1 byte.
pub const RECORD_KEY_LENGTH_OFFSET: usize = 2;
/// Offset of the key bytes (NUL-terminated on disk).
pub const RECORD_KEY_OFFSET: usize = 3;
/// Maximum length of a key or a value in bytes.
pub const MAX_STRING_LENGTH: usize = 100;
/// Fixed size of the two-timestamp block at the end of a record.
pub const RECORD_TIMESTAMP_BLOCK: usize = 32;
/// Record bytes not occupied by key or value: length field, two length
/// bytes, two NUL terminators, and the timestamp block.
pub const RECORD_OVERHEAD: usize = 6 + RECORD_TIMESTAMP_BLOCK;
/// Largest possible record (100-byte key, 100-byte value).
pub const MAX_RECORD_SIZE: usize = 2 * MAX_STRING_LENGTH + RECORD_OVERHEAD;

// ── Sizing ──────────────────────────────────────────────────────────

/// Assumed average record size when sizing a new database file.
pub const AVG_RECORD_SIZE: u64 = 210;

/// Number of page and record buffers held by a [`crate::store::pool::BufferPool`].
pub const POOL_SIZE: usize = 4;
