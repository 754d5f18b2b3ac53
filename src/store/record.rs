//! Variable-length key/value records.
//!
//! A record is a self-describing blob packed into a data page:
//!
//! ```text
//! total_length (2) | key_length (1) | key + NUL | value_length (1) |
//! value + NUL | first_seconds (8) | first_nanos (8) | last_seconds (8) |
//! last_nanos (8)
//! ```
//!
//! Keys and values are 1–100 bytes, so the largest record is 238 bytes
//! and a record's length always fits in the first byte of its length
//! field. Records exist in two forms: [`RecordView`], a zero-copy
//! overlay on a page's bytes used while scanning under a page lock, and
//! [`OwnedRecord`], which owns a pool buffer and is used to build new
//! records or to carry one across a lock release (page bytes cannot be
//! trusted after the page is unlocked).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::store::codec::{read_uint, write_uint};
use crate::store::constants::{
    MAX_STRING_LENGTH, RECORD_KEY_LENGTH_OFFSET, RECORD_KEY_OFFSET, RECORD_LENGTH_OFFSET,
    RECORD_OVERHEAD,
};
use crate::store::pool::RecordBuffer;
use crate::KvError;

/// Wall-clock instant with nanosecond precision, seconds since the Unix
/// epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u64,
}

impl Timestamp {
    /// The current wall clock. Monotonicity is not guaranteed; it
    /// follows the system clock.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp {
            seconds: elapsed.as_secs(),
            nanos: u64::from(elapsed.subsec_nanos()),
        }
    }
}

/// Reject keys and values that are empty or longer than
/// [`MAX_STRING_LENGTH`].
pub fn check_string(what: &str, bytes: &[u8]) -> Result<(), KvError> {
    if bytes.is_empty() || bytes.len() > MAX_STRING_LENGTH {
        return Err(KvError::Argument(format!(
            "{} must be 1-{} bytes, got {}",
            what,
            MAX_STRING_LENGTH,
            bytes.len()
        )));
    }
    Ok(())
}

// Offset helpers over the raw record layout. The value region and the
// timestamp block float behind the variable-length key and value.

fn key_len(buf: &[u8]) -> usize {
    buf[RECORD_KEY_LENGTH_OFFSET] as usize
}

fn value_len_offset(buf: &[u8]) -> usize {
    // key bytes + NUL follow the key length byte
    RECORD_KEY_OFFSET + key_len(buf) + 1
}

fn value_offset(buf: &[u8]) -> usize {
    value_len_offset(buf) + 1
}

fn value_len(buf: &[u8]) -> usize {
    buf[value_len_offset(buf)] as usize
}

fn first_ts_offset(buf: &[u8]) -> usize {
    // value bytes + NUL precede the timestamp block
    value_offset(buf) + value_len(buf) + 1
}

fn read_timestamp(buf: &[u8], offset: usize) -> Timestamp {
    Timestamp {
        seconds: read_uint(buf, offset, 8),
        nanos: read_uint(buf, offset + 8, 8),
    }
}

fn write_timestamp(buf: &mut [u8], offset: usize, ts: Timestamp) {
    write_uint(buf, offset, 8, ts.seconds);
    write_uint(buf, offset + 8, 8, ts.nanos);
}

/// Zero-copy view of a record inside a page buffer.
#[derive(Clone, Copy)]
pub struct RecordView<'a> {
    buf: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Overlay a record on `buf`, which must start at the record's first
    /// byte. Returns `None` if the slice is shorter than the embedded
    /// total length or too short to hold any record at all.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        if buf.len() < RECORD_OVERHEAD {
            return None;
        }
        let total = read_uint(buf, RECORD_LENGTH_OFFSET, 2) as usize;
        if total < RECORD_OVERHEAD || total > buf.len() {
            return None;
        }
        Some(RecordView { buf: &buf[..total] })
    }

    /// Total record length in bytes.
    pub fn total_length(&self) -> usize {
        self.buf.len()
    }

    /// Key bytes, terminator excluded.
    pub fn key(&self) -> &'a [u8] {
        &self.buf[RECORD_KEY_OFFSET..RECORD_KEY_OFFSET + key_len(self.buf)]
    }

    /// Value bytes, terminator excluded.
    pub fn value(&self) -> &'a [u8] {
        let offset = value_offset(self.buf);
        &self.buf[offset..offset + value_len(self.buf)]
    }

    /// Creation timestamp.
    pub fn first_timestamp(&self) -> Timestamp {
        read_timestamp(self.buf, first_ts_offset(self.buf))
    }

    /// Last-modification timestamp.
    pub fn last_timestamp(&self) -> Timestamp {
        read_timestamp(self.buf, first_ts_offset(self.buf) + 16)
    }

    /// The record's raw bytes, exactly `total_length` long.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }
}

/// A record backed by a pool buffer it owns.
pub struct OwnedRecord {
    buf: RecordBuffer,
}

impl OwnedRecord {
    /// Format a fresh record into `buf`: zero it, encode key and value,
    /// stamp both timestamps with the current wall clock.
    pub fn from_data(mut buf: RecordBuffer, key: &[u8], value: &[u8]) -> Result<Self, KvError> {
        check_string("key", key)?;
        check_string("value", value)?;

        buf.fill(0);
        write_uint(&mut buf, RECORD_KEY_LENGTH_OFFSET, 1, key.len() as u64);
        buf[RECORD_KEY_OFFSET..RECORD_KEY_OFFSET + key.len()].copy_from_slice(key);

        let vlen_offset = value_len_offset(&buf);
        write_uint(&mut buf, vlen_offset, 1, value.len() as u64);
        buf[vlen_offset + 1..vlen_offset + 1 + value.len()].copy_from_slice(value);

        let total = key.len() + value.len() + RECORD_OVERHEAD;
        write_uint(&mut buf, RECORD_LENGTH_OFFSET, 2, total as u64);

        let now = Timestamp::now();
        let ts_offset = first_ts_offset(&buf);
        write_timestamp(&mut buf, ts_offset, now);
        write_timestamp(&mut buf, ts_offset + 16, now);

        Ok(OwnedRecord { buf })
    }

    /// Clone a page-resident record into an owned buffer.
    pub fn from_view(mut buf: RecordBuffer, view: &RecordView<'_>) -> Self {
        let bytes = view.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        OwnedRecord { buf }
    }

    /// Replace the value in place: the timestamp block moves to follow
    /// the new value, `last_*` is set to `ts`, and the total length is
    /// recomputed. The creation timestamp is untouched.
    pub fn update_value(&mut self, value: &[u8], ts: Timestamp) -> Result<(), KvError> {
        check_string("value", value)?;

        let first = self.first_timestamp();
        let vlen_offset = value_len_offset(&self.buf);
        write_uint(&mut self.buf, vlen_offset, 1, value.len() as u64);

        // Re-derive offsets now that the value length byte has changed.
        let offset = vlen_offset + 1;
        self.buf[offset..offset + value.len()].copy_from_slice(value);
        self.buf[offset + value.len()] = 0;

        let key_len = read_uint(&self.buf, RECORD_KEY_LENGTH_OFFSET, 1) as usize;
        let total = key_len + value.len() + RECORD_OVERHEAD;
        write_uint(&mut self.buf, RECORD_LENGTH_OFFSET, 2, total as u64);

        let ts_offset = first_ts_offset(&self.buf);
        write_timestamp(&mut self.buf, ts_offset, first);
        write_timestamp(&mut self.buf, ts_offset + 16, ts);
        Ok(())
    }

    /// Carry an earlier creation timestamp forward (insert-overwrite).
    pub fn set_first_timestamp(&mut self, ts: Timestamp) {
        let offset = first_ts_offset(&self.buf);
        write_timestamp(&mut self.buf, offset, ts);
    }

    pub fn total_length(&self) -> usize {
        read_uint(&self.buf, RECORD_LENGTH_OFFSET, 2) as usize
    }

    pub fn key(&self) -> &[u8] {
        &self.buf[RECORD_KEY_OFFSET..RECORD_KEY_OFFSET + key_len(&self.buf)]
    }

    pub fn value(&self) -> &[u8] {
        let offset = value_offset(&self.buf);
        &self.buf[offset..offset + value_len(&self.buf)]
    }

    pub fn first_timestamp(&self) -> Timestamp {
        read_timestamp(&self.buf, first_ts_offset(&self.buf))
    }

    pub fn last_timestamp(&self) -> Timestamp {
        read_timestamp(&self.buf, first_ts_offset(&self.buf) + 16)
    }

    /// The record's raw bytes, exactly `total_length` long.
    pub fn as_bytes(&self) -> &[u8] {
        let total = self.total_length();
        &self.buf[..total]
    }

    /// Give the underlying buffer back so it can be returned to the pool.
    pub fn into_buffer(self) -> RecordBuffer {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::constants::MAX_RECORD_SIZE;
    use crate::store::pool::BufferPool;

    fn build(key: &[u8], value: &[u8]) -> (BufferPool, OwnedRecord) {
        let mut pool = BufferPool::new();
        let buf = pool.acquire_record().unwrap();
        let record = OwnedRecord::from_data(buf, key, value).unwrap();
        (pool, record)
    }

    #[test]
    fn test_build_and_read_back() {
        let (_pool, record) = build(b"language", b"rust");
        assert_eq!(record.key(), b"language");
        assert_eq!(record.value(), b"rust");
        assert_eq!(record.total_length(), 8 + 4 + RECORD_OVERHEAD);
        assert_eq!(record.first_timestamp(), record.last_timestamp());
        assert!(record.first_timestamp().seconds > 0);
    }

    #[test]
    fn test_view_over_owned_bytes() {
        let (_pool, record) = build(b"k", b"v");
        let view = RecordView::parse(record.as_bytes()).unwrap();
        assert_eq!(view.key(), b"k");
        assert_eq!(view.value(), b"v");
        assert_eq!(view.total_length(), record.total_length());
        assert_eq!(view.first_timestamp(), record.first_timestamp());
    }

    #[test]
    fn test_max_size_record() {
        let key = [b'k'; MAX_STRING_LENGTH];
        let value = [b'v'; MAX_STRING_LENGTH];
        let (_pool, record) = build(&key, &value);
        assert_eq!(record.total_length(), MAX_RECORD_SIZE);
        assert_eq!(record.key(), &key[..]);
        assert_eq!(record.value(), &value[..]);
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire_record().unwrap();
        assert!(matches!(
            OwnedRecord::from_data(buf, b"", b"v"),
            Err(KvError::Argument(_))
        ));

        let buf = pool.acquire_record().unwrap();
        let long = [b'x'; MAX_STRING_LENGTH + 1];
        assert!(matches!(
            OwnedRecord::from_data(buf, b"k", &long),
            Err(KvError::Argument(_))
        ));
    }

    #[test]
    fn test_update_value_moves_timestamps() {
        let (_pool, mut record) = build(b"key", b"short");
        let first = record.first_timestamp();

        let ts = Timestamp {
            seconds: first.seconds + 5,
            nanos: 123,
        };
        record.update_value(b"a-much-longer-value", ts).unwrap();

        assert_eq!(record.value(), b"a-much-longer-value");
        assert_eq!(record.first_timestamp(), first);
        assert_eq!(record.last_timestamp(), ts);
        assert_eq!(record.total_length(), 3 + 19 + RECORD_OVERHEAD);

        // Shrinking works too and re-terminates the value.
        record.update_value(b"v", ts).unwrap();
        assert_eq!(record.value(), b"v");
        assert_eq!(record.total_length(), 3 + 1 + RECORD_OVERHEAD);
        assert_eq!(record.first_timestamp(), first);
    }

    #[test]
    fn test_set_first_timestamp() {
        let (_pool, mut record) = build(b"k", b"v");
        let earlier = Timestamp {
            seconds: 1,
            nanos: 2,
        };
        record.set_first_timestamp(earlier);
        assert_eq!(record.first_timestamp(), earlier);
        assert_ne!(record.last_timestamp(), earlier);
    }

    #[test]
    fn test_parse_rejects_short_slices() {
        assert!(RecordView::parse(&[0u8; 4]).is_none());

        let (_pool, record) = build(b"key", b"value");
        let bytes = record.as_bytes();
        assert!(RecordView::parse(&bytes[..bytes.len() - 1]).is_none());
    }

    #[test]
    fn test_clone_from_view() {
        let (mut pool, record) = build(b"clone-me", b"payload");
        let view = RecordView::parse(record.as_bytes()).unwrap();
        let copy = OwnedRecord::from_view(pool.acquire_record().unwrap(), &view);
        assert_eq!(copy.key(), b"clone-me");
        assert_eq!(copy.value(), b"payload");
        assert_eq!(copy.first_timestamp(), record.first_timestamp());
        assert_eq!(copy.as_bytes(), record.as_bytes());
    }
}
