//! Fixed buffer pool for page and record I/O.
//!
//! All page reads and record staging go through a small pool of
//! pre-allocated buffers so that the hot path never touches the global
//! allocator. A buffer is checked out by moving it from its slot into a
//! [`PageBuffer`] or [`RecordBuffer`] handle and returned by moving it
//! back; the move makes handing the same slot out twice unrepresentable.
//!
//! Buffers are not zeroed on release. Anything that formats a buffer
//! (page initialization, record building) clears it first.

use crate::store::constants::{MAX_RECORD_SIZE, PAGE_SIZE, POOL_SIZE};
use crate::KvError;

/// A page-sized buffer checked out of a [`BufferPool`].
pub struct PageBuffer {
    slot: usize,
    data: Box<[u8; PAGE_SIZE]>,
}

/// A record-sized buffer checked out of a [`BufferPool`].
pub struct RecordBuffer {
    slot: usize,
    data: Box<[u8; MAX_RECORD_SIZE]>,
}

impl std::ops::Deref for PageBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data[..]
    }
}

impl std::ops::DerefMut for PageBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }
}

impl std::ops::Deref for RecordBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data[..]
    }
}

impl std::ops::DerefMut for RecordBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }
}

/// Process-local pool of [`POOL_SIZE`] page buffers and record buffers.
///
/// The pool is sized for the engine's worst case (one probe buffer, one
/// target-page buffer, and two staged records during an overwriting
/// insert) with headroom. Exhaustion is reported, never waited on.
pub struct BufferPool {
    pages: Vec<Option<Box<[u8; PAGE_SIZE]>>>,
    records: Vec<Option<Box<[u8; MAX_RECORD_SIZE]>>>,
}

impl BufferPool {
    /// Pre-allocate all buffers. This is the only allocating call.
    pub fn new() -> Self {
        BufferPool {
            pages: (0..POOL_SIZE)
                .map(|_| Some(Box::new([0u8; PAGE_SIZE])))
                .collect(),
            records: (0..POOL_SIZE)
                .map(|_| Some(Box::new([0u8; MAX_RECORD_SIZE])))
                .collect(),
        }
    }

    /// Check out a page buffer, or fail with [`KvError::PoolExhausted`].
    pub fn acquire_page(&mut self) -> Result<PageBuffer, KvError> {
        for (slot, entry) in self.pages.iter_mut().enumerate() {
            if let Some(data) = entry.take() {
                return Ok(PageBuffer { slot, data });
            }
        }
        Err(KvError::PoolExhausted("no free page buffer".into()))
    }

    /// Check out a record buffer, or fail with [`KvError::PoolExhausted`].
    pub fn acquire_record(&mut self) -> Result<RecordBuffer, KvError> {
        for (slot, entry) in self.records.iter_mut().enumerate() {
            if let Some(data) = entry.take() {
                return Ok(RecordBuffer { slot, data });
            }
        }
        Err(KvError::PoolExhausted("no free record buffer".into()))
    }

    /// Return a page buffer to its slot.
    pub fn release_page(&mut self, buf: PageBuffer) {
        debug_assert!(self.pages[buf.slot].is_none());
        self.pages[buf.slot] = Some(buf.data);
    }

    /// Return a record buffer to its slot.
    pub fn release_record(&mut self, buf: RecordBuffer) {
        debug_assert!(self.records[buf.slot].is_none());
        self.records[buf.slot] = Some(buf.data);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_cycle() {
        let mut pool = BufferPool::new();
        let page = pool.acquire_page().unwrap();
        assert_eq!(page.len(), PAGE_SIZE);
        pool.release_page(page);

        let record = pool.acquire_record().unwrap();
        assert_eq!(record.len(), MAX_RECORD_SIZE);
        pool.release_record(record);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = BufferPool::new();
        let held: Vec<_> = (0..POOL_SIZE).map(|_| pool.acquire_page().unwrap()).collect();
        assert!(matches!(
            pool.acquire_page(),
            Err(KvError::PoolExhausted(_))
        ));

        for buf in held {
            pool.release_page(buf);
        }
        assert!(pool.acquire_page().is_ok());
    }

    #[test]
    fn test_record_pool_independent_of_page_pool() {
        let mut pool = BufferPool::new();
        let _pages: Vec<_> = (0..POOL_SIZE).map(|_| pool.acquire_page().unwrap()).collect();
        assert!(pool.acquire_record().is_ok());
    }

    #[test]
    fn test_contents_survive_release() {
        let mut pool = BufferPool::new();
        let mut page = pool.acquire_page().unwrap();
        page[17] = 0xAB;
        pool.release_page(page);
        // Not zeroed on release; the next checkout of the slot sees the
        // old bytes.
        let page = pool.acquire_page().unwrap();
        assert_eq!(page[17], 0xAB);
    }
}
