//! Open-addressing hash table over the data pages.
//!
//! A key's home page is `xxh64(key, 0) mod (N-1) + 1`, which always
//! lands inside the data-page range `[1, N-1]`. When the home page
//! cannot serve an operation, probing walks forward over the data pages
//! as a ring, visiting at most `N-1` pages.
//!
//! Probing is predicate-driven: [`find_page`](Database) shared-locks and
//! reads each visited page, then asks a closure whether the page is the
//! target ([`ProbeOutcome::Hit`], lock stays held for the caller),
//! definitely rules out the rest of the chain ([`ProbeOutcome::Stop`]),
//! or is simply not it ([`ProbeOutcome::Miss`]). Stopping early at a
//! pristine page is what keeps lookups O(chain) without tombstones: a
//! page that has never been inserted into can never sit in the middle of
//! an occupied probe chain. Pages merely emptied by deletes stay
//! non-free and are probed through.
//!
//! Coordination is strictly cross-process: at most one data-page lock is
//! held at a time, so no lock cycle is possible, and every multi-phase
//! operation (delete's shared-to-exclusive upgrade, insert's
//! find/delete/insert sequence) fully releases before re-acquiring.

use std::path::Path;

use xxhash_rust::xxh64::xxh64;

use crate::store::data_page::DataPage;
use crate::store::file::{DbFile, LockKind};
use crate::store::pool::BufferPool;
use crate::store::record::{check_string, OwnedRecord, RecordView, Timestamp};
use crate::KvError;

/// Predicate verdict for one probed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Target page: stop probing and keep its shared lock held.
    Hit,
    /// Not this page: release and move to the next page in the ring.
    Miss,
    /// No page further along the chain can match: give up now.
    Stop,
}

/// A record copied out of the file, safe to hold after all locks are
/// released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: Vec<u8>,
    pub first: Timestamp,
    pub last: Timestamp,
}

/// Home page index for `key` in a file of `page_count` total pages.
pub fn home_index(key: &[u8], page_count: u64) -> u64 {
    xxh64(key, 0) % (page_count - 1) + 1
}

/// An open database: the file plus the buffer pool backing its I/O.
pub struct Database {
    file: DbFile,
    pool: BufferPool,
}

impl Database {
    /// Create a database file sized for roughly `requested_elements`
    /// records.
    pub fn create<P: AsRef<Path>>(path: P, requested_elements: u64) -> Result<(), KvError> {
        let mut pool = BufferPool::new();
        DbFile::create(path, requested_elements, &mut pool)
    }

    /// Open an existing database file, verifying its version.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KvError> {
        Self::open_with_pool(path, BufferPool::new())
    }

    /// Open with a caller-supplied buffer pool instead of a fresh one.
    ///
    /// The pool is the engine's only scratch memory; handing one in lets
    /// callers bound it together with other engines or starve it
    /// deliberately in tests.
    pub fn open_with_pool<P: AsRef<Path>>(path: P, mut pool: BufferPool) -> Result<Self, KvError> {
        let file = DbFile::open(path, &mut pool)?;
        Ok(Database { file, pool })
    }

    /// Total pages in the file, header page included.
    pub fn page_count(&self) -> u64 {
        self.file.page_count()
    }

    /// Look up `key`, copying the record out if present.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Entry>, KvError> {
        check_string("key", key)?;
        let home = home_index(key, self.file.page_count());

        let Some(index) = self.probe_for_key(key, home)? else {
            return Ok(None);
        };

        // The probe left a shared lock on the target page; re-read it
        // under that lock and copy the record out before releasing. Every
        // failure exit must give the lock and the buffer back.
        let mut buf = match self.pool.acquire_page() {
            Ok(buf) => buf,
            Err(e) => {
                let _ = self.file.unlock(index);
                return Err(e);
            }
        };
        if let Err(e) = self.file.read_page(index, &mut buf) {
            self.pool.release_page(buf);
            let _ = self.file.unlock(index);
            return Err(e);
        }
        let entry = {
            let page = DataPage::new(&mut buf);
            page.find(key).map(|record| Entry {
                value: record.value().to_vec(),
                first: record.first_timestamp(),
                last: record.last_timestamp(),
            })
        };
        self.pool.release_page(buf);
        self.file.unlock(index)?;
        Ok(entry)
    }

    /// Insert `key`/`value`, overwriting any existing record for the key
    /// while preserving its creation timestamp.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        check_string("key", key)?;
        check_string("value", value)?;
        let home = home_index(key, self.file.page_count());

        let record_buf = self.pool.acquire_record()?;
        let mut record = OwnedRecord::from_data(record_buf, key, value)?;

        // The record buffer is released here and nowhere else, so every
        // exit from the placement sequence hands it back.
        let result = self.set_record(key, &mut record, home);
        self.pool.release_record(record.into_buffer());
        result
    }

    /// Place `record` for `key`: pick a landing page, purge any stale
    /// copy of the key, and append under an exclusive lock.
    fn set_record(
        &mut self,
        key: &[u8],
        record: &mut OwnedRecord,
        home: u64,
    ) -> Result<(), KvError> {
        let record_length = record.total_length();

        // Pick a landing page: the first page in the chain that is
        // empty, or already holds this home's records and has room.
        let landing = self.find_page(
            |page: &DataPage, _| {
                if page.entry_count() == 0 {
                    ProbeOutcome::Hit
                } else if page.home_hash() == home && record_length <= page.free_space() {
                    ProbeOutcome::Hit
                } else {
                    ProbeOutcome::Miss
                }
            },
            home,
        )?;
        let Some(index) = landing else {
            return Err(KvError::Full(format!(
                "no page can hold a {}-byte record",
                record_length
            )));
        };

        // The landing lock is dropped before the delete pass so the two
        // phases never hold locks on two pages at once. A stale copy of
        // the key may live on any page of the chain, not necessarily the
        // landing page; deleting re-probes from the home index.
        self.file.unlock(index)?;
        let previous = self.delete(key)?;
        if let Some(prior) = previous {
            record.set_first_timestamp(prior.first);
        }

        // From the exclusive acquisition on, every failure exit must
        // release the lock and any page buffer taken after it.
        self.file.lock(index, LockKind::Exclusive)?;
        let mut buf = match self.pool.acquire_page() {
            Ok(buf) => buf,
            Err(e) => {
                let _ = self.file.unlock(index);
                return Err(e);
            }
        };
        if let Err(e) = self.file.read_page(index, &mut buf) {
            self.pool.release_page(buf);
            let _ = self.file.unlock(index);
            return Err(e);
        }
        let inserted = {
            let mut page = DataPage::new(&mut buf);
            // Re-check under the exclusive lock: a concurrent writer may
            // have filled the page, or claimed a once-empty page for a
            // different home, between the probe and this acquisition.
            let still_landing = page.entry_count() == 0 || page.home_hash() == home;
            still_landing && page.insert(record, home)
        };
        let write_result = if inserted {
            self.file.write_page(&buf, index, false)
        } else {
            // The page is untouched.
            Err(KvError::Full(format!(
                "page {} changed before the record could be inserted",
                index
            )))
        };
        self.pool.release_page(buf);
        let unlock_result = self.file.unlock(index);
        write_result.and(unlock_result)
    }

    /// Delete `key`, returning the removed record. Idempotent: deleting
    /// an absent key reports `None` and changes nothing.
    pub fn delete(&mut self, key: &[u8]) -> Result<Option<Entry>, KvError> {
        check_string("key", key)?;
        let home = home_index(key, self.file.page_count());

        let Some(index) = self.probe_for_key(key, home)? else {
            return Ok(None);
        };

        // Upgrade by release-then-acquire; holding the shared lock while
        // waiting for exclusive would deadlock against another upgrader.
        // The re-read below re-checks the key, so a concurrent delete in
        // the gap simply turns this one into a no-op.
        self.file.unlock(index)?;
        self.file.lock(index, LockKind::Exclusive)?;

        // From here every failure exit must release the exclusive lock
        // and both buffers.
        let mut buf = match self.pool.acquire_page() {
            Ok(buf) => buf,
            Err(e) => {
                let _ = self.file.unlock(index);
                return Err(e);
            }
        };
        let mut victim = match self.pool.acquire_record() {
            Ok(victim) => victim,
            Err(e) => {
                self.pool.release_page(buf);
                let _ = self.file.unlock(index);
                return Err(e);
            }
        };
        if let Err(e) = self.file.read_page(index, &mut buf) {
            self.pool.release_page(buf);
            self.pool.release_record(victim);
            let _ = self.file.unlock(index);
            return Err(e);
        }
        let deleted = {
            let mut page = DataPage::new(&mut buf);
            page.delete(key, &mut victim)
        };

        let write_result = if deleted {
            self.file.write_page(&buf, index, false)
        } else {
            Ok(())
        };
        let entry = if deleted && write_result.is_ok() {
            RecordView::parse(&victim).map(|record| Entry {
                value: record.value().to_vec(),
                first: record.first_timestamp(),
                last: record.last_timestamp(),
            })
        } else {
            None
        };

        self.pool.release_page(buf);
        self.pool.release_record(victim);
        let unlock_result = self.file.unlock(index);
        write_result.and(unlock_result)?;
        Ok(entry)
    }

    /// Probe for the page holding `key`: stop at pristine pages, match
    /// only pages that belong to this key's home index.
    fn probe_for_key(&mut self, key: &[u8], home: u64) -> Result<Option<u64>, KvError> {
        self.find_page(
            |page: &DataPage, _| {
                if page.is_free() {
                    ProbeOutcome::Stop
                } else if page.home_hash() == home && page.find(key).is_some() {
                    ProbeOutcome::Hit
                } else {
                    ProbeOutcome::Miss
                }
            },
            home,
        )
    }

    /// Walk the probe ring from `from`, shared-locking and reading each
    /// page and asking `predicate` for a verdict. On a hit the page's
    /// shared lock is left held and its index returned; the caller must
    /// unlock it. Visits at most `page_count - 1` pages.
    fn find_page<F>(&mut self, mut predicate: F, from: u64) -> Result<Option<u64>, KvError>
    where
        F: FnMut(&DataPage, u64) -> ProbeOutcome,
    {
        let page_count = self.file.page_count();
        let mut buf = self.pool.acquire_page()?;
        let mut index = from;
        let mut visited = 0;

        let outcome = loop {
            if visited == page_count - 1 {
                break Ok(None);
            }

            if let Err(e) = self.file.lock(index, LockKind::Shared) {
                break Err(e);
            }
            if let Err(e) = self.file.read_page(index, &mut buf) {
                let _ = self.file.unlock(index);
                break Err(e);
            }

            let verdict = {
                let page = DataPage::new(&mut buf);
                predicate(&page, index)
            };
            match verdict {
                ProbeOutcome::Hit => break Ok(Some(index)),
                ProbeOutcome::Stop => {
                    break self.file.unlock(index).map(|()| None);
                }
                ProbeOutcome::Miss => {
                    if let Err(e) = self.file.unlock(index) {
                        break Err(e);
                    }
                    index = if index == page_count - 1 {
                        1
                    } else {
                        (index + 1) % page_count
                    };
                    visited += 1;
                }
            }
        };

        self.pool.release_page(buf);
        outcome
    }
}
