//! Database file I/O and per-page advisory locking.
//!
//! One process-visible [`DbFile`] per open database. Pages are read and
//! written whole, and every page access in the engine happens under an
//! advisory byte-range lock (`fcntl` with `F_SETLKW`) covering exactly
//! that page's bytes, so independent pages never contend. Acquisition
//! blocks until the opposing holder releases; there are no timeouts.
//!
//! Opening takes a shared lock on page 0 that lives for the whole
//! session. Creation takes an exclusive lock on page 0 while the file is
//! being laid out, so concurrent openers see either no file or a fully
//! initialized one. Closing the descriptor releases every lock the
//! process holds on the file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::store::constants::{AVG_RECORD_SIZE, DATABASE_VERSION, PAGE_SIZE};
use crate::store::data_page::DataPage;
use crate::store::header_page::HeaderPage;
use crate::store::pool::{BufferPool, PageBuffer};
use crate::KvError;

/// Advisory lock mode for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

/// An open database file with its cached page count.
pub struct DbFile {
    file: File,
    page_count: u64,
}

impl DbFile {
    /// Create a new database file sized for roughly `requested_elements`
    /// records. Fails with [`KvError::CannotOpen`] when the file exists.
    ///
    /// The file gets one header page plus an even number of data pages,
    /// assuming [`AVG_RECORD_SIZE`] bytes per record; the smallest file
    /// has two data pages.
    pub fn create<P: AsRef<Path>>(
        path: P,
        requested_elements: u64,
        pool: &mut BufferPool,
    ) -> Result<(), KvError> {
        let path = path.as_ref();
        if requested_elements == 0 {
            return Err(KvError::Argument(
                "element count must be positive".to_string(),
            ));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                KvError::CannotOpen(format!(
                    "cannot create {}, check permissions or if the file already exists: {}",
                    path.display(),
                    e
                ))
            })?;

        let page_count = page_count_for(requested_elements);

        page_lock(&file, 0, libc::F_WRLCK)?;

        let mut buf = pool.acquire_page()?;
        HeaderPage::format(&mut buf, page_count);
        let result = write_pages(&mut file, &mut buf, page_count);
        pool.release_page(buf);
        result?;

        page_unlock(&file, 0)?;
        Ok(())
    }

    /// Open an existing database: shared-lock page 0 for the session,
    /// verify the version constant, cache the page count.
    pub fn open<P: AsRef<Path>>(path: P, pool: &mut BufferPool) -> Result<Self, KvError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| KvError::CannotOpen(format!("cannot open {}: {}", path.display(), e)))?;

        page_lock(&file, 0, libc::F_RDLCK)?;

        let mut db = DbFile {
            file,
            page_count: 0,
        };
        let mut buf = pool.acquire_page()?;
        let result = db.read_page(0, &mut buf);
        let header_check = result.and_then(|()| {
            let header = HeaderPage::new(&buf);
            if header.version() != DATABASE_VERSION {
                return Err(KvError::BadVersion(format!(
                    "{} has version {}, expected {}",
                    path.display(),
                    header.version(),
                    DATABASE_VERSION
                )));
            }
            Ok(header.page_count())
        });
        pool.release_page(buf);

        db.page_count = header_check?;
        if db.page_count < 2 {
            return Err(KvError::BadVersion(format!(
                "{} reports {} pages, need at least 2",
                path.display(),
                db.page_count
            )));
        }
        Ok(db)
    }

    /// Total pages in the file, header page included.
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Read page `index` into `buf`. Short reads are errors.
    pub fn read_page(&mut self, index: u64, buf: &mut PageBuffer) -> Result<(), KvError> {
        self.file
            .seek(SeekFrom::Start(index * PAGE_SIZE as u64))
            .map_err(|e| KvError::Io(format!("cannot seek to page {}: {}", index, e)))?;
        self.file
            .read_exact(buf)
            .map_err(|e| KvError::Io(format!("cannot read page {}: {}", index, e)))
    }

    /// Write `buf` as page `index`. With `append_only` the file cursor
    /// is left where the previous write put it, which is how creation
    /// lays pages out sequentially.
    pub fn write_page(
        &mut self,
        buf: &PageBuffer,
        index: u64,
        append_only: bool,
    ) -> Result<(), KvError> {
        if !append_only {
            self.file
                .seek(SeekFrom::Start(index * PAGE_SIZE as u64))
                .map_err(|e| KvError::Io(format!("cannot seek to page {}: {}", index, e)))?;
        }
        self.file
            .write_all(buf)
            .map_err(|e| KvError::Io(format!("cannot write page {}: {}", index, e)))
    }

    /// Block until the advisory lock over page `index` is granted.
    pub fn lock(&self, index: u64, kind: LockKind) -> Result<(), KvError> {
        let l_type = match kind {
            LockKind::Shared => libc::F_RDLCK,
            LockKind::Exclusive => libc::F_WRLCK,
        };
        page_lock(&self.file, index, l_type)
    }

    /// Release the advisory lock over page `index`.
    pub fn unlock(&self, index: u64) -> Result<(), KvError> {
        page_unlock(&self.file, index)
    }
}

/// Pages needed to hold `requested_elements` average-size records:
/// header page + an even number of data pages, two at minimum.
fn page_count_for(requested_elements: u64) -> u64 {
    let bytes = requested_elements.saturating_mul(AVG_RECORD_SIZE);
    let page = PAGE_SIZE as u64;
    let data_pages = bytes.saturating_sub(page - 1).div_ceil(page).max(1);
    2 * data_pages + 1
}

fn write_pages(file: &mut File, buf: &mut PageBuffer, page_count: u64) -> Result<(), KvError> {
    file.write_all(buf)
        .map_err(|e| KvError::Io(format!("cannot write header page: {}", e)))?;
    for index in 1..page_count {
        DataPage::initialize(buf, index);
        file.write_all(buf)
            .map_err(|e| KvError::Io(format!("cannot write page {}: {}", index, e)))?;
    }
    file.flush()
        .map_err(|e| KvError::Io(format!("cannot flush new database: {}", e)))
}

fn page_lock(file: &File, index: u64, l_type: libc::c_int) -> Result<(), KvError> {
    let mut request: libc::flock = unsafe { std::mem::zeroed() };
    request.l_type = l_type as libc::c_short;
    request.l_whence = libc::SEEK_SET as libc::c_short;
    request.l_start = (index * PAGE_SIZE as u64) as libc::off_t;
    request.l_len = PAGE_SIZE as libc::off_t;

    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETLKW, &request) };
    if rc == -1 {
        let kind = if l_type == libc::F_UNLCK {
            "unlock"
        } else {
            "lock"
        };
        return Err(KvError::Lock(format!(
            "interrupted while trying to {} page {}: {}",
            kind,
            index,
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn page_unlock(file: &File, index: u64) -> Result<(), KvError> {
    page_lock(file, index, libc::F_UNLCK)
}
