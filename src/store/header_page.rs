//! Header page (page 0) layout.
//!
//! ```text
//! page_id (8, reserved) | database_version (8) | page_count (8) | zeros (4072)
//! ```
//!
//! The version field makes the file self-identifying; every open checks
//! it against [`DATABASE_VERSION`] before touching any data page. The
//! page count is written once at creation and never changes (there is no
//! online resize).

use crate::store::codec::{read_uint, write_uint};
use crate::store::constants::{
    DATABASE_VERSION, HEADER_PAGE_COUNT_OFFSET, HEADER_PAGE_ID_OFFSET, HEADER_VERSION_OFFSET,
    PAGE_SIZE,
};

/// Read-only view of the header page's bytes.
pub struct HeaderPage<'a> {
    buf: &'a [u8],
}

impl<'a> HeaderPage<'a> {
    /// View an existing header page. `buf` must be exactly one page.
    pub fn new(buf: &'a [u8]) -> Self {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        HeaderPage { buf }
    }

    /// Format `buf` as a header page for a file of `page_count` pages.
    pub fn format(buf: &mut [u8], page_count: u64) {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        buf.fill(0);
        write_uint(buf, HEADER_PAGE_ID_OFFSET, 8, 0);
        write_uint(buf, HEADER_VERSION_OFFSET, 8, DATABASE_VERSION);
        write_uint(buf, HEADER_PAGE_COUNT_OFFSET, 8, page_count);
    }

    /// Reserved, currently always 0.
    pub fn page_id(&self) -> u64 {
        read_uint(self.buf, HEADER_PAGE_ID_OFFSET, 8)
    }

    /// Stored magic/version constant.
    pub fn version(&self) -> u64 {
        read_uint(self.buf, HEADER_VERSION_OFFSET, 8)
    }

    /// Total pages in the file, page 0 included.
    pub fn page_count(&self) -> u64 {
        read_uint(self.buf, HEADER_PAGE_COUNT_OFFSET, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_read_back() {
        let mut buf = vec![0xAAu8; PAGE_SIZE];
        HeaderPage::format(&mut buf, 11);

        let header = HeaderPage::new(&buf);
        assert_eq!(header.page_id(), 0);
        assert_eq!(header.version(), DATABASE_VERSION);
        assert_eq!(header.page_count(), 11);

        // Reserved region is zero-filled.
        assert!(buf[24..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_version_constant_value() {
        let mut buf = vec![0u8; PAGE_SIZE];
        HeaderPage::format(&mut buf, 3);
        assert_eq!(HeaderPage::new(&buf).version(), 3_834_052_067);
    }
}
