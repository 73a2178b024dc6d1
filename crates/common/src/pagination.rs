//! Page/offset arithmetic shared by list queries.

use serde::Deserialize;

/// Default page size.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: i64 = 100;

/// Offsets are bound as Postgres `BIGINT`.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// 1-based pagination parameters, as sent in `?page=&per_page=`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// Page number, starting at 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

const fn default_page() -> i64 {
    1
}

const fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Create pagination parameters.
    #[must_use]
    pub const fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    /// Page number with values below 1 clamped to 1.
    #[must_use]
    pub const fn page(&self) -> u64 {
        if self.page < 1 { 1 } else { self.page as u64 }
    }

    /// Page size; non-positive values fall back to the default.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        if self.per_page < 1 {
            DEFAULT_PER_PAGE as u64
        } else if self.per_page > MAX_PER_PAGE {
            MAX_PER_PAGE as u64
        } else {
            self.per_page as u64
        }
    }

    /// `(page - 1) * per_page`, saturating at `i64::MAX`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = (self.page() - 1).saturating_mul(self.limit());
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_non_positive_page_is_first_page() {
        assert_eq!(Pagination::new(0, 10).offset(), 0);
        assert_eq!(Pagination::new(-4, 10).offset(), 0);
        assert_eq!(Pagination::new(-4, 10).page(), 1);
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(Pagination::new(1, 0).limit(), 10);
        assert_eq!(Pagination::new(1, 1000).limit(), 100);
    }

    #[test]
    fn test_huge_page_offset_fits_bigint() {
        let offset = Pagination::new(100_000_000_000_000_000, 100).offset();
        assert!(i64::try_from(offset).is_ok());
        assert_eq!(offset, i64::MAX as u64);

        assert_eq!(Pagination::new(i64::MAX, 100).offset(), i64::MAX as u64);
    }
}
