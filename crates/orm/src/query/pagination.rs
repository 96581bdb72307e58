//! Query Builder LIMIT / OFFSET operations
//!
//! Both are nullable: passing `None` removes the clause.

use super::builder::QueryBuilder;

impl<M> QueryBuilder<M> {
    /// Set or clear the LIMIT clause
    pub fn limit(mut self, count: impl Into<Option<u64>>) -> Self {
        self.limit_count = count.into();
        self
    }

    /// Set or clear the OFFSET clause
    pub fn offset(mut self, count: impl Into<Option<u64>>) -> Self {
        self.offset_value = count.into();
        self
    }

    /// LIMIT + OFFSET for a one-based page number
    ///
    /// A page whose offset does not fit in a `u64` is recorded as a
    /// configuration issue.
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        match page_offset(page, per_page) {
            Some(offset) => self.limit(per_page).offset(offset),
            None => self.issue(format!(
                "page {} with {} rows per page is out of range",
                page, per_page
            )),
        }
    }
}

/// Offset of a one-based page, `None` on overflow
pub(crate) fn page_offset(page: u64, per_page: u64) -> Option<u64> {
    (page.max(1) - 1).checked_mul(per_page)
}
