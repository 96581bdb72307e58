//! Pagination: a count query followed by a LIMIT/OFFSET query

use serde::Serialize;

use crate::collection::Collection;
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::query::pagination::page_offset;
use crate::query::QueryBuilder;

/// Page descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

impl PageInfo {
    pub fn new(total: u64, current_page: u64, per_page: u64) -> Self {
        let last_page = if per_page == 0 { 1 } else { total.div_ceil(per_page).max(1) };
        Self {
            total,
            current_page,
            per_page,
            last_page,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Zero-based index of the first item on this page, saturating
    pub fn offset(&self) -> u64 {
        self.current_page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of models plus its descriptor
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub info: PageInfo,
    pub items: Collection<M>,
}

impl<M> Page<M> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Count the matching rows, then fetch page `page` (one-based)
    pub async fn paginate(self, db: &Database, page: u64, per_page: u64) -> OrmResult<Page<M>> {
        let page = page.max(1);
        let issue = if per_page == 0 {
            Some("per_page must be at least 1".to_string())
        } else if page_offset(page, per_page).is_none() {
            Some(format!("page {} with {} rows per page is out of range", page, per_page))
        } else {
            None
        };
        if let Some(issue) = issue {
            db.policy().raise_or_log(OrmError::configuration(issue))?;
            return Ok(Page {
                info: PageInfo::new(0, page, per_page),
                items: Collection::default(),
            });
        }

        let total = self.clone().count(db, "*").await?;
        let info = PageInfo::new(u64::try_from(total).unwrap_or(0), page, per_page);
        let items = self.for_page(page, per_page).find_all(db).await?;
        tracing::debug!(
            total = info.total,
            page = info.current_page,
            per_page = info.per_page,
            "page fetched"
        );
        Ok(Page { info, items })
    }
}
