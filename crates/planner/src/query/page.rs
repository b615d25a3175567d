use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, num::NonZeroU64};

/// Offset/limit window of a single page. Built fresh for every page and
/// dropped once the page has been fetched.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(index: u64, page_size: u64) -> Self {
        PageRequest {
            index,
            offset: index.saturating_mul(page_size),
            limit: page_size,
        }
    }
}

impl Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "page {} [limit: {}, offset: {}]",
            self.index, self.limit, self.offset
        )
    }
}

/// Sequence of pages needed to cover `total` results.
///
/// The plan always holds `total / page_size + 1` pages. When `total` is an
/// exact multiple of `page_size` the last page comes back empty, and a total
/// of zero still yields one page at offset 0.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    total: u64,
    page_size: NonZeroU64,
}

impl PagePlan {
    /// Fails when `total / page_size + 1` does not fit in a `u64`.
    pub fn new(total: u64, page_size: NonZeroU64) -> Result<Self, PlanError> {
        (total / page_size)
            .checked_add(1)
            .map(|_| PagePlan { total, page_size })
            .ok_or(PlanError::TooManyPages {
                total,
                page_size: page_size.get(),
            })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.get()
    }

    pub fn page_count(&self) -> u64 {
        (self.total / self.page_size).saturating_add(1)
    }

    /// Request for page `index`, if the plan has such a page.
    pub fn page(&self, index: u64) -> Option<PageRequest> {
        (index < self.page_count()).then(|| PageRequest::new(index, self.page_size()))
    }

    pub fn pages(self) -> impl Iterator<Item = PageRequest> {
        let page_size = self.page_size();
        (0..self.page_count()).map(move |index| PageRequest::new(index, page_size))
    }
}
