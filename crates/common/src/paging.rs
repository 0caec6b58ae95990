//! Pagination shared by every listing endpoint.

use serde::{Deserialize, Serialize};

/// Page selection as sent by clients: 1-based page number and page size.
///
/// A missing size means "everything"; a missing page means the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Returns a request for all items on a single page.
    pub fn all() -> Self {
        Self::default()
    }

    /// The effective 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Number of items to skip before the requested page.
    pub fn offset(&self) -> usize {
        match self.size {
            Some(size) => size as usize * (self.page() as usize - 1),
            None => 0,
        }
    }

    /// Slices `items` to the requested page and wraps it with paging metadata.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total_elements = items.len() as u64;
        let page_items: Vec<T> = match self.size {
            Some(size) => items
                .into_iter()
                .skip(self.offset())
                .take(size as usize)
                .collect(),
            None => items,
        };
        let page_size = self.size.unwrap_or(page_items.len() as u32);

        Page {
            page: self.page(),
            page_size,
            total_elements,
            items: page_items,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Converts the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            page_size: self.page_size,
            total_elements: self.total_elements,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
