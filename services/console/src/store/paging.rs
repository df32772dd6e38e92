//! Paging and name search shared by every listing.
//!
//! Backends call [`StoreConfig::page_request`] to resolve caller input, then
//! either slice an in-memory sequence with [`PageRequest::slice`] or bind
//! [`PageRequest::offset`] and [`PageRequest::like_pattern`] into SQL.
use super::StoreConfig;
use crate::model::{CatalogEntry, ListQuery, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    /// Lowercased search term, matched as a substring of the entry name.
    pub q: Option<String>,
}

impl StoreConfig {
    pub fn page_request(&self, query: &ListQuery) -> PageRequest {
        let max = self.max_page_size.max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, max);
        PageRequest {
            page: query.page.unwrap_or(1).max(1),
            limit,
            q: query.q.as_ref().map(|q| q.to_lowercase()),
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn matches<T: CatalogEntry>(&self, entry: &T) -> bool {
        match &self.q {
            Some(q) => entry.name().to_lowercase().contains(q.as_str()),
            None => true,
        }
    }

    /// `ILIKE` pattern for the search term with `%`, `_` and `\` escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.q.as_ref().map(|q| {
            let mut pattern = String::with_capacity(q.len() + 2);
            pattern.push('%');
            for ch in q.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }

    /// Filter an already ordered sequence and cut out the requested page.
    pub fn slice<T: CatalogEntry>(&self, entries: impl IntoIterator<Item = T>) -> Page<T> {
        let matching: Vec<T> = entries
            .into_iter()
            .filter(|entry| self.matches(entry))
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect();
        self.page_of(items, total)
    }

    pub fn page_of<T>(&self, items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            page: self.page,
            pages: page_count(total, self.limit),
            limit: self.limit,
            total,
        }
    }
}

pub fn page_count(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit)) as u32
}
