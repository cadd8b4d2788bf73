//! The assembled export.

use std::collections::HashMap;
use std::time::Duration;

use time::OffsetDateTime;

use crate::catalog::CatalogItem;
use crate::types::{Currency, ListKind};

/// What was exported, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Collection or wantlist
    pub kind: ListKind,
    /// Owner of the list
    pub username: String,
    /// Currency of marketplace values
    pub currency: Currency,
    /// Entry count reported by the first listing page
    pub total_items: u64,
    /// Whether release details were requested
    pub details: bool,
    /// Whether price suggestions were requested
    pub prices: bool,
    /// HTTP calls issued, retries included
    pub calls_issued: u64,
    /// Wall time of the fetch
    pub elapsed: Duration,
    /// When the fetch finished
    pub exported_at: OffsetDateTime,
}

impl ExportSummary {
    /// Summary of a fetch that has not run yet.
    pub fn new(kind: ListKind, username: impl Into<String>, currency: Currency) -> Self {
        Self {
            kind,
            username: username.into(),
            currency,
            total_items: 0,
            details: false,
            prices: false,
            calls_issued: 0,
            elapsed: Duration::ZERO,
            exported_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Items keyed by [`CatalogItem::key`], in server order.
#[derive(Debug, Clone)]
pub struct ExportResult {
    items: Vec<CatalogItem>,
    index: HashMap<u64, usize>,
    summary: ExportSummary,
}

impl ExportResult {
    /// Create an empty result.
    pub fn new(summary: ExportSummary) -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            summary,
        }
    }

    /// Append a fully built item. Returns `false` if the key is already present.
    pub fn insert(&mut self, item: CatalogItem) -> bool {
        if self.index.contains_key(&item.key) {
            return false;
        }
        self.index.insert(item.key, self.items.len());
        self.items.push(item);
        true
    }

    /// Look up an item by key.
    pub fn get(&self, key: u64) -> Option<&CatalogItem> {
        self.index.get(&key).map(|position| &self.items[*position])
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Iterate items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(|item| item.key)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the export holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Export metadata.
    pub fn summary(&self) -> &ExportSummary {
        &self.summary
    }

    pub(crate) fn summary_mut(&mut self) -> &mut ExportSummary {
        &mut self.summary
    }

    /// Whether any item carries release details.
    pub fn has_details(&self) -> bool {
        self.items.iter().any(|item| item.details().is_some())
    }

    /// Whether any item carries price suggestions.
    pub fn has_prices(&self) -> bool {
        self.items.iter().any(|item| item.prices().is_some())
    }
}

impl<'a> IntoIterator for &'a ExportResult {
    type Item = &'a CatalogItem;
    type IntoIter = std::slice::Iter<'a, CatalogItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
