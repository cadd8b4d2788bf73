//! Lazy traversal of paged listing endpoints.

use std::collections::VecDeque;

use futures_util::Stream;
use futures_util::stream;
use tracing::{debug, info};

use crate::error::{DiscogsError, Result};
use crate::rest::traits::CatalogApi;
use crate::rest::types::{Listing, ListingEntry, PageInfo};
use crate::shutdown::SharedShutdown;

/// Walks every page of a listing and yields its entries in server order.
///
/// Page 1 is requested first and fixes the total page count; pages
/// `2..=pages` follow strictly in order, one request at a time and only when
/// the buffered entries run out. A later page reporting a different total is
/// a [`DiscogsError::PaginationConsistency`] fault and ends the traversal.
///
/// # Example
///
/// ```rust,no_run
/// use discogs_xlsx::auth::Credentials;
/// use discogs_xlsx::rest::{DiscogsSession, Listing, Paginator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = DiscogsSession::builder()
///         .credentials(Credentials::new("my-token"))
///         .build()?;
///
///     let mut pages = Paginator::new(&session, Listing::wantlist("dummy"), 100);
///     while let Some(entry) = pages.next_item().await? {
///         println!("{}", entry.basic_information.title);
///     }
///     Ok(())
/// }
/// ```
pub struct Paginator<'a, C: CatalogApi> {
    api: &'a C,
    listing: Listing,
    per_page: u32,
    shutdown: Option<SharedShutdown>,
    first: Option<PageInfo>,
    next_page: u32,
    buffer: VecDeque<ListingEntry>,
    finished: bool,
}

impl<'a, C: CatalogApi> Paginator<'a, C> {
    /// Create a paginator positioned before page 1.
    pub fn new(api: &'a C, listing: Listing, per_page: u32) -> Self {
        Self {
            api,
            listing,
            per_page,
            shutdown: None,
            first: None,
            next_page: 1,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    /// Check `shutdown` before every page request.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The listing being walked.
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Pagination reported by page 1, once it has been fetched.
    pub fn page_info(&self) -> Option<PageInfo> {
        self.first
    }

    /// Entries reported by page 1, once it has been fetched.
    pub fn total_items(&self) -> Option<u64> {
        self.first.map(|info| info.items)
    }

    /// Go back to before page 1. The next item re-requests every page.
    pub fn restart(&mut self) {
        self.first = None;
        self.next_page = 1;
        self.buffer.clear();
        self.finished = false;
    }

    /// Next entry, fetching the next page when the current one is used up.
    ///
    /// Returns `Ok(None)` after the last entry of the last page.
    pub async fn next_item(&mut self) -> Result<Option<ListingEntry>> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Ok(Some(entry));
            }
            if self.finished {
                return Ok(None);
            }
            self.fetch_next_page().await?;
        }
    }

    /// Drain the remaining entries into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<ListingEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_item().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Turn the paginator into a [`Stream`] of entries.
    pub fn into_stream(self) -> impl Stream<Item = Result<ListingEntry>> + 'a {
        stream::try_unfold(self, |mut pages| async move {
            let next = pages.next_item().await?;
            Ok::<_, DiscogsError>(next.map(|entry| (entry, pages)))
        })
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        if let Some(shutdown) = &self.shutdown {
            shutdown.check()?;
        }

        let page = self.next_page;
        let response = self
            .api
            .listing_page(&self.listing, page, self.per_page)
            .await?;
        let info = response.pagination;

        let pages = match self.first {
            None => {
                info!(
                    listing = %self.listing,
                    pages = info.pages,
                    items = info.items,
                    "Listing size known"
                );
                self.first = Some(info);
                info.pages
            }
            Some(first) if first.pages != info.pages => {
                self.finished = true;
                return Err(DiscogsError::PaginationConsistency {
                    page,
                    expected: first.pages,
                    reported: info.pages,
                });
            }
            Some(first) => first.pages,
        };

        debug!(page, pages, entries = response.items.len(), "Page received");
        self.buffer.extend(response.items);
        self.next_page += 1;
        if page >= pages {
            self.finished = true;
        }
        Ok(())
    }
}

impl<C: CatalogApi> std::fmt::Debug for Paginator<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("listing", &self.listing)
            .field("per_page", &self.per_page)
            .field("next_page", &self.next_page)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}
