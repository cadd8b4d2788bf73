//! Orchestration of one export.

use std::sync::Arc;
use std::time::Instant;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogItem, ExportResult, ExportSummary, NoProgress, ProgressObserver};
use crate::error::Result;
use crate::rest::{CatalogApi, Listing, MAX_PAGE_SIZE, Paginator};
use crate::shutdown::SharedShutdown;
use crate::types::{Currency, ListKind};

/// What to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Collection or wantlist
    pub kind: ListKind,
    /// Currency of marketplace values in release details
    pub currency: Currency,
    /// Look up release details for every item
    pub details: bool,
    /// Look up price suggestions for every item
    pub prices: bool,
    /// Entries requested per listing page
    pub per_page: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            kind: ListKind::Collection,
            currency: Currency::default(),
            details: false,
            prices: false,
            per_page: MAX_PAGE_SIZE,
        }
    }
}

/// Fetches a whole collection or wantlist, optionally enriching every item.
///
/// Items are processed in server order, one at a time: the entry is turned
/// into a [`CatalogItem`], its details and price lookups run (when enabled),
/// and only then is it added to the [`ExportResult`].
///
/// A 404 on an enrichment lookup leaves the item without that block, and so
/// does a lookup that is throttled twice in a row. Every other failure ends
/// the fetch.
///
/// # Example
///
/// ```rust,no_run
/// use discogs_xlsx::auth::Credentials;
/// use discogs_xlsx::catalog::{CatalogFetcher, FetchOptions};
/// use discogs_xlsx::rest::DiscogsSession;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = DiscogsSession::builder()
///         .credentials(Credentials::new("my-token"))
///         .build()?;
///     let options = FetchOptions {
///         prices: true,
///         ..FetchOptions::default()
///     };
///
///     let result = CatalogFetcher::new(session, options).fetch().await?;
///     println!("{} items", result.len());
///     Ok(())
/// }
/// ```
pub struct CatalogFetcher<C: CatalogApi> {
    api: C,
    options: FetchOptions,
    username: Option<String>,
    shutdown: Option<SharedShutdown>,
    progress: Arc<dyn ProgressObserver>,
}

impl<C: CatalogApi> CatalogFetcher<C> {
    /// Create a fetcher. The username is resolved on the first fetch.
    pub fn new(api: C, options: FetchOptions) -> Self {
        Self {
            api,
            options,
            username: None,
            shutdown: None,
            progress: Arc::new(NoProgress),
        }
    }

    /// Export the lists of `username` instead of the token owner.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Stop between calls once `shutdown` is requested.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Report progress to `observer`.
    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = observer;
        self
    }

    /// The underlying API client.
    pub fn api(&self) -> &C {
        &self.api
    }

    /// The fetch options.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Username whose lists are exported, asking `/oauth/identity` once.
    pub async fn username(&mut self) -> Result<&str> {
        if self.username.is_none() {
            let identity = self.api.identity().await?;
            info!(username = %identity.username, "Authenticated");
            self.username = Some(identity.username);
        }
        Ok(self.username.as_deref().unwrap_or_default())
    }

    /// Run the export.
    pub async fn fetch(&mut self) -> Result<ExportResult> {
        let result = self.run().await;
        self.progress.finished();
        result
    }

    async fn run(&mut self) -> Result<ExportResult> {
        let started = Instant::now();
        let calls_before = self.api.calls_issued();
        let username = self.username().await?.to_string();
        let options = self.options;

        let listing = Listing {
            kind: options.kind,
            username: username.clone(),
        };
        info!(
            %listing,
            details = options.details,
            prices = options.prices,
            currency = %options.currency,
            "Fetching"
        );

        let mut summary = ExportSummary::new(options.kind, username, options.currency);
        summary.details = options.details;
        summary.prices = options.prices;
        let mut result = ExportResult::new(summary);

        let mut pages = Paginator::new(&self.api, listing, options.per_page);
        if let Some(shutdown) = &self.shutdown {
            pages = pages.with_shutdown(shutdown.clone());
        }

        let mut current = 0u64;
        while let Some(entry) = pages.next_item().await? {
            self.check_shutdown()?;
            let total = pages.total_items().unwrap_or_default();

            let mut item = CatalogItem::from_entry(entry);
            if options.details {
                self.enrich_details(&mut item).await?;
            }
            if options.prices {
                self.enrich_prices(&mut item).await?;
            }

            current += 1;
            let key = item.key;
            if !result.insert(item) {
                warn!(key, "Duplicate entry skipped");
            }
            self.progress.advanced(current, total);
        }

        let summary = result.summary_mut();
        summary.total_items = pages.total_items().unwrap_or_default();
        summary.calls_issued = self.api.calls_issued().saturating_sub(calls_before);
        summary.elapsed = started.elapsed();
        summary.exported_at = OffsetDateTime::now_utc();

        info!(
            items = result.len(),
            calls = result.summary().calls_issued,
            elapsed_secs = result.summary().elapsed.as_secs_f64(),
            "Fetch complete"
        );
        Ok(result)
    }

    async fn enrich_details(&self, item: &mut CatalogItem) -> Result<()> {
        self.check_shutdown()?;
        let release_id = item.release_id;
        match self.api.release(release_id, self.options.currency).await {
            Ok(Some(details)) => {
                item.attach_details(details);
            }
            Ok(None) => debug!(release_id, "No release details"),
            Err(error) if error.is_throttled() => {
                warn!(release_id, %error, "Release details skipped")
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    async fn enrich_prices(&self, item: &mut CatalogItem) -> Result<()> {
        self.check_shutdown()?;
        let release_id = item.release_id;
        match self.api.price_suggestions(release_id).await {
            Ok(Some(prices)) => {
                item.attach_prices(prices);
            }
            Ok(None) => debug!(release_id, "No price suggestions"),
            Err(error) if error.is_throttled() => {
                warn!(release_id, %error, "Price suggestions skipped")
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    fn check_shutdown(&self) -> Result<()> {
        match &self.shutdown {
            Some(shutdown) => shutdown.check(),
            None => Ok(()),
        }
    }
}

impl<C: CatalogApi> std::fmt::Debug for CatalogFetcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFetcher")
            .field("options", &self.options)
            .field("username", &self.username)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscogsError;
    use crate::rest::fake::FakeCatalog;
    use crate::shutdown::ShutdownCoordinator;
    use crate::types::Condition;
    use std::sync::Mutex;

    fn options(details: bool, prices: bool) -> FetchOptions {
        FetchOptions {
            details,
            prices,
            per_page: 50,
            ..FetchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_sixty_items_over_two_pages_without_enrichment() {
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[50, 10]), options(false, false));
        let result = fetcher.fetch().await.unwrap();

        assert_eq!(result.len(), 60);
        let release_ids: Vec<u64> = result.iter().map(|item| item.release_id).collect();
        assert_eq!(release_ids, (1..=60).collect::<Vec<_>>());
        assert_eq!(fetcher.api().calls(), vec!["identity", "page 1", "page 2"]);
        assert_eq!(result.summary().total_items, 60);
        assert_eq!(result.summary().username, "dummy");
        assert_eq!(result.summary().calls_issued, 3);
        assert!(!result.has_details());
        assert!(!result.has_prices());
    }

    #[tokio::test]
    async fn test_enrichment_runs_per_item_in_order() {
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[2]), options(true, true));
        let result = fetcher.fetch().await.unwrap();

        assert_eq!(
            fetcher.api().calls(),
            vec![
                "identity",
                "page 1",
                "release 1",
                "prices 1",
                "release 2",
                "prices 2"
            ]
        );
        let item = result.get(20).unwrap();
        assert_eq!(item.details().unwrap().community.have, 200);
        assert!(item.prices().unwrap().get(Condition::Mint).is_some());
    }

    #[tokio::test]
    async fn test_missing_prices_keep_item_and_continue() {
        let fake = FakeCatalog::with_pages(&[3]).without_prices(2);
        let mut fetcher = CatalogFetcher::new(fake, options(false, true));
        let result = fetcher.fetch().await.unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.get(10).unwrap().prices().is_some());
        assert!(result.get(20).unwrap().prices().is_none());
        assert!(result.get(30).unwrap().prices().is_some());
    }

    #[tokio::test]
    async fn test_missing_details_keep_item() {
        let fake = FakeCatalog::with_pages(&[2]).without_release(1);
        let mut fetcher = CatalogFetcher::new(fake, options(true, false));
        let result = fetcher.fetch().await.unwrap();

        assert!(result.get(10).unwrap().details().is_none());
        assert!(result.get(20).unwrap().details().is_some());
    }

    #[tokio::test]
    async fn test_repeated_throttling_on_prices_is_not_fatal() {
        let fake = FakeCatalog::with_pages(&[2]).throttle_prices(1);
        let mut fetcher = CatalogFetcher::new(fake, options(false, true));
        let result = fetcher.fetch().await.unwrap();

        assert!(result.get(10).unwrap().prices().is_none());
        assert!(result.get(20).unwrap().prices().is_some());
    }

    #[tokio::test]
    async fn test_consistency_fault_aborts() {
        let fake = FakeCatalog::with_pages(&[2, 2]).report_pages_on(2, 3);
        let mut fetcher = CatalogFetcher::new(fake, options(false, false));
        let error = fetcher.fetch().await.unwrap_err();
        assert!(matches!(error, DiscogsError::PaginationConsistency { .. }));
    }

    #[tokio::test]
    async fn test_identity_is_resolved_once() {
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[1]), options(false, false));
        fetcher.fetch().await.unwrap();
        fetcher.fetch().await.unwrap();
        let identity_calls = fetcher
            .api()
            .calls()
            .iter()
            .filter(|call| *call == "identity")
            .count();
        assert_eq!(identity_calls, 1);
    }

    #[tokio::test]
    async fn test_explicit_username_skips_identity() {
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[1]), options(false, false))
            .with_username("someone");
        let result = fetcher.fetch().await.unwrap();
        assert_eq!(result.summary().username, "someone");
        assert_eq!(fetcher.api().calls(), vec!["page 1"]);
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_item() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let seen = seen.clone();
            move |current: u64, total: u64| seen.lock().unwrap().push((current, total))
        };
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[2, 1]), options(false, false))
            .with_progress(Arc::new(observer));
        fetcher.fetch().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_stops() {
        let shutdown = ShutdownCoordinator::shared();
        shutdown.request_shutdown();
        let mut fetcher = CatalogFetcher::new(FakeCatalog::with_pages(&[2]), options(false, false))
            .with_shutdown(shutdown);
        let error = fetcher.fetch().await.unwrap_err();
        assert!(matches!(error, DiscogsError::Cancelled));
        assert_eq!(fetcher.api().calls(), vec!["identity"]);
    }
}
