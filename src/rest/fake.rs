//! In-memory [`CatalogApi`] for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rust_decimal::Decimal;

use crate::error::{DiscogsError, Result};
use crate::rest::endpoints;
use crate::rest::traits::CatalogApi;
use crate::rest::types::{
    ArtistRef, BasicInformation, Community, FormatRef, Identity, LabelRef, Listing, ListingEntry,
    ListingPage, PageInfo, PriceSuggestions, ReleaseDetails, SuggestedPrice,
};
use crate::types::{Condition, Currency};

/// Serves pages of sequentially numbered releases (ids start at 1).
///
/// Every call is logged as `"identity"`, `"page N"`, `"release ID"` or
/// `"prices ID"`.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    sizes: Vec<usize>,
    per_page: u32,
    reported_pages: HashMap<u32, u32>,
    missing_releases: HashSet<u64>,
    missing_prices: HashSet<u64>,
    throttled_prices: HashSet<u64>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    /// One page per element of `sizes`, holding that many entries.
    pub fn with_pages(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            per_page: sizes.first().copied().unwrap_or(0) as u32,
            ..Self::default()
        }
    }

    /// Make `page` report `pages` as the total page count.
    pub fn report_pages_on(mut self, page: u32, pages: u32) -> Self {
        self.reported_pages.insert(page, pages);
        self
    }

    /// Answer 404 to the details lookup of `release_id`.
    pub fn without_release(mut self, release_id: u64) -> Self {
        self.missing_releases.insert(release_id);
        self
    }

    /// Answer 404 to the price lookup of `release_id`.
    pub fn without_prices(mut self, release_id: u64) -> Self {
        self.missing_prices.insert(release_id);
        self
    }

    /// Fail the price lookup of `release_id` with repeated throttling.
    pub fn throttle_prices(mut self, release_id: u64) -> Self {
        self.throttled_prices.insert(release_id);
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A listing entry for release `id` by "Artist {id} (2)".
pub(crate) fn entry(id: u64) -> ListingEntry {
    ListingEntry {
        id,
        instance_id: Some(id * 10),
        rating: 0,
        date_added: None,
        basic_information: BasicInformation {
            id,
            title: format!("Album {id}"),
            year: 2000 + (id % 20) as u32,
            resource_url: format!("https://api.discogs.com/releases/{id}"),
            artists: vec![ArtistRef {
                id,
                name: format!("Artist {id} (2)"),
            }],
            labels: vec![LabelRef {
                name: "Label".to_string(),
                catno: format!("CAT-{id}"),
            }],
            formats: vec![FormatRef {
                name: "Vinyl".to_string(),
                qty: 1,
            }],
            genres: vec!["Rock".to_string()],
            styles: vec!["Post Rock".to_string()],
        },
    }
}

impl CatalogApi for FakeCatalog {
    async fn identity(&self) -> Result<Identity> {
        self.log("identity".to_string());
        Ok(Identity {
            id: 1,
            username: "dummy".to_string(),
        })
    }

    async fn listing_page(&self, _listing: &Listing, page: u32, _per_page: u32) -> Result<ListingPage> {
        self.log(format!("page {page}"));
        let pages = self.sizes.len() as u32;
        let first_id: usize = self.sizes.iter().take(page as usize - 1).sum();
        let size = self.sizes.get(page as usize - 1).copied().unwrap_or(0);
        let items = (first_id + 1..=first_id + size)
            .map(|id| entry(id as u64))
            .collect();
        Ok(ListingPage {
            pagination: PageInfo {
                page,
                pages: self.reported_pages.get(&page).copied().unwrap_or(pages),
                per_page: self.per_page,
                items: self.sizes.iter().sum::<usize>() as u64,
            },
            items,
        })
    }

    async fn release(&self, release_id: u64, _currency: Currency) -> Result<Option<ReleaseDetails>> {
        self.log(format!("release {release_id}"));
        if self.missing_releases.contains(&release_id) {
            return Ok(None);
        }
        Ok(Some(ReleaseDetails {
            id: release_id,
            uri: Some(format!("https://www.discogs.com/release/{release_id}")),
            notes: None,
            num_for_sale: 2,
            lowest_price: Some(Decimal::new(999, 2)),
            community: Community {
                have: release_id as u32 * 100,
                want: 7,
            },
        }))
    }

    async fn price_suggestions(&self, release_id: u64) -> Result<Option<PriceSuggestions>> {
        self.log(format!("prices {release_id}"));
        if self.throttled_prices.contains(&release_id) {
            return Err(DiscogsError::Throttled {
                path: endpoints::price_suggestions(release_id),
            });
        }
        if self.missing_prices.contains(&release_id) {
            return Ok(None);
        }
        Ok(Some(PriceSuggestions::from_iter([
            (
                Condition::Mint,
                SuggestedPrice {
                    currency: "EUR".to_string(),
                    value: Some(Decimal::new(2443, 2)),
                },
            ),
            (
                Condition::VeryGood,
                SuggestedPrice {
                    currency: "EUR".to_string(),
                    value: Some(Decimal::new(1157, 2)),
                },
            ),
        ])))
    }

    fn calls_issued(&self) -> u64 {
        self.calls.lock().unwrap().len() as u64
    }
}
