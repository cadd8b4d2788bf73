//! Response types for the Discogs endpoints used by the exporter.
//!
//! Only the fields the export needs are modelled; everything else in the
//! (large) release documents is ignored.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::rest::endpoints;
use crate::types::serde_helpers::{empty_string_as_none, lenient_u32, maybe_decimal};
use crate::types::{Condition, ListKind};

/// The user owning the token, from `/oauth/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    /// Numeric user id
    #[serde(default)]
    pub id: u64,
    /// Username used in listing paths
    pub username: String,
}

/// A list of one user that can be paged through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Listing {
    /// Collection or wantlist
    pub kind: ListKind,
    /// Owner of the list
    pub username: String,
}

impl Listing {
    /// The collection of `username` (all folders).
    pub fn collection(username: impl Into<String>) -> Self {
        Self {
            kind: ListKind::Collection,
            username: username.into(),
        }
    }

    /// The wantlist of `username`.
    pub fn wantlist(username: impl Into<String>) -> Self {
        Self {
            kind: ListKind::Wantlist,
            username: username.into(),
        }
    }

    /// Request path of the listing endpoint.
    pub fn path(&self) -> String {
        match self.kind {
            ListKind::Collection => {
                endpoints::collection_releases(&self.username, endpoints::ALL_FOLDER)
            }
            ListKind::Wantlist => endpoints::wants(&self.username),
        }
    }
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.kind, self.username)
    }
}

/// Pagination block of a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageInfo {
    /// One-based page index
    pub page: u32,
    /// Total number of pages
    pub pages: u32,
    /// Page size
    pub per_page: u32,
    /// Total number of entries across all pages
    #[serde(default)]
    pub items: u64,
}

impl PageInfo {
    /// Whether this is the final page of the listing.
    pub fn is_last(&self) -> bool {
        self.page >= self.pages
    }
}

/// One page of a collection or wantlist listing.
///
/// Collection pages carry their entries under `releases`, wantlist pages
/// under `wants`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    /// Pagination block
    pub pagination: PageInfo,
    /// Entries on this page, in server order
    #[serde(alias = "releases", alias = "wants", default)]
    pub items: Vec<ListingEntry>,
}

/// A raw entry of a listing page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingEntry {
    /// Release id
    pub id: u64,
    /// Collection instance id (collections only)
    #[serde(default)]
    pub instance_id: Option<u64>,
    /// User rating, 0 when unrated
    #[serde(default)]
    pub rating: u8,
    /// When the entry was added to the list
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_added: Option<OffsetDateTime>,
    /// Release summary
    pub basic_information: BasicInformation,
}

/// Release summary embedded in listing entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicInformation {
    /// Release id
    pub id: u64,
    /// Release title
    #[serde(default)]
    pub title: String,
    /// Release year, 0 when unknown
    #[serde(default, deserialize_with = "lenient_u32::deserialize")]
    pub year: u32,
    /// API URL of the release
    #[serde(default)]
    pub resource_url: String,
    /// Credited artists, in credit order
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Labels with catalog numbers
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    /// Physical formats
    #[serde(default)]
    pub formats: Vec<FormatRef>,
    /// Genres
    #[serde(default)]
    pub genres: Vec<String>,
    /// Styles
    #[serde(default)]
    pub styles: Vec<String>,
}

/// Artist credit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRef {
    /// Artist id
    #[serde(default)]
    pub id: u64,
    /// Artist name, possibly with a disambiguation suffix such as " (2)"
    pub name: String,
}

/// Label credit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelRef {
    /// Label name
    #[serde(default)]
    pub name: String,
    /// Catalog number on this label
    #[serde(default)]
    pub catno: String,
}

/// Format of a release.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatRef {
    /// Format name, e.g. "Vinyl"
    #[serde(default)]
    pub name: String,
    /// Number of items in this format
    #[serde(default, deserialize_with = "lenient_u32::deserialize")]
    pub qty: u32,
}

/// Community statistics of a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Community {
    /// Users having the release
    #[serde(default)]
    pub have: u32,
    /// Users wanting the release
    #[serde(default)]
    pub want: u32,
}

/// Release details from `/releases/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReleaseDetails {
    /// Release id
    pub id: u64,
    /// Web page of the release
    #[serde(default, deserialize_with = "empty_string_as_none::deserialize")]
    pub uri: Option<String>,
    /// Release notes
    #[serde(default, deserialize_with = "empty_string_as_none::deserialize")]
    pub notes: Option<String>,
    /// Copies currently listed on the marketplace
    #[serde(default, deserialize_with = "lenient_u32::deserialize")]
    pub num_for_sale: u32,
    /// Cheapest listing, in the requested currency
    #[serde(default, deserialize_with = "maybe_decimal::deserialize")]
    pub lowest_price: Option<Decimal>,
    /// Have/want counts
    #[serde(default)]
    pub community: Community,
}

/// One suggested price.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuggestedPrice {
    /// Currency code as returned by the API
    #[serde(default)]
    pub currency: String,
    /// Suggested value
    #[serde(default, deserialize_with = "maybe_decimal::deserialize")]
    pub value: Option<Decimal>,
}

/// Suggested prices of a release per media condition.
///
/// Conditions the API reports but this crate does not know are dropped.
/// An account without seller settings receives an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, SuggestedPrice>")]
pub struct PriceSuggestions {
    prices: BTreeMap<Condition, SuggestedPrice>,
}

impl PriceSuggestions {
    /// Suggested price for `condition`.
    pub fn get(&self, condition: Condition) -> Option<&SuggestedPrice> {
        self.prices.get(&condition)
    }

    /// Prices ordered from best to worst condition.
    pub fn iter(&self) -> impl Iterator<Item = (Condition, &SuggestedPrice)> {
        self.prices.iter().map(|(condition, price)| (*condition, price))
    }

    /// Whether no condition has a price.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Number of conditions with a price.
    pub fn len(&self) -> usize {
        self.prices.len()
    }
}

impl From<HashMap<String, SuggestedPrice>> for PriceSuggestions {
    fn from(raw: HashMap<String, SuggestedPrice>) -> Self {
        let prices = raw
            .into_iter()
            .filter_map(|(label, price)| {
                Condition::from_str(&label)
                    .ok()
                    .map(|condition| (condition, price))
            })
            .collect();
        Self { prices }
    }
}

impl FromIterator<(Condition, SuggestedPrice)> for PriceSuggestions {
    fn from_iter<I: IntoIterator<Item = (Condition, SuggestedPrice)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: String,
}
