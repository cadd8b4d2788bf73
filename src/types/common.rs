//! Common domain types for the Discogs API.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiscogsError;

/// Currencies Discogs accepts for marketplace values (`curr_abbr`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Australian dollar
    #[value(name = "AUD")]
    Aud,
    /// Brazilian real
    #[value(name = "BRL")]
    Brl,
    /// Canadian dollar
    #[value(name = "CAD")]
    Cad,
    /// Swiss franc
    #[value(name = "CHF")]
    Chf,
    /// Euro (default)
    #[default]
    #[value(name = "EUR")]
    Eur,
    /// Pound sterling
    #[value(name = "GBP")]
    Gbp,
    /// Japanese yen
    #[value(name = "JPY")]
    Jpy,
    /// Mexican peso
    #[value(name = "MXN")]
    Mxn,
    /// New Zealand dollar
    #[value(name = "NZD")]
    Nzd,
    /// Swedish krona
    #[value(name = "SEK")]
    Sek,
    /// US dollar
    #[value(name = "USD")]
    Usd,
    /// South African rand
    #[value(name = "ZAR")]
    Zar,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Currency; 12] = [
        Currency::Aud,
        Currency::Brl,
        Currency::Cad,
        Currency::Chf,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Mxn,
        Currency::Nzd,
        Currency::Sek,
        Currency::Usd,
        Currency::Zar,
    ];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Brl => "BRL",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Mxn => "MXN",
            Currency::Nzd => "NZD",
            Currency::Sek => "SEK",
            Currency::Usd => "USD",
            Currency::Zar => "ZAR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DiscogsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DiscogsError::InvalidConfig(format!("unsupported currency: {s}")))
    }
}

/// Which list of the user is exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Records the user owns
    #[default]
    Collection,
    /// Records the user wants
    Wantlist,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Collection => write!(f, "collection"),
            ListKind::Wantlist => write!(f, "wantlist"),
        }
    }
}

/// Media condition grades used by the marketplace, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Mint (M)
    #[serde(rename = "Mint (M)")]
    Mint,
    /// Near Mint (NM or M-)
    #[serde(rename = "Near Mint (NM or M-)")]
    NearMint,
    /// Very Good Plus (VG+)
    #[serde(rename = "Very Good Plus (VG+)")]
    VeryGoodPlus,
    /// Very Good (VG)
    #[serde(rename = "Very Good (VG)")]
    VeryGood,
    /// Good Plus (G+)
    #[serde(rename = "Good Plus (G+)")]
    GoodPlus,
    /// Good (G)
    #[serde(rename = "Good (G)")]
    Good,
    /// Fair (F)
    #[serde(rename = "Fair (F)")]
    Fair,
    /// Poor (P)
    #[serde(rename = "Poor (P)")]
    Poor,
}

impl Condition {
    /// Every grade, best first.
    pub const ALL: [Condition; 8] = [
        Condition::Mint,
        Condition::NearMint,
        Condition::VeryGoodPlus,
        Condition::VeryGood,
        Condition::GoodPlus,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    /// Label as returned by the API.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Mint => "Mint (M)",
            Condition::NearMint => "Near Mint (NM or M-)",
            Condition::VeryGoodPlus => "Very Good Plus (VG+)",
            Condition::VeryGood => "Very Good (VG)",
            Condition::GoodPlus => "Good Plus (G+)",
            Condition::Good => "Good (G)",
            Condition::Fair => "Fair (F)",
            Condition::Poor => "Poor (P)",
        }
    }

    /// Label without the abbreviation, e.g. "Very Good Plus".
    pub fn name(&self) -> &'static str {
        let label = self.label();
        label.split(" (").next().unwrap_or(label)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Condition {
    type Err = DiscogsError;

    /// Accepts the full API label or just the name before the abbreviation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Condition::ALL
            .into_iter()
            .find(|condition| {
                condition.label().eq_ignore_ascii_case(s) || condition.name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| DiscogsError::InvalidResponse(format!("unknown condition: {s}")))
    }
}
