//! Custom serde helpers for Discogs' loosely typed fields.
//!
//! The Discogs API returns the same field as a number on one endpoint and as a
//! string on another (`qty` is `"1"`, `year` is `1977`), and uses `null` or
//! `""` for missing values. These modules accept all of those shapes.

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

fn parse_decimal<E: de::Error>(s: &str) -> Result<Decimal, E> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(de::Error::custom)
}

/// Deserialize a price that may be a JSON number, a numeric string or `null`.
///
/// Numbers are converted through their textual form, so `12.30` stays
/// `12.30` instead of passing through `f64`.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use rust_decimal::Decimal;
/// use discogs_xlsx::types::serde_helpers::maybe_decimal;
///
/// #[derive(Deserialize, Debug)]
/// struct Release {
///     #[serde(deserialize_with = "maybe_decimal::deserialize", default)]
///     lowest_price: Option<Decimal>,
/// }
///
/// let release: Release = serde_json::from_str(r#"{"lowest_price":12.30}"#).unwrap();
/// assert_eq!(release.lowest_price.unwrap().to_string(), "12.30");
///
/// let release: Release = serde_json::from_str(r#"{"lowest_price":null}"#).unwrap();
/// assert!(release.lowest_price.is_none());
/// ```
pub mod maybe_decimal {
    use super::*;

    /// Deserialize a value that may be `null`, a number or a decimal string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
            Some(Value::Number(n)) => parse_decimal(&n.to_string()).map(Some),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_decimal(&s).map(Some),
            Some(other) => Err(de::Error::custom(format!(
                "expected a decimal number, got {other}"
            ))),
        }
    }
}

/// Deserialize an unsigned count given either as a number or as a string.
///
/// `null` and `""` become `0`.
pub mod lenient_u32 {
    use super::*;

    /// Deserialize a `u32` from a number or numeric string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| de::Error::custom(format!("expected an unsigned count, got {n}"))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
            Some(Value::String(s)) => parse_trimmed(&s),
            Some(other) => Err(de::Error::custom(format!(
                "expected an unsigned count, got {other}"
            ))),
        }
    }

    fn parse_trimmed<T, E>(s: &str) -> Result<T, E>
    where
        T: FromStr,
        T::Err: Display,
        E: de::Error,
    {
        s.trim().parse().map_err(de::Error::custom)
    }
}

/// Helper for empty strings that should be deserialized as None.
///
/// Discogs returns `""` for unset notes and URIs.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use discogs_xlsx::types::serde_helpers::empty_string_as_none;
///
/// #[derive(Deserialize, Debug)]
/// struct Release {
///     #[serde(deserialize_with = "empty_string_as_none::deserialize", default)]
///     notes: Option<String>,
/// }
///
/// let release: Release = serde_json::from_str(r#"{"notes":""}"#).unwrap();
/// assert!(release.notes.is_none());
/// ```
pub mod empty_string_as_none {
    use super::*;

    /// Deserialize a string, returning None if empty.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.filter(|s| !s.trim().is_empty()))
    }
}
