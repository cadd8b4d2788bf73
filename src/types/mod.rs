//! Common types used across the export library.

pub mod common;
pub mod serde_helpers;

pub use common::*;
