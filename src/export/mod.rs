//! Writing an [`ExportResult`](crate::catalog::ExportResult) to disk.

mod xlsx;

pub use xlsx::{Column, XlsxWriter, columns};
