//! Spreadsheet output with `rust_xlsxwriter`.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{DocProperties, Format, Workbook, Worksheet};
use tracing::{debug, info};

use crate::catalog::{CatalogItem, ExportResult};
use crate::error::Result;
use crate::types::Condition;

const PRICE_FORMAT: &str = "#,##0.00";

/// Most characters Excel accepts in one cell.
const MAX_CELL_CHARS: usize = 32_767;

/// A spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Credited artists
    Artist,
    /// Release year
    Year,
    /// Release title, linked to the release page when known
    Title,
    /// Label names
    Label,
    /// Catalog numbers
    CatalogNumber,
    /// Format names
    Format,
    /// Quantities per format
    FormatQuantity,
    /// Genres
    Genres,
    /// Styles
    Styles,
    /// User rating
    Rating,
    /// Date the entry was added
    Added,
    /// Community have count
    Have,
    /// Community want count
    Want,
    /// Release notes
    Notes,
    /// Copies for sale
    ForSale,
    /// Cheapest listing
    LowestPrice,
    /// Suggested price for one condition
    Price(Condition),
}

impl Column {
    /// Header text.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Artist => "Band",
            Column::Year => "Year",
            Column::Title => "Album",
            Column::Label => "Label",
            Column::CatalogNumber => "Cat Number",
            Column::Format => "Format",
            Column::FormatQuantity => "Format Quantity",
            Column::Genres => "Genres",
            Column::Styles => "Styles",
            Column::Rating => "Rating",
            Column::Added => "Added",
            Column::Have => "Have",
            Column::Want => "Want",
            Column::Notes => "Notes",
            Column::ForSale => "For Sale",
            Column::LowestPrice => "Lowest Price",
            Column::Price(condition) => condition.label(),
        }
    }
}

/// Columns written for `result`.
///
/// Detail columns appear only if some item carries release details, and
/// there is one price column per condition any item has a suggestion for.
pub fn columns(result: &ExportResult) -> Vec<Column> {
    let mut columns = vec![
        Column::Artist,
        Column::Year,
        Column::Title,
        Column::Label,
        Column::CatalogNumber,
        Column::Format,
        Column::FormatQuantity,
        Column::Genres,
        Column::Styles,
        Column::Rating,
        Column::Added,
    ];
    if result.has_details() {
        columns.extend([
            Column::Have,
            Column::Want,
            Column::Notes,
            Column::ForSale,
            Column::LowestPrice,
        ]);
    }
    columns.extend(
        Condition::ALL
            .into_iter()
            .filter(|condition| {
                result
                    .iter()
                    .any(|item| item.prices().is_some_and(|prices| prices.get(*condition).is_some()))
            })
            .map(Column::Price),
    );
    columns
}

/// Writes an [`ExportResult`] to an xlsx file.
///
/// # Example
///
/// ```rust,no_run
/// use discogs_xlsx::catalog::{ExportResult, ExportSummary};
/// use discogs_xlsx::export::XlsxWriter;
/// use discogs_xlsx::types::{Currency, ListKind};
///
/// let result = ExportResult::new(ExportSummary::new(ListKind::Collection, "dummy", Currency::Eur));
/// XlsxWriter::new("discogs-collection.xlsx").write(&result)?;
/// # Ok::<(), discogs_xlsx::DiscogsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    path: PathBuf,
}

impl XlsxWriter {
    /// Create a writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the workbook, replacing any existing file.
    pub fn write(&self, result: &ExportResult) -> Result<()> {
        let mut workbook = build_workbook(result)?;
        workbook.save(&self.path)?;
        info!(
            path = %self.path.display(),
            rows = result.len(),
            "Spreadsheet written"
        );
        Ok(())
    }

    /// Render the workbook in memory.
    pub fn to_buffer(result: &ExportResult) -> Result<Vec<u8>> {
        let mut workbook = build_workbook(result)?;
        Ok(workbook.save_to_buffer()?)
    }
}

fn build_workbook(result: &ExportResult) -> Result<Workbook> {
    let summary = result.summary();
    let mut workbook = Workbook::new();

    let properties = DocProperties::new()
        .set_title(&format!("Discogs {}", summary.kind))
        .set_subject(&format!("Discogs {} of {}", summary.kind, summary.username))
        .set_author(&summary.username)
        .set_comment(&format!("Exported by discogs-xlsx {}", env!("CARGO_PKG_VERSION")));
    workbook.set_properties(&properties);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&summary.kind.to_string())?;
    write_sheet(worksheet, result)?;
    Ok(workbook)
}

fn write_sheet(worksheet: &mut Worksheet, result: &ExportResult) -> Result<()> {
    let header = Format::new().set_bold();
    let price = Format::new().set_num_format(PRICE_FORMAT);
    let columns = columns(result);

    for (col, column) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, column.header(), &header)?;
    }

    for (index, item) in result.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, column) in columns.iter().enumerate() {
            write_cell(worksheet, row, col as u16, *column, item, &price)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    column: Column,
    item: &CatalogItem,
    price: &Format,
) -> Result<()> {
    let details = item.details();
    match column {
        Column::Artist => write_text(worksheet, row, col, &item.artist)?,
        Column::Year => {
            if let Some(year) = item.year {
                worksheet.write_number(row, col, f64::from(year))?;
            }
        }
        Column::Title => match item.web_url() {
            Some(url) => {
                worksheet.write_url_with_text(row, col, url, item.title.as_str())?;
            }
            None => write_text(worksheet, row, col, &item.title)?,
        },
        Column::Label => write_text(worksheet, row, col, &item.labels.join(" - "))?,
        Column::CatalogNumber => write_text(worksheet, row, col, &item.catalog_number())?,
        Column::Format => write_text(worksheet, row, col, &item.format_names())?,
        Column::FormatQuantity => write_text(worksheet, row, col, &item.format_quantities())?,
        Column::Genres => write_text(worksheet, row, col, &item.genres.join(", "))?,
        Column::Styles => write_text(worksheet, row, col, &item.styles.join(", "))?,
        Column::Rating => {
            if let Some(rating) = item.rating {
                worksheet.write_number(row, col, f64::from(rating))?;
            }
        }
        Column::Added => {
            if let Some(added) = item.date_added {
                write_text(worksheet, row, col, &added.date().to_string())?;
            }
        }
        Column::Have => {
            if let Some(details) = details {
                worksheet.write_number(row, col, f64::from(details.community.have))?;
            }
        }
        Column::Want => {
            if let Some(details) = details {
                worksheet.write_number(row, col, f64::from(details.community.want))?;
            }
        }
        Column::Notes => {
            if let Some(notes) = details.and_then(|details| details.notes.as_deref()) {
                write_text(worksheet, row, col, notes)?;
            }
        }
        Column::ForSale => {
            if let Some(details) = details {
                worksheet.write_number(row, col, f64::from(details.num_for_sale))?;
            }
        }
        Column::LowestPrice => {
            let value = details.and_then(|details| details.lowest_price);
            write_price(worksheet, row, col, value, price)?;
        }
        Column::Price(condition) => {
            let value = item
                .prices()
                .and_then(|prices| prices.get(condition))
                .and_then(|suggested| suggested.value);
            write_price(worksheet, row, col, value, price)?;
        }
    }
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<()> {
    if !text.is_empty() {
        worksheet.write_string(row, col, clip_to_cell(row, col, text))?;
    }
    Ok(())
}

/// Cut `text` to the cell limit on a `char` boundary.
fn clip_to_cell(row: u32, col: u16, text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            debug!(row, col, chars = text.chars().count(), "Cell text clipped");
            &text[..end]
        }
        None => text,
    }
}

fn write_price(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<Decimal>,
    format: &Format,
) -> Result<()> {
    if let Some(value) = value.and_then(|value| value.round_dp(2).to_f64()) {
        worksheet.write_number_with_format(row, col, value, format)?;
    }
    Ok(())
}
