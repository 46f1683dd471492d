//! Worksheet parsing.
//!
//! Each published spreadsheet holds one worksheet per business day. A
//! worksheet carries its effective date in a header cell and the dollar rate
//! in a fixed data row.

use crate::ParseError;
use bcv_core::{source_midnight, Rate};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Cursor;
use std::iter::FusedIterator;
use std::str::FromStr;
use tracing::trace;

/// Date format of the last token of the header cell.
const HEADER_DATE_FORMAT: &str = "%d/%m/%Y";

/// Turns spreadsheet bytes into rate records.
pub trait RateExtractor: Send + Sync {
    type Rates: Iterator<Item = Result<Rate, ParseError>>;

    /// Open a spreadsheet; the returned sequence yields one item per worksheet.
    fn extract(&self, bytes: Vec<u8>) -> Result<Self::Rates, ParseError>;
}

/// Cell positions (zero-based row, column) inside a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Header cell whose last token is the effective date
    pub date_cell: (u32, u32),
    /// Row holding the USD rate
    pub value_row: u32,
    /// Column holding the USD rate; `None` means the last used column
    pub value_col: Option<u32>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            date_cell: (4, 3),
            value_row: 14,
            value_col: None,
        }
    }
}

/// Extract the rate of a single worksheet.
pub fn rate_from_sheet(
    sheet: &str,
    range: &Range<Data>,
    layout: &SheetLayout,
) -> Result<Rate, ParseError> {
    let header = cell(sheet, range, layout.date_cell)?;
    let date = parse_header_date(sheet, header)?;

    let value_col = match layout.value_col {
        Some(col) => col,
        None => range
            .end()
            .map(|(_, col)| col)
            .ok_or_else(|| ParseError::MissingCell {
                sheet: sheet.to_string(),
                cell: (layout.value_row, 0),
            })?,
    };
    let raw = parse_value(sheet, cell(sheet, range, (layout.value_row, value_col))?)?;

    Ok(Rate::from_published(source_midnight(date), raw))
}

fn cell<'a>(sheet: &str, range: &'a Range<Data>, pos: (u32, u32)) -> Result<&'a Data, ParseError> {
    range
        .get_value(pos)
        .filter(|data| !matches!(data, Data::Empty))
        .ok_or_else(|| ParseError::MissingCell {
            sheet: sheet.to_string(),
            cell: pos,
        })
}

fn parse_header_date(sheet: &str, header: &Data) -> Result<NaiveDate, ParseError> {
    let text = header.to_string();
    let invalid = || ParseError::InvalidDate {
        sheet: sheet.to_string(),
        value: text.clone(),
    };

    let token = text.split_whitespace().last().ok_or_else(invalid)?;
    NaiveDate::parse_from_str(token, HEADER_DATE_FORMAT).map_err(|_| invalid())
}

fn parse_value(sheet: &str, data: &Data) -> Result<Decimal, ParseError> {
    let invalid = || ParseError::InvalidValue {
        sheet: sheet.to_string(),
        value: data.to_string(),
    };

    match data {
        Data::Int(value) => Ok(Decimal::from(*value)),
        // Shortest round-trip representation keeps the printed digits exactly.
        Data::Float(value) if value.is_finite() => {
            Decimal::from_str(&value.to_string()).map_err(|_| invalid())
        }
        Data::String(text) => parse_decimal_text(text).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parse a decimal written either as `1234.56` or with Spanish separators
/// (`1.234,56`).
fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.contains(',') {
        Decimal::from_str(&text.replace('.', "").replace(',', ".")).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// Worksheet-by-worksheet rates of one workbook.
///
/// Finite and single-pass. After the first error no further worksheets are
/// read, so a malformed sheet ends the whole workbook.
pub struct WorkbookRates {
    workbook: Sheets<Cursor<Vec<u8>>>,
    sheet_names: std::vec::IntoIter<String>,
    layout: SheetLayout,
    failed: bool,
}

impl WorkbookRates {
    pub fn open(bytes: Vec<u8>, layout: SheetLayout) -> Result<Self, ParseError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ParseError::Workbook(e.to_string()))?;
        let sheet_names = workbook.sheet_names().into_iter();

        Ok(Self {
            workbook,
            sheet_names,
            layout,
            failed: false,
        })
    }
}

impl Iterator for WorkbookRates {
    type Item = Result<Rate, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let name = self.sheet_names.next()?;
        let result = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| ParseError::Workbook(format!("{name}: {e}")))
            .and_then(|range| rate_from_sheet(&name, &range, &self.layout));

        match &result {
            Ok(rate) => trace!(sheet = %name, date = %rate.effective_date(), value = %rate.value, "Parsed worksheet"),
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

impl FusedIterator for WorkbookRates {}

/// Extractor for the bank's `.xls` workbooks.
#[derive(Debug, Clone, Default)]
pub struct WorkbookExtractor {
    layout: SheetLayout,
}

impl WorkbookExtractor {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }
}

impl RateExtractor for WorkbookExtractor {
    type Rates = WorkbookRates;

    fn extract(&self, bytes: Vec<u8>) -> Result<WorkbookRates, ParseError> {
        WorkbookRates::open(bytes, self.layout)
    }
}
