use crate::spreadsheet::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;
use std::fmt::Display;

/// Raw content of a single cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Blank,
    /// Numeric values, including dates stored as serial numbers
    Number(f64),
    /// Inline or shared string values
    Text(String),
    /// Boolean values (true/false)
    Boolean(bool),
}

impl CellValue {
    /// Name of the cell kind, used in conversion errors.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            CellValue::Blank => "blank",
            CellValue::Number(_) => "numeric",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Text content of a text cell, `None` for any other kind.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for CellValue {
    /// Canonical textual form: numbers without a trailing `.0`, booleans as `true`/`false`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Number(number) => write!(f, "{}", number),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Boolean(boolean) => write!(f, "{}", boolean),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(value.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

/// A single cell with its 0-based position.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

impl Cell {
    pub fn new(row: usize, col: usize, value: impl Into<CellValue>) -> Self {
        Cell { row, col, value: value.into() }
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }
}

/// Converts an ISO 8601 date or date-time string to a 1900-system serial number.
/// Handles the Lotus 1-2-3 leap year bug: serials from 61 on count a phantom 1900-02-29.
pub(crate) fn iso_to_serial(value: &str) -> Result<f64, chrono::ParseError> {
    let datetime = if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")?
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")?
            .and_hms_opt(0, 0, 0)
            .expect("Append 00:00:00")
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal");
    let mut days = (datetime.date() - epoch).num_days();
    if days < 61 {
        days -= 1;
    }
    let time = datetime.time();
    let seconds = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
    Ok(days as f64 + seconds / 86_400f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text() {
        assert_eq!(CellValue::Number(1.0).to_string(), "1");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "true");
        assert_eq!(CellValue::Text("abc".to_owned()).to_string(), "abc");
        assert_eq!(CellValue::Blank.to_string(), "");
    }

    #[test]
    fn conversions() {
        assert_eq!(CellValue::from(""), CellValue::Blank);
        assert_eq!(CellValue::from("x"), CellValue::Text("x".to_owned()));
        assert_eq!(CellValue::from(3), CellValue::Number(3.0));
        assert_eq!(Cell::new(11, 5, true).reference(), "F12");
    }

    #[test]
    fn iso_dates() {
        assert_eq!(iso_to_serial("1900-01-01").unwrap(), 1.0);
        assert_eq!(iso_to_serial("1900-03-01").unwrap(), 61.0);
        assert_eq!(iso_to_serial("2024-01-01").unwrap(), 45292.0);
        assert_eq!(iso_to_serial("2024-01-01T12:00:00").unwrap(), 45292.5);
        assert!(iso_to_serial("not a date").is_err());
    }
}
