//! # Workbook Module
//!
//! The read-only, in-memory workbook that every typed read runs against: named
//! sheets of sparse cells holding numeric, text, boolean or blank values. Workbooks
//! are built in memory or loaded from `.xlsx`/`.xlsm` packages.
use crate::error::SheetLinkError;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

pub mod cell;
pub mod criteria;
pub mod reference;
mod relationships;
pub mod sheet;
pub mod xlsx;

pub use cell::Cell;
pub use cell::CellValue;
pub use criteria::Criteria;
pub use sheet::Sheet;

/// Errors raised while loading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    /// A part of the package is missing
    #[error("Missing part '{0}' in workbook package")]
    FileError(String),

    /// The package declares no sheets
    #[error("Workbook '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    /// Error cell found while loading (file, sheet, reference, value)
    #[error("Error value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),

    /// Shared string index out of range
    #[error("Shared string index {0} out of range")]
    SharedStringError(usize),
}

/// A workbook file format that can be loaded into [`Sheet`]s.
pub trait Spreadsheet {
    /// Returns the file name of this spreadsheet
    fn name(&self) -> String;

    /// Reads every sheet accepted by the criteria, in workbook order
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, SheetLinkError>;
}

/// An ordered collection of named sheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    /// Opens a workbook file, detecting the format from the file extension.
    ///
    /// Supported formats: `.xlsx`, `.xlsm`.
    pub fn open<P>(path: P, criteria: &Criteria) -> Result<Workbook, SheetLinkError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file_name = path.to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase());
        let mut spreadsheet: Box<dyn Spreadsheet> = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Box::new(XlsxSpreadsheet::open(&file_name)?),
            _ => Err(SpreadsheetError::InvalidFileFormat(file_name))?,
        };
        Ok(Workbook::new(spreadsheet.read_sheets(criteria)?))
    }

    /// Adds a sheet, replacing any sheet with the same name.
    pub fn push(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|it| it.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Gets a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Returns the names of all sheets in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}
