use thiserror::Error;

/// Main error type for the sheetlink crate.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum SheetLinkError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    ParseDateTimeError(#[from] chrono::ParseError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Schema module errors
    #[error("{0}")]
    SchemaError(#[from] crate::schema::SchemaError),

    // Reader module errors
    #[error("{0}")]
    CoerceError(#[from] crate::reader::coerce::CoerceError),

    #[error("{0}")]
    LinkError(#[from] crate::reader::link::LinkError),

    #[error("{0}")]
    ReaderError(#[from] crate::reader::ReaderError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SheetLinkError> = std::result::Result<T, E>;

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetLinkError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetLinkError::WithContextError(format!("{}: {}", message, e)))
    }
}
