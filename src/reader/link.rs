//! Link cells: the reference-address mini-language pointing a cell at ranges of other sheets.
//!
//! ```text
//! __TAG;Sheet!A1F12;Other!1F1;Third!A1,2;Fourth!,D2
//! ```
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_col;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Workbook;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;
use thiserror::Error;

/// Prefix marking a link cell (and introducing its optional tag).
pub const LINK_MARKER: &str = "__";

/// Separates the sheet name from the address.
const SHEET_SEPARATOR: char = '!';

/// Separates the tag and the targets.
const TARGET_SEPARATOR: char = ';';

/// `A1`
static SINGLE_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z]+)(\d+)$").expect("Hardcode regex pattern"));

/// `A1F12`
static RECTANGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)(\d+)([A-Z]+)(\d+)$").expect("Hardcode regex pattern"));

/// `1F1`
static ROW_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([A-Z]+)(\d+)$").expect("Hardcode regex pattern"));

/// `A1,2`, `,D2`, `B,`
static OPEN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]*)(\d*),([A-Z]*)(\d*)$").expect("Hardcode regex pattern"));

/// Errors related to link parsing and resolution.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Malformed link reference '{text}': {reason}")]
    MalformedLinkReference { text: String, reason: String },

    /// A range that is already being resolved was entered again
    #[error("Cyclic link reference through '{0}'")]
    CyclicReference(String),
}

fn malformed(text: &str, reason: impl Into<String>) -> LinkError {
    LinkError::MalformedLinkReference {
        text: text.to_owned(),
        reason: reason.into(),
    }
}

/// Returns true if the text encodes a link rather than an inline literal.
///
/// Any text containing `!` counts as a link, so inline literals holding `!` must be avoided.
pub fn is_link_cell(text: &str) -> bool {
    text.starts_with(LINK_MARKER) || text.contains(SHEET_SEPARATOR)
}

/// One corner of a range; `None` on an axis means open (the sheet's natural bound).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CellBound {
    pub row: Option<usize>,
    pub col: Option<usize>,
}

impl CellBound {
    pub fn new(row: usize, col: usize) -> Self {
        CellBound {
            row: Some(row),
            col: Some(col),
        }
    }

    fn parse(text: &str, letters: &str, digits: &str) -> Result<Self, LinkError> {
        let col = match letters {
            "" => None,
            letters => Some(col_to_index(letters).ok_or_else(|| malformed(text, format!("invalid column '{}'", letters)))?),
        };
        let row = match digits {
            "" => None,
            digits => Some(row_to_index(digits).ok_or_else(|| malformed(text, format!("invalid row '{}'", digits)))?),
        };
        Ok(CellBound { row, col })
    }
}

/// A range on a named sheet, possibly open on some sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRangeRef {
    pub sheet_name: String,
    /// Top-left corner
    pub anchor: CellBound,
    /// Bottom-right corner
    pub extent: CellBound,
}

impl SheetRangeRef {
    /// Parses `SheetName!Address`; the sheet name may be single-quoted.
    pub fn parse(text: &str) -> Result<Self, LinkError> {
        let (sheet_name, address) = text
            .rsplit_once(SHEET_SEPARATOR)
            .ok_or_else(|| malformed(text, "missing sheet name"))?;
        let sheet_name = sheet_name.trim();
        let sheet_name = sheet_name
            .strip_prefix('\'')
            .and_then(|it| it.strip_suffix('\''))
            .unwrap_or(sheet_name);
        if sheet_name.is_empty() {
            return Err(malformed(text, "missing sheet name"));
        }

        let address = address.trim().to_ascii_uppercase();
        let (anchor, extent) = if let Some(captures) = SINGLE_CELL.captures(&address) {
            let cell = CellBound::parse(text, &captures[1], &captures[2])?;
            (cell, cell)
        } else if let Some(captures) = RECTANGLE.captures(&address) {
            (
                CellBound::parse(text, &captures[1], &captures[2])?,
                CellBound::parse(text, &captures[3], &captures[4])?,
            )
        } else if let Some(captures) = ROW_SPAN.captures(&address) {
            let start = CellBound::parse(text, "", &captures[1])?;
            let end = CellBound::parse(text, &captures[2], &captures[3])?;
            (start, CellBound { row: end.row, col: None })
        } else if let Some(captures) = OPEN_RANGE.captures(&address) {
            (
                CellBound::parse(text, &captures[1], &captures[2])?,
                CellBound::parse(text, &captures[3], &captures[4])?,
            )
        } else {
            return Err(malformed(text, format!("unrecognized address '{}'", address)));
        };

        Ok(SheetRangeRef {
            sheet_name: sheet_name.to_owned(),
            anchor,
            extent,
        })
    }

    /// Closes the open sides with the sheet's natural extent.
    pub fn normalize(&self, sheet: &Sheet) -> Result<NormalizedRange, LinkError> {
        let text = self.to_string();
        let bound = |value: Option<usize>, natural: Option<usize>| {
            value
                .or(natural)
                .ok_or_else(|| malformed(&text, format!("open bound on empty sheet '{}'", sheet.name)))
        };
        let range = NormalizedRange {
            sheet: sheet.name.to_owned(),
            row_lower: bound(self.anchor.row, sheet.first_row())?,
            row_upper: bound(self.extent.row, sheet.last_row())?,
            col_lower: bound(self.anchor.col, sheet.first_col())?,
            col_upper: bound(self.extent.col, sheet.last_col())?,
        };
        if range.row_lower > range.row_upper || range.col_lower > range.col_upper {
            return Err(malformed(&text, "inverted bounds"));
        }
        Ok(range)
    }
}

impl Display for SheetRangeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |bound: &CellBound| {
            let col = bound.col.map(index_to_col).unwrap_or_default();
            let row = bound.row.map(|row| (row + 1).to_string()).unwrap_or_default();
            format!("{}{}", col, row)
        };
        write!(f, "{}!{},{}", self.sheet_name, bound(&self.anchor), bound(&self.extent))
    }
}

/// Parsed text of a link cell: an optional tag and one or more target ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkReference {
    pub tag: Option<String>,
    pub targets: Vec<SheetRangeRef>,
}

impl LinkReference {
    pub fn parse(text: &str) -> Result<Self, LinkError> {
        let mut tag = None;
        let mut targets = Vec::new();
        for (index, segment) in text.split(TARGET_SEPARATOR).map(str::trim).enumerate() {
            if segment.is_empty() {
                continue;
            }
            match segment.strip_prefix(LINK_MARKER) {
                Some(name) if index == 0 && !name.contains(SHEET_SEPARATOR) => {
                    tag = Some(name.trim().to_owned()).filter(|name| !name.is_empty());
                }
                _ => targets.push(SheetRangeRef::parse(segment)?),
            }
        }
        if targets.is_empty() {
            return Err(malformed(text, "no target range"));
        }
        Ok(LinkReference { tag, targets })
    }

    /// Normalizes every target against its sheet in the workbook.
    pub fn normalize(&self, workbook: &Workbook) -> Result<Vec<NormalizedRange>, LinkError> {
        self.targets
            .iter()
            .map(|target| {
                let sheet = workbook
                    .sheet(&target.sheet_name)
                    .ok_or_else(|| malformed(&target.to_string(), format!("sheet '{}' not found", target.sheet_name)))?;
                target.normalize(sheet)
            })
            .collect()
    }
}

/// A closed rectangular range; the identity used for cycle detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedRange {
    pub sheet: String,
    pub row_lower: usize,
    pub row_upper: usize,
    pub col_lower: usize,
    pub col_upper: usize,
}

impl NormalizedRange {
    pub fn height(&self) -> usize {
        self.row_upper - self.row_lower + 1
    }

    pub fn width(&self) -> usize {
        self.col_upper - self.col_lower + 1
    }

    /// A range wider than tall keeps its keys in the first row.
    pub fn is_row_oriented(&self) -> bool {
        self.width() > self.height()
    }

    pub fn overlaps(&self, other: &NormalizedRange) -> bool {
        self.sheet == other.sheet
            && self.row_lower <= other.row_upper
            && other.row_lower <= self.row_upper
            && self.col_lower <= other.col_upper
            && other.col_lower <= self.col_upper
    }

    /// The part of this range inside the sheet's natural extent, `None` when they do not meet.
    pub fn clip_to(&self, sheet: &Sheet) -> Option<NormalizedRange> {
        let (first_row, last_row) = (sheet.first_row()?, sheet.last_row()?);
        let (first_col, last_col) = (sheet.first_col()?, sheet.last_col()?);
        let clipped = NormalizedRange {
            sheet: self.sheet.to_owned(),
            row_lower: self.row_lower.max(first_row),
            row_upper: self.row_upper.min(last_row),
            col_lower: self.col_lower.max(first_col),
            col_upper: self.col_upper.min(last_col),
        };
        (clipped.row_lower <= clipped.row_upper && clipped.col_lower <= clipped.col_upper).then_some(clipped)
    }

    /// Positions in reading order: left to right, then top to bottom.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row_lower..=self.row_upper).flat_map(move |row| (self.col_lower..=self.col_upper).map(move |col| (row, col)))
    }
}

impl Display for NormalizedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}!{}:{}",
            self.sheet,
            index_to_reference(self.row_lower, self.col_lower),
            index_to_reference(self.row_upper, self.col_upper)
        )
    }
}
