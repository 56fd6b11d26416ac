use crate::error::SheetLinkError;
use crate::reader::link::LinkError;
use crate::reader::link::LinkReference;
use crate::reader::link::NormalizedRange;
use crate::reader::value::Record;
use crate::reader::value::Value;
use crate::schema::Composite;
use crate::schema::TypeDescriptor;
use crate::schema::TypeRegistry;
use crate::spreadsheet::Cell;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Workbook;
use std::collections::BTreeMap;

/// State of one top-level coercion.
///
/// `visiting` holds the ranges on the current resolution path; entering a range that
/// overlaps one of them is a cycle.
pub(crate) struct Resolution<'a> {
    pub(crate) workbook: &'a Workbook,
    pub(crate) types: &'a TypeRegistry,
    visiting: Vec<NormalizedRange>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(workbook: &'a Workbook, types: &'a TypeRegistry) -> Self {
        Resolution {
            workbook,
            types,
            visiting: Vec::new(),
        }
    }

    /// Parses a link cell's text and builds the composite it points at.
    pub(crate) fn resolve_link(&mut self, text: &str, composite: Composite<'_>) -> Result<Value, SheetLinkError> {
        let reference = LinkReference::parse(text)?;
        log::debug!("resolve link '{}' (depth {})", text, self.visiting.len());
        match composite {
            Composite::Sequence(_, element) => self.resolve_sequence(&reference, element).map(Value::List),
            Composite::Dictionary(key, value) => self.resolve_dictionary(&reference, key, value).map(Value::Map),
            Composite::Object(name) => self.resolve_object(&reference, name).map(Value::Record),
        }
    }

    /// Every cell of every target in reading order, each coerced to `element`.
    /// Positions past the sheet's populated extent are not read.
    pub(crate) fn resolve_sequence(&mut self, reference: &LinkReference, element: &TypeDescriptor) -> Result<Vec<Value>, SheetLinkError> {
        self.within(reference, |this, ranges| {
            let mut values = Vec::new();
            for range in ranges {
                let sheet = this.sheet(range)?;
                let Some(clipped) = range.clip_to(sheet) else {
                    continue;
                };
                for (row, col) in clipped.positions() {
                    values.push(this.coerce(&sheet.name, &sheet.cell_or_blank(row, col), element)?);
                }
            }
            Ok(values)
        })
    }

    /// Key/value pairs laid out along the range orientation; later keys overwrite earlier ones.
    pub(crate) fn resolve_dictionary(
        &mut self,
        reference: &LinkReference,
        key: &TypeDescriptor,
        value: &TypeDescriptor,
    ) -> Result<BTreeMap<String, Value>, SheetLinkError> {
        self.within(reference, |this, ranges| {
            let mut map = BTreeMap::new();
            for range in ranges {
                let sheet = this.sheet(range)?;
                for (key_cell, value_cell) in pairs(sheet, range)? {
                    let name = this.coerce(&sheet.name, &key_cell, key)?.to_string();
                    let item = this.coerce(&sheet.name, &value_cell, value)?;
                    map.insert(name, item);
                }
            }
            Ok(map)
        })
    }

    /// Field name/value pairs looked up in the schema; unknown names are skipped and
    /// empty values leave their field absent.
    pub(crate) fn resolve_object(&mut self, reference: &LinkReference, declared: &str) -> Result<Record, SheetLinkError> {
        let name = match reference.tag.as_deref() {
            Some(tag) if self.types.contains(tag) => tag,
            Some(tag) => {
                log::warn!("link tag '{}' names no known type, reading as '{}'", tag, declared);
                declared
            }
            None => declared,
        };
        let types = self.types;
        let schema = types.get(name)?;
        self.within(reference, |this, ranges| {
            let mut record = Record::new();
            for range in ranges {
                let sheet = this.sheet(range)?;
                for (name_cell, value_cell) in pairs(sheet, range)? {
                    let field_name = name_cell.value.to_string();
                    let Some(field) = schema.find_field(field_name.trim()) else {
                        log::debug!("skip unknown field '{}' of '{}' in {}", field_name, schema.name, range);
                        continue;
                    };
                    if value_cell.value.is_blank() {
                        continue;
                    }
                    let value = this.coerce(&sheet.name, &value_cell, &field.kind)?;
                    record.insert(field.name.to_owned(), value);
                }
            }
            Ok(record)
        })
    }

    /// Runs `resolve` with the reference's ranges pushed on the resolution path.
    fn within<T, F>(&mut self, reference: &LinkReference, resolve: F) -> Result<T, SheetLinkError>
    where
        F: FnOnce(&mut Self, &[NormalizedRange]) -> Result<T, SheetLinkError>,
    {
        let ranges = reference.normalize(self.workbook)?;
        for range in &ranges {
            if self.visiting.iter().any(|visiting| visiting.overlaps(range)) {
                return Err(LinkError::CyclicReference(range.to_string()).into());
            }
        }

        let depth = self.visiting.len();
        self.visiting.extend(ranges.iter().cloned());
        let result = resolve(self, &ranges);
        self.visiting.truncate(depth);
        result
    }

    fn sheet(&self, range: &NormalizedRange) -> Result<&'a Sheet, LinkError> {
        self.workbook
            .sheet(&range.sheet)
            .ok_or_else(|| LinkError::MalformedLinkReference {
                text: range.to_string(),
                reason: format!("sheet '{}' not found", range.sheet),
            })
    }
}

/// Key and value cells of a two-column (or, when wider than tall, two-row) range.
/// Rows or columns with a blank key are dropped.
fn pairs(sheet: &Sheet, range: &NormalizedRange) -> Result<Vec<(Cell, Cell)>, LinkError> {
    if range.is_row_oriented() && range.height() < 2 {
        return Err(too_narrow(range, "a key row and a value row"));
    }
    if !range.is_row_oriented() && range.width() < 2 {
        return Err(too_narrow(range, "a key column and a value column"));
    }
    // Keys past the populated extent are blank, so only the populated span is walked.
    let Some(span) = range.clip_to(sheet) else {
        return Ok(Vec::new());
    };
    let pairs = if range.is_row_oriented() {
        (span.col_lower..=span.col_upper)
            .map(|col| (sheet.cell_or_blank(range.row_lower, col), sheet.cell_or_blank(range.row_lower + 1, col)))
            .collect::<Vec<_>>()
    } else {
        (span.row_lower..=span.row_upper)
            .map(|row| (sheet.cell_or_blank(row, range.col_lower), sheet.cell_or_blank(row, range.col_lower + 1)))
            .collect::<Vec<_>>()
    };
    Ok(pairs.into_iter().filter(|(key, _)| !key.value.is_blank()).collect())
}

fn too_narrow(range: &NormalizedRange, expected: &str) -> LinkError {
    LinkError::MalformedLinkReference {
        text: range.to_string(),
        reason: format!("expected {}", expected),
    }
}
