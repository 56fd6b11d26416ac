//! # Reader Module
//!
//! Typed reads over a [`Workbook`]: cell coercion against type descriptors, link cells
//! that point at ranges of other sheets, and whole-table reads into records.
//!
//! ```text
//! Items                               Tags
//! | id | name  | tags      |          | red | sweet |
//! | 1  | apple | Tags!A1B1 |   --->
//! ```
use crate::error::SheetLinkError;
use crate::schema::Composite;
use crate::schema::TypeDescriptor;
use crate::schema::TypeRegistry;
use crate::spreadsheet::Cell;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Workbook;
use resolver::Resolution;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod coerce;
pub mod link;
mod options;
mod resolver;
mod table;
pub mod value;

pub use link::LinkReference;
pub use options::ReadOptions;
pub use value::Record;
pub use value::Value;

/// Errors related to table reads.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// A header cell between populated header cells is empty
    #[error("Missing header name at {0}")]
    MissingHeaderColumn(String),

    #[error("Missing key field '{field}' in row {row}")]
    MissingKeyField { field: String, row: String },
}

/// Entry point for typed reads against one workbook and one type registry.
#[derive(Copy, Clone)]
pub struct SheetReader<'a> {
    workbook: &'a Workbook,
    types: &'a TypeRegistry,
}

impl<'a> SheetReader<'a> {
    pub fn new(workbook: &'a Workbook, types: &'a TypeRegistry) -> Self {
        SheetReader { workbook, types }
    }

    pub fn workbook(&self) -> &'a Workbook {
        self.workbook
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn sheet(&self, name: &str) -> Result<&'a Sheet, ReaderError> {
        self.workbook
            .sheet(name)
            .ok_or_else(|| ReaderError::SheetNotFound(name.to_owned()))
    }

    /// Coerces one cell of `sheet_name` to `kind`, following link cells into the workbook.
    pub fn coerce(&self, sheet_name: &str, cell: &Cell, kind: &TypeDescriptor) -> Result<Value, SheetLinkError> {
        Resolution::new(self.workbook, self.types).coerce(sheet_name, cell, kind)
    }

    pub fn resolve_array(&self, reference: &LinkReference, element: &TypeDescriptor) -> Result<Vec<Value>, SheetLinkError> {
        self.resolve_list(reference, element)
    }

    pub fn resolve_list(&self, reference: &LinkReference, element: &TypeDescriptor) -> Result<Vec<Value>, SheetLinkError> {
        Resolution::new(self.workbook, self.types).resolve_sequence(reference, element)
    }

    /// Resolves a dictionary with string keys.
    pub fn resolve_dictionary(&self, reference: &LinkReference, value: &TypeDescriptor) -> Result<BTreeMap<String, Value>, SheetLinkError> {
        Resolution::new(self.workbook, self.types).resolve_dictionary(reference, &TypeDescriptor::String, value)
    }

    /// Resolves a record of the named schema, or of the schema named by the reference's tag.
    pub fn resolve_object(&self, reference: &LinkReference, schema: &str) -> Result<Record, SheetLinkError> {
        Resolution::new(self.workbook, self.types).resolve_object(reference, schema)
    }

    /// Resolves a reference against any composite descriptor.
    pub fn resolve(&self, reference: &LinkReference, kind: &TypeDescriptor) -> Result<Value, SheetLinkError> {
        let mut resolution = Resolution::new(self.workbook, self.types);
        match kind.as_composite() {
            Some(Composite::Sequence(_, element)) => resolution.resolve_sequence(reference, element).map(Value::List),
            Some(Composite::Dictionary(key, value)) => resolution.resolve_dictionary(reference, key, value).map(Value::Map),
            Some(Composite::Object(name)) => resolution.resolve_object(reference, name).map(Value::Record),
            None => Err(coerce::CoerceError::UnsupportedConversion {
                position: reference.targets.iter().map(ToString::to_string).collect::<Vec<_>>().join(";"),
                from: "link".to_owned(),
                to: kind.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::spreadsheet::xlsx::tests::build_package;
    use crate::spreadsheet::xlsx::XlsxSpreadsheet;
    use crate::spreadsheet::Criteria;
    use crate::spreadsheet::Spreadsheet;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn workbook() -> Workbook {
        Workbook::new(vec![
            Sheet::from_rows("Colors", vec![vec!["red", "1"], vec!["blue", "2"]]),
            Sheet::from_rows("Stats", vec![vec!["hp", "10"], vec!["mp", "Colors!A1A2"]]),
        ])
    }

    fn types() -> TypeRegistry {
        TypeRegistry::new().with(Schema::parse("Stats", &[("hp", "int"), ("mp", "string[]")]).unwrap())
    }

    #[test]
    fn coerce_cells() {
        let workbook = workbook();
        let types = types();
        let reader = SheetReader::new(&workbook, &types);

        let cell = Cell::new(0, 0, "12");
        assert_eq!(reader.coerce("Any", &cell, &TypeDescriptor::Long).unwrap(), Value::Long(12));

        let cell = Cell::new(0, 0, "Colors!A1B2");
        let kind = TypeDescriptor::parse("Dictionary<string, int>").unwrap();
        assert_eq!(reader.coerce("Any", &cell, &kind).unwrap().to_json().unwrap(), json!({"red": 1, "blue": 2}));

        let cell = Cell::new(0, 0, "");
        assert_eq!(reader.coerce("Any", &cell, &kind).unwrap(), Value::Null);
    }

    #[test]
    fn resolve_references() {
        let workbook = workbook();
        let types = types();
        let reader = SheetReader::new(&workbook, &types);

        let reference = LinkReference::parse("Colors!A1,").unwrap();
        assert_eq!(
            reader.resolve_list(&reference, &TypeDescriptor::String).unwrap(),
            vec![Value::from("red"), Value::from("1"), Value::from("blue"), Value::from("2")]
        );
        assert_eq!(reader.resolve_array(&reference, &TypeDescriptor::String).unwrap().len(), 4);

        let map = reader.resolve_dictionary(&reference, &TypeDescriptor::Double).unwrap();
        assert_eq!(map["blue"], Value::Double(2.0));

        let reference = LinkReference::parse("Stats!A1B2").unwrap();
        let stats = reader.resolve_object(&reference, "Stats").unwrap();
        assert_eq!(Value::Record(stats).to_json().unwrap(), json!({"hp": 10, "mp": ["red", "blue"]}));

        assert!(matches!(
            reader.resolve(&reference, &TypeDescriptor::Int),
            Err(SheetLinkError::CoerceError(_))
        ));
    }

    #[test]
    fn read_loaded_workbook() {
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("test.xlsx", build_package()).unwrap();
        let criteria = Criteria::with_sheet_names(&["Items"]).unwrap();
        let mut workbook = Workbook::new(spreadsheet.read_sheets(&criteria).unwrap());
        workbook.push(Sheet::from_rows("Tags", vec![vec!["red", "green", "blue"]]));

        let types = TypeRegistry::new();
        let schema = Schema::parse("Item", &[("id", "int"), ("tags", "List<string>")]).unwrap();
        let reader = SheetReader::new(&workbook, &types);
        let records = reader.read_list(reader.sheet("Items").unwrap(), &schema, &ReadOptions::default()).unwrap();

        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([{"id": 7, "tags": ["red", "green", "blue"]}])
        );
        assert!(matches!(reader.sheet("Missing"), Err(ReaderError::SheetNotFound(_))));
    }
}
