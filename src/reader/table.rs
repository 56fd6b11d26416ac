use crate::error::SheetLinkError;
use crate::reader::coerce::position;
use crate::reader::resolver::Resolution;
use crate::reader::value::Record;
use crate::reader::ReadOptions;
use crate::reader::ReaderError;
use crate::reader::SheetReader;
use crate::schema::Schema;
use crate::spreadsheet::Sheet;
use std::collections::BTreeMap;

/// Records of a table read, with the header they were read under.
struct Table {
    header: Vec<String>,
    /// (row index, record)
    rows: Vec<(usize, Record)>,
}

impl SheetReader<'_> {
    /// Reads every data row of `sheet` as a record of `schema`, in row order.
    pub fn read_list(&self, sheet: &Sheet, schema: &Schema, options: &ReadOptions) -> Result<Vec<Record>, SheetLinkError> {
        let table = self.read_table(sheet, schema, options)?;
        log::debug!("read {} records of '{}' from sheet '{}'", table.rows.len(), schema.name, sheet.name);
        Ok(table.rows.into_iter().map(|(_, record)| record).collect())
    }

    /// Reads the table as a mapping from key field text to record; later rows overwrite earlier ones.
    pub fn read_dictionary(
        &self,
        sheet: &Sheet,
        schema: &Schema,
        options: &ReadOptions,
    ) -> Result<BTreeMap<String, Record>, SheetLinkError> {
        let table = self.read_table(sheet, schema, options)?;
        let Some(key_field) = options.key_field.as_ref().or(table.header.first()) else {
            return Ok(BTreeMap::new());
        };

        let mut records = BTreeMap::new();
        for (row, mut record) in table.rows {
            let key = record
                .get(key_field)
                .map(ToString::to_string)
                .ok_or_else(|| ReaderError::MissingKeyField {
                    field: key_field.to_owned(),
                    row: format!("{}!{}", sheet.name, row + 1),
                })?;
            if options.remove_key_in_element {
                record.remove(key_field);
            }
            records.insert(key, record);
        }
        log::debug!("read {} keyed records of '{}' from sheet '{}'", records.len(), schema.name, sheet.name);
        Ok(records)
    }

    fn read_table(&self, sheet: &Sheet, schema: &Schema, options: &ReadOptions) -> Result<Table, SheetLinkError> {
        let empty = Table {
            header: Vec::new(),
            rows: Vec::new(),
        };
        let (Some(first_row), Some(last_row), Some(first_col), Some(last_col)) =
            (sheet.first_row(), sheet.last_row(), sheet.first_col(), sheet.last_col())
        else {
            return Ok(empty);
        };

        let col_lower = first_col.saturating_add(options.col_start);
        let col_upper = match options.col_end.filter(|col_end| *col_end > 0) {
            Some(col_end) => (first_col.saturating_add(col_end) - 1).min(last_col),
            None => last_col,
        };
        if col_lower > col_upper {
            return Ok(empty);
        }
        let mut header = match options.header.as_ref().filter(|header| !header.is_empty()) {
            Some(header) => header.to_owned(),
            None => read_header(sheet, first_row.saturating_add(options.header_offset), col_lower, col_upper)?,
        };
        header.truncate(col_upper - col_lower + 1);
        if header.is_empty() {
            return Ok(empty);
        }
        let fields = schema.prepare_header_fields(&header)?;
        let header_col_upper = col_lower + fields.len() - 1;

        let row_lower = first_row.saturating_add(options.data_start());
        let row_upper = match options.data_end.filter(|data_end| *data_end > 0) {
            Some(data_end) => first_row.saturating_add(data_end).min(last_row),
            None => last_row,
        };

        let mut resolution = Resolution::new(self.workbook, self.types);
        let mut rows = Vec::new();
        for row in row_lower..=row_upper {
            if sheet.row_is_empty(row, col_lower, header_col_upper) {
                if options.end_at_empty_row {
                    break;
                }
                if options.skip_empty_rows {
                    continue;
                }
            }
            let mut record = Record::new();
            for (offset, field) in fields.iter().enumerate() {
                if let Some(cell) = sheet.get(row, col_lower + offset) {
                    record.insert(field.name.to_owned(), resolution.coerce(&sheet.name, cell, &field.kind)?);
                }
            }
            log::trace!("read row {} of sheet '{}' with {} fields", row + 1, sheet.name, record.len());
            rows.push((row, record));
        }
        Ok(Table { header, rows })
    }
}

/// Field names of the header row, up to its last populated cell.
fn read_header(sheet: &Sheet, row: usize, col_lower: usize, col_upper: usize) -> Result<Vec<String>, ReaderError> {
    let Some(last) = (col_lower..=col_upper).rev().find(|col| sheet.get(row, *col).is_some()) else {
        return Ok(Vec::new());
    };
    (col_lower..=last)
        .map(|col| {
            sheet
                .get(row, col)
                .map(|cell| cell.value.to_string().trim().to_owned())
                .ok_or_else(|| ReaderError::MissingHeaderColumn(position(&sheet.name, row, col)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;
    use crate::schema::TypeRegistry;
    use crate::spreadsheet::Workbook;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn workbook() -> Workbook {
        Workbook::new(vec![
            Sheet::from_rows(
                "Items",
                vec![
                    vec!["id", "name", "tags"],
                    vec!["1", "apple", "Tags!A1B1"],
                    vec!["2", "pear", "[\"x\"]"],
                    vec!["", "", ""],
                    vec!["3", "plum", ""],
                    vec!["1", "lemon", ""],
                ],
            ),
            Sheet::from_rows("Tags", vec![vec!["red", "sweet"]]),
        ])
    }

    fn item() -> Schema {
        Schema::parse("Item", &[("id", "int"), ("name", "string"), ("tags", "string[]")]).unwrap()
    }

    fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn read_list() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let records = reader.read_list(reader.sheet("Items").unwrap(), &item(), &ReadOptions::default()).unwrap();

        assert_eq!(
            to_json(&records),
            json!([
                {"id": 1, "name": "apple", "tags": ["red", "sweet"]},
                {"id": 2, "name": "pear", "tags": ["x"]},
                {"id": 3, "name": "plum"},
                {"id": 1, "name": "lemon"},
            ])
        );
    }

    #[test]
    fn read_list_clips_rows_and_columns() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let sheet = reader.sheet("Items").unwrap();

        let options = ReadOptions::new().with_data_start(2).with_data_end(100).with_col_end(2);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(
            to_json(&records),
            json!([{"id": 2, "name": "pear"}, {"id": 3, "name": "plum"}, {"id": 1, "name": "lemon"}])
        );

        let options = ReadOptions::new().with_data_end(2).with_col_start(1).with_col_end(2);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(to_json(&records), json!([{"name": "apple"}, {"name": "pear"}]));
    }

    #[test]
    fn read_list_empty_rows() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let sheet = reader.sheet("Items").unwrap();

        let options = ReadOptions::new().with_skip_empty_rows(false);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records[2].is_empty());

        let options = ReadOptions::new().with_end_at_empty_row(true);
        assert_eq!(reader.read_list(sheet, &item(), &options).unwrap().len(), 2);
    }

    #[test]
    fn read_list_with_header() {
        let workbook = Workbook::new(vec![Sheet::from_rows("Data", vec![vec!["5", "five"], vec!["6", "six"]])]);
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let options = ReadOptions::new().with_header(&["id", "name"]).with_data_start(0);
        let records = reader.read_list(reader.sheet("Data").unwrap(), &item(), &options).unwrap();
        assert_eq!(to_json(&records), json!([{"id": 5, "name": "five"}, {"id": 6, "name": "six"}]));
    }

    #[test]
    fn read_list_offset_table() {
        let mut sheet = Sheet::new("Offset");
        for (row, values) in [["id", "name"], ["4", "kiwi"]].iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                sheet.push(crate::spreadsheet::Cell::new(row + 3, col + 2, *value));
            }
        }
        let workbook = Workbook::new(vec![sheet]);
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let records = reader.read_list(reader.sheet("Offset").unwrap(), &item(), &ReadOptions::default()).unwrap();
        assert_eq!(to_json(&records), json!([{"id": 4, "name": "kiwi"}]));
    }

    #[test]
    fn read_list_offset_table_with_unbounded_ends() {
        let mut sheet = Sheet::new("Offset");
        for (row, values) in [["id", "name"], ["4", "kiwi"], ["5", "fig"]].iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                sheet.push(crate::spreadsheet::Cell::new(row + 3, col + 2, *value));
            }
        }
        let workbook = Workbook::new(vec![sheet]);
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let sheet = reader.sheet("Offset").unwrap();

        let options = ReadOptions::new().with_data_end(usize::MAX).with_col_end(usize::MAX);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(to_json(&records), json!([{"id": 4, "name": "kiwi"}, {"id": 5, "name": "fig"}]));

        let options = ReadOptions::new().with_col_start(usize::MAX).with_header_offset(usize::MAX);
        assert!(reader.read_list(sheet, &item(), &options).unwrap().is_empty());
        let options = ReadOptions::new().with_header_offset(usize::MAX);
        assert!(reader.read_list(sheet, &item(), &options).unwrap().is_empty());
    }

    #[test]
    fn read_list_explicit_header_clipped_by_col_end() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let sheet = reader.sheet("Items").unwrap();

        let options = ReadOptions::new().with_header(&["id", "name", "tags"]).with_col_end(2).with_data_end(2);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(to_json(&records), json!([{"id": 1, "name": "apple"}, {"id": 2, "name": "pear"}]));

        let options = ReadOptions::new().with_header(&["name", "tags"]).with_col_start(1).with_col_end(2).with_data_end(1);
        let records = reader.read_list(sheet, &item(), &options).unwrap();
        assert_eq!(to_json(&records), json!([{"name": "apple"}]));
    }

    #[test]
    fn read_list_errors() {
        let workbook = Workbook::new(vec![
            Sheet::from_rows("Unknown", vec![vec!["id", "price"], vec!["1", "2"]]),
            Sheet::from_rows("Gap", vec![vec!["id", "", "name"], vec!["1", "", "x"]]),
            Sheet::from_rows("Bad", vec![vec!["id"], vec!["one"]]),
        ]);
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let options = ReadOptions::default();

        assert!(matches!(
            reader.read_list(reader.sheet("Unknown").unwrap(), &item(), &options),
            Err(SheetLinkError::SchemaError(SchemaError::UnknownField(_, _)))
        ));
        assert!(matches!(
            reader.read_list(reader.sheet("Gap").unwrap(), &item(), &options),
            Err(SheetLinkError::ReaderError(ReaderError::MissingHeaderColumn(_)))
        ));
        assert!(matches!(
            reader.read_list(reader.sheet("Bad").unwrap(), &item(), &options),
            Err(SheetLinkError::CoerceError(_))
        ));
        assert!(reader.read_list(&Sheet::new("Empty"), &item(), &options).unwrap().is_empty());
    }

    #[test]
    fn read_dictionary_last_row_wins() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let records = reader.read_dictionary(reader.sheet("Items").unwrap(), &item(), &ReadOptions::default()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(to_json(&records["1"]), json!({"id": 1, "name": "lemon"}));
        assert_eq!(to_json(&records["3"]), json!({"id": 3, "name": "plum"}));
    }

    #[test]
    fn read_dictionary_remove_key() {
        let workbook = workbook();
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let options = ReadOptions::new().with_key_field("name").with_remove_key_in_element(true);
        let records = reader.read_dictionary(reader.sheet("Items").unwrap(), &item(), &options).unwrap();

        assert_eq!(
            to_json(&records),
            json!({
                "apple": {"id": 1, "tags": ["red", "sweet"]},
                "lemon": {"id": 1},
                "pear": {"id": 2, "tags": ["x"]},
                "plum": {"id": 3},
            })
        );
    }

    #[test]
    fn read_dictionary_missing_key() {
        let workbook = Workbook::new(vec![Sheet::from_rows("Items", vec![vec!["id", "name"], vec!["", "nameless"]])]);
        let types = TypeRegistry::new();
        let reader = SheetReader::new(&workbook, &types);
        let result = reader.read_dictionary(reader.sheet("Items").unwrap(), &item(), &ReadOptions::default());
        assert!(matches!(
            result,
            Err(SheetLinkError::ReaderError(ReaderError::MissingKeyField { field, row })) if field == "id" && row == "Items!2"
        ));
    }
}
