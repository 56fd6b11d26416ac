//! Per-cell value coercion: scalar conversions, link routing and inline JSON literals.
use crate::error::SheetLinkError;
use crate::reader::link::is_link_cell;
use crate::reader::resolver::Resolution;
use crate::reader::value::Record;
use crate::reader::value::Value;
use crate::schema::Composite;
use crate::schema::TypeDescriptor;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::Cell;
use crate::spreadsheet::CellValue;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to converting cell content to a declared type.
#[derive(Error, Debug)]
pub enum CoerceError {
    /// Text that does not parse as the target type
    #[error("Cannot parse '{value}' at {position} as {kind}")]
    FormatError { position: String, value: String, kind: String },

    /// A cell kind with no conversion to the target type
    #[error("Cannot convert {from} value at {position} to {to}")]
    UnsupportedConversion { position: String, from: String, to: String },
}

/// Formats a cell position as `Sheet!A1`, or `A1` without a sheet name.
pub(crate) fn position(sheet_name: &str, row: usize, col: usize) -> String {
    if sheet_name.is_empty() {
        index_to_reference(row, col)
    } else {
        format!("{}!{}", sheet_name, index_to_reference(row, col))
    }
}

fn format_error(position: &str, value: &str, kind: &TypeDescriptor) -> CoerceError {
    CoerceError::FormatError {
        position: position.to_owned(),
        value: value.to_owned(),
        kind: kind.to_string(),
    }
}

fn unsupported(position: &str, from: &str, to: &TypeDescriptor) -> CoerceError {
    CoerceError::UnsupportedConversion {
        position: position.to_owned(),
        from: from.to_owned(),
        to: to.to_string(),
    }
}

fn parse_text<T: FromStr>(text: &str, position: &str, kind: &TypeDescriptor) -> Result<T, CoerceError> {
    text.trim()
        .parse::<T>()
        .map_err(|_| format_error(position, text, kind))
}

/// Converts a raw cell value to a primitive kind.
///
/// | kind   | number          | text                | boolean    | blank |
/// |--------|-----------------|---------------------|------------|-------|
/// | int    | truncated       | parsed              | 1 / 0      | error |
/// | long   | truncated       | parsed              | error      | error |
/// | float  | narrowed        | parsed              | error      | error |
/// | double | as is           | parsed              | error      | error |
/// | bool   | non-zero        | `true` / `false`    | as is      | error |
/// | string | canonical text  | as is               | `true`     | `""`  |
pub fn coerce_scalar(value: &CellValue, kind: &TypeDescriptor, position: &str) -> Result<Value, CoerceError> {
    let from = value.kind_name();
    match (kind, value) {
        (TypeDescriptor::String, value) => Ok(Value::String(value.to_string())),
        (TypeDescriptor::Int, CellValue::Number(number)) => Ok(Value::Int(*number as i32)),
        (TypeDescriptor::Int, CellValue::Text(text)) => Ok(Value::Int(parse_text(text, position, kind)?)),
        (TypeDescriptor::Int, CellValue::Boolean(boolean)) => Ok(Value::Int(*boolean as i32)),
        (TypeDescriptor::Long, CellValue::Number(number)) => Ok(Value::Long(*number as i64)),
        (TypeDescriptor::Long, CellValue::Text(text)) => Ok(Value::Long(parse_text(text, position, kind)?)),
        (TypeDescriptor::Float, CellValue::Number(number)) => Ok(Value::Float(*number as f32)),
        (TypeDescriptor::Float, CellValue::Text(text)) => Ok(Value::Float(parse_text(text, position, kind)?)),
        (TypeDescriptor::Double, CellValue::Number(number)) => Ok(Value::Double(*number)),
        (TypeDescriptor::Double, CellValue::Text(text)) => Ok(Value::Double(parse_text(text, position, kind)?)),
        (TypeDescriptor::Boolean, CellValue::Boolean(boolean)) => Ok(Value::Boolean(*boolean)),
        (TypeDescriptor::Boolean, CellValue::Number(number)) => Ok(Value::Boolean(*number != 0.0)),
        (TypeDescriptor::Boolean, CellValue::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(format_error(position, text, kind)),
        },
        _ => Err(unsupported(position, from, kind)),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "numeric",
        JsonValue::String(_) => "text",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Resolution<'_> {
    /// Dispatches on the descriptor: scalars convert directly, composites follow a link or
    /// decode an inline JSON literal.
    pub(crate) fn coerce(&mut self, sheet_name: &str, cell: &Cell, kind: &TypeDescriptor) -> Result<Value, SheetLinkError> {
        let position = position(sheet_name, cell.row, cell.col);
        let Some(composite) = kind.as_composite() else {
            return Ok(coerce_scalar(&cell.value, kind, &position)?);
        };
        match &cell.value {
            CellValue::Blank => Ok(Value::Null),
            CellValue::Text(text) if is_link_cell(text) => self.resolve_link(text, composite),
            CellValue::Text(text) => self.decode_inline(text, kind, &position),
            other => Err(unsupported(&position, other.kind_name(), kind).into()),
        }
    }

    /// Decodes an inline literal such as `[1, 2]` or `{"a": 1}` against the descriptor.
    pub(crate) fn decode_inline(&self, text: &str, kind: &TypeDescriptor, position: &str) -> Result<Value, SheetLinkError> {
        let json: JsonValue = serde_json::from_str(text).map_err(|_| format_error(position, text, kind))?;
        self.decode_json(&json, kind, position)
    }

    fn decode_json(&self, json: &JsonValue, kind: &TypeDescriptor, position: &str) -> Result<Value, SheetLinkError> {
        let Some(composite) = kind.as_composite() else {
            let value = match json {
                JsonValue::Number(number) if *kind == TypeDescriptor::Long && number.is_i64() => {
                    return Ok(Value::Long(number.as_i64().unwrap_or_default()));
                }
                JsonValue::Null => CellValue::Blank,
                JsonValue::Bool(boolean) => CellValue::Boolean(*boolean),
                JsonValue::Number(number) => number.as_f64().map(CellValue::Number).unwrap_or_default(),
                JsonValue::String(text) => CellValue::Text(text.to_owned()),
                JsonValue::Array(_) | JsonValue::Object(_) if *kind == TypeDescriptor::String => {
                    return Ok(Value::String(json.to_string()));
                }
                other => Err(unsupported(position, json_kind(other), kind))?,
            };
            return Ok(coerce_scalar(&value, kind, position)?);
        };

        match (composite, json) {
            (_, JsonValue::Null) => Ok(Value::Null),
            (Composite::Sequence(_, element), JsonValue::Array(items)) => items
                .iter()
                .map(|item| self.decode_json(item, element, position))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (Composite::Dictionary(key, value), JsonValue::Object(entries)) => {
                let mut map = BTreeMap::new();
                for (name, item) in entries {
                    let name = coerce_scalar(&CellValue::Text(name.to_owned()), key, position)?;
                    map.insert(name.to_string(), self.decode_json(item, value, position)?);
                }
                Ok(Value::Map(map))
            }
            (Composite::Object(name), JsonValue::Object(entries)) => {
                let schema = self.types.get(name)?;
                let mut record = Record::new();
                for (field_name, item) in entries {
                    match schema.find_field(field_name) {
                        Some(field) => {
                            record.insert(field.name.to_owned(), self.decode_json(item, &field.kind, position)?);
                        }
                        None => log::debug!("skip unknown field '{}' of '{}' at {}", field_name, name, position),
                    }
                }
                Ok(Value::Record(record))
            }
            (_, other) => Err(unsupported(position, json_kind(other), kind).into()),
        }
    }
}
