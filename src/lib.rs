//! # sheetlink
//!
//! Extracts strongly-typed records from spreadsheet tables. A cell may hold an inline
//! JSON literal or a link that points into a range of another sheet, from which arrays,
//! lists, dictionaries and nested objects are rebuilt.
//!
//! ## Features
//!
//! - **Type descriptors**: `int`, `long`, `float`, `double`, `bool`, `string`, `T[]`,
//!   `List<T>`, `Dictionary<K, V>` and named object types
//! - **Link cells**: `__Tag;Sheet!A1F12;Other!1F1;Third!A1,2;Fourth!,D2`
//! - **Cycle detection**: link graphs that loop back into a range being read fail fast
//! - **Table reads**: header-driven reads into ordered lists or keyed dictionaries
//! - **Workbook loading**: `.xlsx`/`.xlsm` packages from disk or memory
//!
//! ## Example
//!
//! ```no_run
//! use sheetlink::{ReadOptions, Schema, SheetReader, TypeRegistry};
//!
//! let workbook = sheetlink::open_workbook("items.xlsx")?;
//! let types = TypeRegistry::new();
//! let schema = Schema::parse("Item", &[("id", "int"), ("tags", "List<string>")])?;
//! let reader = SheetReader::new(&workbook, &types);
//! let items = reader.read_list(reader.sheet("Items")?, &schema, &ReadOptions::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```
pub mod error;
mod helpers;
pub mod reader;
pub mod schema;
pub mod spreadsheet;

use anyhow::{Context, Result};
use std::path::Path;

pub use error::SheetLinkError;
pub use reader::ReadOptions;
pub use reader::Record;
pub use reader::SheetReader;
pub use reader::Value;
pub use schema::Field;
pub use schema::Schema;
pub use schema::TypeDescriptor;
pub use schema::TypeRegistry;
pub use spreadsheet::Criteria;
pub use spreadsheet::Workbook;

/// Opens every sheet of a workbook file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a supported workbook package.
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    Workbook::open(path, &Criteria::default()).with_context(|| format!("Failed to open workbook '{}'", path.display()))
}
