use crate::error::ResultMessage;
use crate::error::SheetLinkError;
use crate::helpers::reader::PackageSource;
use crate::helpers::xml::XmlElementHelper;
use crate::helpers::xml::XmlTextHelper;
use crate::helpers::zip::PartReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::iso_to_serial;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::relationships::load_worksheet_targets;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::path::Path;
use zip::ZipArchive;

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";

const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_RUN: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// Days between the 1900 and 1904 date systems
const DAYS_1904_OFFSET: f64 = 1_462f64;

/// Declared type of a `<c>` element (its `t` attribute)
#[derive(Copy, Clone, Debug, PartialEq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    Boolean,
    IsoDateTime,
    Error,
}

impl CellKind {
    fn from_attribute(kind: Option<&str>) -> CellKind {
        match kind {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") | Some("str") => CellKind::InlineString,
            Some("b") => CellKind::Boolean,
            Some("d") => CellKind::IsoDateTime,
            Some("e") => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

/// A cell as found in the worksheet part, before its text is decoded.
struct RawCell {
    row: usize,
    col: usize,
    kind: CellKind,
    text: String,
}

/// An `.xlsx`/`.xlsm` workbook package.
pub struct XlsxSpreadsheet {
    name: String,
    zip: ZipArchive<PackageSource>,
    /// (sheet name, worksheet part) in workbook order
    sheets: Vec<(String, String)>,
    is_1904: bool,
}

impl XlsxSpreadsheet {
    /// Opens a package from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<XlsxSpreadsheet, SheetLinkError> {
        let path = path.as_ref();
        Self::load(&path.to_string_lossy(), PackageSource::open(path)?)
    }

    /// Opens a package already held in memory.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<XlsxSpreadsheet, SheetLinkError> {
        Self::load(name, PackageSource::from(bytes))
    }

    fn load(name: &str, source: PackageSource) -> Result<XlsxSpreadsheet, SheetLinkError> {
        let mut zip = ZipArchive::new(source)?;
        let (sheets, is_1904) = load_workbook(&mut zip).with_prefix(name)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?
        }
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            sheets,
            is_1904,
        })
    }

    /// Loads the shared string table; a package without one has no shared strings.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SheetLinkError> {
        let mut shared_strings = Vec::new();
        if let Some(mut reader) = self.zip.xml_part(PART_SHARED_STRINGS)? {
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                    shared_strings.push(read_rich_text(&mut reader, TAG_SHARED_STRING_ITEM)?);
                }
            });
        }
        Ok(shared_strings)
    }

    /// Collects the non-empty cells of one worksheet part.
    fn read_raw_cells(&mut self, sheet_name: &str, part: &str, criteria: &Criteria) -> Result<Vec<RawCell>, SheetLinkError> {
        let mut reader = self.zip.required_xml_part(part)?;
        let mut cells = Vec::new();
        let mut next_row = 0usize;
        let mut next_col = 0usize;
        let mut current: Option<RawCell> = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.attribute("r")? {
                    next_row = number.trim().parse::<usize>()?.saturating_sub(1);
                }
                next_col = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => next_row += 1,
            Event::Start(event) if event.name() == TAG_CELL => {
                let (row, col) = event.attribute("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((next_row, next_col));
                next_col = col + 1;
                let kind = CellKind::from_attribute(event.attribute("t")?.as_deref());
                current = Some(RawCell { row, col, kind, text: String::new() });
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                let text = read_rich_text(&mut reader, TAG_INLINE_STRING)?;
                if let Some(cell) = current.as_mut() {
                    cell.text = text;
                }
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                let text = read_plain_text(&mut reader, TAG_VALUE)?;
                if let Some(cell) = current.as_mut() {
                    cell.text = text;
                }
            }
            Event::End(event) if event.name() == TAG_CELL => {
                match current.take() {
                    Some(cell) if cell.kind == CellKind::Error && !criteria.error_as_null => {
                        Err(SpreadsheetError::CellValueError(
                            self.name.to_owned(),
                            sheet_name.to_owned(),
                            index_to_reference(cell.row, cell.col),
                            cell.text,
                        ))?
                    }
                    Some(cell) if !cell.text.is_empty() => cells.push(cell),
                    _ => (),
                }
            }
        });
        Ok(cells)
    }

    /// Decodes the text of a `<c>` element into a cell value.
    fn to_cell_value(&self, cell: &RawCell, shared_strings: &[String]) -> Result<CellValue, SheetLinkError> {
        let text = cell.text.trim();
        let value = match cell.kind {
            CellKind::Number => CellValue::Number(text.parse::<f64>()?),
            CellKind::SharedString => {
                let index = text.parse::<usize>()?;
                let shared = shared_strings
                    .get(index)
                    .ok_or(SpreadsheetError::SharedStringError(index))?;
                CellValue::from(shared.as_str())
            }
            CellKind::InlineString => CellValue::from(cell.text.as_str()),
            CellKind::Boolean => CellValue::Boolean(text == "1" || text.eq_ignore_ascii_case("true")),
            CellKind::IsoDateTime => {
                let serial = iso_to_serial(text)?;
                CellValue::Number(if self.is_1904 { serial - DAYS_1904_OFFSET } else { serial })
            }
            CellKind::Error => CellValue::Blank,
        };
        Ok(value)
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, SheetLinkError> {
        let shared_strings = self.load_shared_strings().with_prefix(&self.name)?;
        let accepted = self
            .sheets
            .iter()
            .filter(|(sheet_name, _)| criteria.accept(sheet_name))
            .take(criteria.sheet_limit.unwrap_or(usize::MAX))
            .cloned()
            .collect::<Vec<_>>();

        let mut sheets = Vec::with_capacity(accepted.len());
        for (sheet_name, part) in accepted {
            let mut sheet = Sheet::new(&sheet_name);
            for cell in self.read_raw_cells(&sheet_name, &part, criteria)? {
                let value = self
                    .to_cell_value(&cell, &shared_strings)
                    .with_prefix(&format!("{}!{}", sheet_name, index_to_reference(cell.row, cell.col)))?;
                sheet.push(Cell::new(cell.row, cell.col, value));
            }
            log::debug!("loaded sheet '{}' of '{}' with {} cells", sheet_name, self.name, sheet.cells().count());
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Loads sheet names with their worksheet parts, and the date system flag.
fn load_workbook(zip: &mut ZipArchive<PackageSource>) -> Result<(Vec<(String, String)>, bool), SheetLinkError> {
    let targets = load_worksheet_targets(zip, PART_WORKBOOK_RELS)?;
    let mut reader = zip.required_xml_part(PART_WORKBOOK)?;
    let mut sheets = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let name = event.attribute("name")?;
            let part = event.local_attribute(b"id")?.and_then(|id| targets.get(&id).cloned());
            if let Some((name, part)) = name.zip(part) {
                sheets.push((name, part));
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.attribute("date1904")?
                .map(|flag| flag == "1" || flag.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Reads the text of a rich text element (`<si>`, `<is>`): the `<t>` runs, without
/// phonetic runs.
fn read_rich_text(reader: &mut PartReader<'_, PackageSource>, end: QName) -> Result<String, SheetLinkError> {
    let mut in_phonetic = false;
    let mut in_text = false;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic = true,
        Event::End(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic = false,
        Event::Start(event) if event.name() == TAG_TEXT => in_text = !in_phonetic,
        Event::End(event) if event.name() == TAG_TEXT => in_text = false,
        Event::Text(event) if in_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if in_text => text.push_reference(&event)?,
    });
    Ok(text)
}

/// Reads the whole text content of an element up to its end tag.
fn read_plain_text(reader: &mut PartReader<'_, PackageSource>, end: QName) -> Result<String, SheetLinkError> {
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end => break,
        Event::Text(event) => text.push_str(&event.xml_content()?),
        Event::CData(event) => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) => text.push_reference(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<workbookPr/>
<sheets><sheet name="Items" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets>
</workbook>"#;

    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<si><t>id</t></si><si><t>tags</t></si><si><r><t>Tags!A1</t></r><r><t>C1</t></r><rPh><t>x</t></rPh></si>
</sst>"#;

    const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>7</v></c><c r="B2" t="s"><v>2</v></c><c r="C2" t="b"><v>1</v></c><c r="D2" t="inlineStr"><is><t>a &amp; b</t></is></c><c r="E2" t="d"><v>2024-01-01</v></c><c r="F2"/></row>
</sheetData></worksheet>"#;

    const SHEET2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="3"><c r="B3" t="e"><v>#N/A</v></c><c r="C3"><v>1.5</v></c></row>
</sheetData></worksheet>"#;

    /// Builds a minimal two-sheet `.xlsx` package in memory.
    pub(crate) fn build_package() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in [
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn read_package() {
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("test.xlsx", build_package()).unwrap();
        let criteria = Criteria { error_as_null: true, ..Default::default() };
        let sheets = spreadsheet.read_sheets(&criteria).unwrap();

        assert_eq!(spreadsheet.name(), "test.xlsx");
        assert_eq!(sheets.len(), 2);
        let items = &sheets[0];
        assert_eq!(items.name, "Items");
        assert_eq!(items.get(0, 0).unwrap().value, CellValue::from("id"));
        assert_eq!(items.get(1, 0).unwrap().value, CellValue::Number(7.0));
        assert_eq!(items.get(1, 1).unwrap().value, CellValue::from("Tags!A1C1"));
        assert_eq!(items.get(1, 2).unwrap().value, CellValue::Boolean(true));
        assert_eq!(items.get(1, 3).unwrap().value, CellValue::from("a & b"));
        assert_eq!(items.get(1, 4).unwrap().value, CellValue::Number(45292.0));
        assert!(items.get(1, 5).is_none());

        let notes = &sheets[1];
        assert_eq!(notes.name, "Notes");
        assert!(notes.get(2, 1).is_none());
        assert_eq!(notes.get(2, 2).unwrap().value, CellValue::Number(1.5));
    }

    #[test]
    fn read_package_with_criteria() {
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("test.xlsx", build_package()).unwrap();
        let criteria = Criteria::with_sheet_names(&["Items"]).unwrap();
        let sheets = spreadsheet.read_sheets(&criteria).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Items");

        let criteria = Criteria { sheet_limit: Some(1), ..Default::default() };
        assert_eq!(spreadsheet.read_sheets(&criteria).unwrap().len(), 1);
    }

    #[test]
    fn read_package_error_cell() {
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("test.xlsx", build_package()).unwrap();
        let result = spreadsheet.read_sheets(&Criteria::default());
        assert!(matches!(
            result,
            Err(SheetLinkError::SpreadsheetError(SpreadsheetError::CellValueError(_, _, _, _)))
        ));
    }

    #[test]
    fn read_invalid_package() {
        let result = XlsxSpreadsheet::from_bytes("broken.xlsx", b"not a zip".to_vec());
        assert!(matches!(result, Err(SheetLinkError::ZipError(_))));
    }
}
