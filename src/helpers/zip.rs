//! Part lookup inside a zip-based workbook package.

use crate::error::SheetLinkError;
use crate::helpers::xml::XmlReader;
use crate::spreadsheet::SpreadsheetError;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::ZipArchive;

pub(crate) type PartReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Name under which a part is stored; part names compare case-insensitively and
    /// may start with `/` or use `\` separators.
    fn part_name(&self, name: &str) -> Option<String>;

    /// Opens a part as an XML event stream, `None` when the package lacks it.
    fn xml_part(&mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, SheetLinkError>;

    /// Opens a part that the package must contain.
    fn required_xml_part(&mut self, name: &str) -> Result<PartReader<'_, RS>, SheetLinkError> {
        self.xml_part(name)?
            .ok_or_else(|| SpreadsheetError::FileError(name.to_owned()).into())
    }
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn part_name(&self, name: &str) -> Option<String> {
        let wanted = name.replace('\\', "/");
        let wanted = wanted.trim_start_matches('/');
        self.file_names()
            .find(|stored| stored.trim_start_matches('/').eq_ignore_ascii_case(wanted))
            .map(str::to_owned)
    }

    fn xml_part(&mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, SheetLinkError> {
        match self.part_name(name) {
            Some(stored) => Ok(Some(XmlReader::new(BufReader::new(self.by_name(&stored)?)))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive() -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/Workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        ZipArchive::new(Cursor::new(writer.finish().unwrap().into_inner())).unwrap()
    }

    #[test]
    fn part_lookup() {
        let mut zip = archive();
        assert_eq!(zip.part_name("/xl/workbook.xml").as_deref(), Some("xl/Workbook.xml"));
        assert_eq!(zip.part_name("xl\\WORKBOOK.xml").as_deref(), Some("xl/Workbook.xml"));
        assert!(zip.xml_part("xl/workbook.xml").unwrap().is_some());
        assert!(zip.xml_part("xl/styles.xml").unwrap().is_none());
        assert!(matches!(
            zip.required_xml_part("xl/styles.xml"),
            Err(SheetLinkError::SpreadsheetError(SpreadsheetError::FileError(_)))
        ));
    }
}
