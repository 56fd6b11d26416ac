//! Package relationships: how `workbook.xml` points at its worksheet parts.
use crate::error::SheetLinkError;
use crate::helpers::xml::XmlElementHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";

const WORKSHEET_TYPE_SUFFIX: &str = "/worksheet";

/// Loads the worksheet relationships of a `.rels` part, mapping relationship ids to part names.
pub(super) fn load_worksheet_targets<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    rels_part: &str,
) -> Result<HashMap<String, String>, SheetLinkError> {
    let base = source_directory(rels_part);
    let mut reader = zip.required_xml_part(rels_part)?;
    let mut targets = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let is_worksheet = event.attribute("Type")?
                .map(|kind| kind.ends_with(WORKSHEET_TYPE_SUFFIX))
                .unwrap_or(true);
            if let (true, Some(id), Some(target)) = (is_worksheet, event.attribute("Id")?, event.attribute("Target")?) {
                targets.insert(id, resolve_target(base, &target));
            }
        }
    });
    Ok(targets)
}

/// Directory of the part a `.rels` part describes: `xl/_rels/workbook.xml.rels` -> `xl`.
fn source_directory(rels_part: &str) -> &str {
    match rels_part.rsplit_once("_rels/") {
        Some((directory, _)) => directory.trim_end_matches('/'),
        None => "",
    }
}

/// Resolves a relationship target against the source directory into a part name.
/// Targets starting with `/` or with the source directory itself are package-absolute.
fn resolve_target(base: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_owned()
    } else if base.is_empty() || target.starts_with(&format!("{}/", base)) {
        target
    } else {
        format!("{}/{}", base, target)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn targets() {
        assert_eq!(source_directory("xl/_rels/workbook.xml.rels"), "xl");
        assert_eq!(source_directory("_rels/.rels"), "");
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "../xl/./worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn load_targets() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/a.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default()).unwrap();
        writer.write_all(rels.as_bytes()).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(writer.finish().unwrap().into_inner())).unwrap();

        let targets = load_worksheet_targets(&mut zip, "xl/_rels/workbook.xml.rels").unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets["rId1"], "xl/worksheets/a.xml");
    }
}
