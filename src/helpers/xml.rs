//! Streaming XML access for the parts of a workbook package.

use crate::error::SheetLinkError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use thiserror::Error;

/// Errors specific to XML decoding
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid character reference '&{0};'")]
    InvalidCharacter(String),
}

/// Event reader over one package part, reusing a single buffer.
///
/// Empty elements are expanded, so `<c r="A1"/>` yields a `Start` and an `End` event.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(512),
        }
    }

    /// Reads the next event, `None` once the document ends.
    pub(crate) fn next_event(&mut self) -> Result<Option<Event<'_>>, SheetLinkError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait XmlElementHelper {
    /// Unescaped value of the attribute with the given qualified name.
    fn attribute(&self, name: &str) -> Result<Option<String>, SheetLinkError>;

    /// Unescaped value of the first attribute with the given local name, ignoring its prefix
    /// (`r:id` matches `id`).
    fn local_attribute(&self, local_name: &[u8]) -> Result<Option<String>, SheetLinkError>;
}

impl XmlElementHelper for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<String>, SheetLinkError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
            None => Ok(None),
        }
    }

    fn local_attribute(&self, local_name: &[u8]) -> Result<Option<String>, SheetLinkError> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.key.local_name().as_ref() == local_name {
                return Ok(Some(attribute.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }
}

pub(crate) trait XmlTextHelper {
    /// Appends the text an entity or character reference stands for (`&amp;`, `&#65;`, `&#x41;`).
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), SheetLinkError>;
}

impl XmlTextHelper for String {
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), SheetLinkError> {
        let name = reference.xml_content()?;
        match name.strip_prefix('#') {
            Some(number) => {
                let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                    Some(hex) => u32::from_str_radix(hex, 16)?,
                    None => number.parse::<u32>()?,
                };
                let character = char::from_u32(code).ok_or_else(|| XmlError::InvalidCharacter(name.to_string()))?;
                self.push(character);
            }
            None => {
                let entity = resolve_xml_entity(&name).ok_or_else(|| XmlError::UnknownEntity(name.to_string()))?;
                self.push_str(entity);
            }
        }
        Ok(())
    }
}

/// Drives an [`XmlReader`] to the end of its part, dispatching each event to the first
/// matching arm; unmatched events are skipped.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next_event()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
