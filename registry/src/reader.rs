//! Streaming registry reader.
//!
//! Wraps the `quick-xml` pull parser and reduces the document to
//! [`RegistryEvent`]s: one `Start` per element (with its attributes
//! unescaped into owned strings) and one matching `End`. Self-closing
//! elements produce both events, so consumers always see strict nesting.
//! Text content is ignored; the registry carries all data in attributes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RegistryError;

/// Registry element tags the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<revision>`.
    Revision,
    /// `<enum>`.
    Enum,
    /// `<enumrow>`.
    EnumRow,
    /// `<enumrow_range>`.
    EnumRowRange,
    /// `<bitfield>`.
    Bitfield,
    /// `<bitfieldrow>`.
    BitfieldRow,
    /// `<dict>`.
    Dict,
    /// `<dictrow>`.
    DictRow,
    /// `<cet>` entity type tree.
    Cet,
    /// `<cot>` object type tree.
    Cot,
    /// `<entity>` root of an entity subtree.
    Entity,
    /// `<object>` root of an object subtree.
    Object,
    /// `<category>`.
    Category,
    /// `<subcategory>`.
    SubCategory,
    /// `<subcategory_range>`.
    SubCategoryRange,
    /// `<specific>`.
    Specific,
    /// `<extra>`.
    Extra,
    /// `<jammer_technique>` tree.
    JammerTechnique,
    /// `<jammer_kind>`.
    JammerKind,
    /// `<jammer_category>`.
    JammerCategory,
    /// `<jammer_subcategory>`.
    JammerSubCategory,
    /// `<jammer_specific>`.
    JammerSpecific,
    /// Anything else (`<ebv>`, `<cr>`, `<meta>`, ...).
    Other,
}

impl ElementKind {
    /// Maps an element tag to its kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "revision" => ElementKind::Revision,
            "enum" => ElementKind::Enum,
            "enumrow" => ElementKind::EnumRow,
            "enumrow_range" => ElementKind::EnumRowRange,
            "bitfield" => ElementKind::Bitfield,
            "bitfieldrow" => ElementKind::BitfieldRow,
            "dict" => ElementKind::Dict,
            "dictrow" => ElementKind::DictRow,
            "cet" => ElementKind::Cet,
            "cot" => ElementKind::Cot,
            "entity" => ElementKind::Entity,
            "object" => ElementKind::Object,
            "category" => ElementKind::Category,
            "subcategory" => ElementKind::SubCategory,
            "subcategory_range" => ElementKind::SubCategoryRange,
            "specific" => ElementKind::Specific,
            "extra" => ElementKind::Extra,
            "jammer_technique" => ElementKind::JammerTechnique,
            "jammer_kind" => ElementKind::JammerKind,
            "jammer_category" => ElementKind::JammerCategory,
            "jammer_subcategory" => ElementKind::JammerSubCategory,
            "jammer_specific" => ElementKind::JammerSpecific,
            _ => ElementKind::Other,
        }
    }
}

/// An opened element with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element kind.
    pub kind: ElementKind,
    /// Raw tag name.
    pub tag: String,
    /// Unescaped attributes by name.
    pub attributes: BTreeMap<String, String>,
    /// Byte offset of the element in the document.
    pub position: u64,
}

impl Element {
    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns an attribute value, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingAttribute`] when the attribute is absent.
    pub fn required(&self, name: &'static str) -> Result<&str, RegistryError> {
        self.attr(name).ok_or_else(|| RegistryError::MissingAttribute {
            element: self.tag.clone(),
            attribute: name,
            position: self.position,
        })
    }

    /// Parses an optional integer attribute. Hexadecimal values (`0x..`)
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidNumber`] when present but unparsable.
    pub fn int(&self, name: &'static str) -> Result<Option<i64>, RegistryError> {
        let Some(raw) = self.attr(name) else {
            return Ok(None);
        };
        parse_int(raw.trim())
            .map(Some)
            .ok_or_else(|| RegistryError::InvalidNumber {
                element: self.tag.clone(),
                attribute: name,
                value: raw.to_string(),
                position: self.position,
            })
    }

    /// Parses a required integer attribute.
    ///
    /// # Errors
    ///
    /// Returns an error when the attribute is absent or unparsable.
    pub fn required_int(&self, name: &'static str) -> Result<i64, RegistryError> {
        self.int(name)?
            .ok_or_else(|| RegistryError::MissingAttribute {
                element: self.tag.clone(),
                attribute: name,
                position: self.position,
            })
    }

    /// Returns the element's UID, if declared.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.attr("uid").map(str::trim).filter(|u| !u.is_empty())
    }

    /// Returns the descriptive text: `description`, falling back to `name`.
    #[must_use]
    pub fn description(&self) -> &str {
        self.attr("description")
            .or_else(|| self.attr("name"))
            .unwrap_or_default()
    }

    /// Returns true if the element carries an explicit deprecation marker.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.attr("deprecated")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// One registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// An element opened.
    Start(Element),
    /// An element closed.
    End(ElementKind),
    /// End of document.
    Eof,
}

/// Pull reader over a registry document.
pub struct RegistryReader<R: BufRead> {
    xml: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<ElementKind>,
    open: Vec<String>,
}

impl RegistryReader<BufReader<File>> {
    /// Opens a registry file for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Open`] if the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        tracing::debug!(path = %path.display(), "opening registry");
        let file = File::open(path).map_err(|source| RegistryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> RegistryReader<&'a [u8]> {
    /// Reads a registry held in memory.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> RegistryReader<R> {
    /// Wraps any buffered source.
    pub fn new(source: R) -> Self {
        let mut xml = Reader::from_reader(source);
        xml.config_mut().trim_text(true);
        Self {
            xml,
            buf: Vec::with_capacity(1024),
            pending_end: None,
            open: Vec::new(),
        }
    }

    /// Returns the next event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Xml`] for tokenizer errors and
    /// [`RegistryError::UnexpectedEof`] if the document ends with open
    /// elements.
    pub fn next_event(&mut self) -> Result<RegistryEvent, RegistryError> {
        if let Some(kind) = self.pending_end.take() {
            return Ok(RegistryEvent::End(kind));
        }
        loop {
            self.buf.clear();
            let position = self.xml.buffer_position() as u64;
            let event = self
                .xml
                .read_event_into(&mut self.buf)
                .map_err(|source| RegistryError::Xml { position, source })?;
            match event {
                Event::Start(start) => {
                    let element = element_from(&start, position)?;
                    self.open.push(element.tag.clone());
                    return Ok(RegistryEvent::Start(element));
                }
                Event::Empty(start) => {
                    let element = element_from(&start, position)?;
                    self.pending_end = Some(element.kind);
                    return Ok(RegistryEvent::Start(element));
                }
                Event::End(end) => {
                    let tag = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                    self.open.pop();
                    return Ok(RegistryEvent::End(ElementKind::from_tag(&tag)));
                }
                Event::Eof => {
                    return match self.open.pop() {
                        Some(tag) => Err(RegistryError::UnexpectedEof(tag)),
                        None => Ok(RegistryEvent::Eof),
                    };
                }
                _ => continue,
            }
        }
    }

    /// Consumes everything up to and including the `End` of the element
    /// whose `Start` was just returned.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`next_event`](Self::next_event).
    pub fn skip_element(&mut self) -> Result<(), RegistryError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                RegistryEvent::Start(_) => depth += 1,
                RegistryEvent::End(_) => depth -= 1,
                RegistryEvent::Eof => break,
            }
        }
        Ok(())
    }
}

fn element_from(start: &BytesStart<'_>, position: u64) -> Result<Element, RegistryError> {
    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| RegistryError::Xml {
            position,
            source: e.into(),
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| RegistryError::Xml { position, source })?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(Element {
        kind: ElementKind::from_tag(&tag),
        tag,
        attributes,
        position,
    })
}
