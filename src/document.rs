//! XML codec for manifest documents.
//!
//! Manifests are read into a plain [`Element`] tree rather than typed serde
//! structs: `Mod.xml` and the block/entity files it references are loosely
//! shaped, and the tree has to survive a load/save cycle unchanged.

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct DocumentError {
    message: String,
}

impl DocumentError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One XML element: tag name, attributes in document order, child elements
/// and any character data directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: vec![],
            text: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// First child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// True when the element has no attributes, children or text.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_none()
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, DocumentError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| DocumentError::new(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| DocumentError::new(e.to_string()))?;
            element.attributes.insert(key, value.into_owned());
        }
        Ok(element)
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}

/// Parse a document and return its single root element.
pub fn parse(text: &str) -> Result<Element, DocumentError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DocumentError::new(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Start(start) => open.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut open, &mut root, element)?;
            }
            Event::End(end) => {
                let element = open.pop().ok_or_else(|| {
                    DocumentError::new(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    ))
                })?;
                attach(&mut open, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DocumentError::new(e.to_string()))?;
                push_text(&mut open, &text)?;
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| DocumentError::new(e.to_string()))?;
                push_text(&mut open, text)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(DocumentError::new(format!(
            "element <{}> is never closed",
            unclosed.name
        )));
    }
    root.ok_or_else(|| DocumentError::new("document has no root element"))
}

fn attach(
    open: &mut Vec<Element>,
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(DocumentError::new(format!(
                "second root element <{}>",
                element.name
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(open: &mut [Element], text: &str) -> Result<(), DocumentError> {
    match open.last_mut() {
        Some(element) => {
            element.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(DocumentError::new("text outside of the root element")),
    }
}

/// Serialize an element tree as a tab-indented document with an XML declaration.
pub fn serialize(root: &Element) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    emit(writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None))))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| DocumentError::new(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        return emit(writer.write_event(Event::Empty(start)));
    }

    emit(writer.write_event(Event::Start(start)))?;
    if let Some(text) = &element.text {
        emit(writer.write_event(Event::Text(BytesText::new(text))))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    emit(writer.write_event(Event::End(BytesEnd::new(element.name.as_str()))))
}

fn emit<E: std::fmt::Display>(result: Result<(), E>) -> Result<(), DocumentError> {
    result.map_err(|e| DocumentError::new(e.to_string()))
}
