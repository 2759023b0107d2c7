//! Quick-XML based XMLTV parser
//!
//! Builds an owned element tree rather than extracting a fixed set of fields:
//! programme payloads are copied verbatim into the merged guide, so nothing the
//! source document carries may be lost. Text is never trimmed; only the
//! indentation between channels, programmes and their child elements is dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::{
    ChannelRecord, Programme, XmlElement, XmlNode, XmltvDocument, CHANNEL_ELEMENT,
    PROGRAMME_ELEMENT,
};

/// Parse raw guide bytes into a document
///
/// A UTF-8 byte order mark and leading whitespace are ignored; hand-edited
/// local guides often carry either before the XML declaration.
pub fn parse_xmltv_document(bytes: &[u8], source_name: &str) -> SourceResult<XmltvDocument> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| SourceError::parse(source_name, format!("Invalid UTF-8: {e}")))?;
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let root = parse_xml_tree(content, source_name)?;
    let document = document_from_root(root, source_name)?;

    debug!(
        "Parsed {}: {} channels, {} programmes",
        source_name,
        document.channels.len(),
        document.programmes.len()
    );

    Ok(document)
}

/// Parse XML text into its root element
pub fn parse_xml_tree(content: &str, source_name: &str) -> SourceResult<XmlElement> {
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from_start(e, source_name)?);
            }

            Ok(Event::Empty(ref e)) => {
                let element = element_from_start(e, source_name)?;
                attach(&mut stack, &mut root, element, source_name)?;
            }

            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    SourceError::parse(source_name, "closing tag without matching opening tag")
                })?;
                attach(&mut stack, &mut root, element, source_name)?;
            }

            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| SourceError::parse(source_name, format!("Invalid text: {e}")))?;
                if text.trim().is_empty() && is_layout_position(&stack) {
                    continue;
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }

            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| SourceError::parse(source_name, format!("Invalid UTF-8 in CDATA: {e}")))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::CData(text.to_string()));
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(SourceError::parse(
                    source_name,
                    format!("XML parsing error at position {}: {e}", reader.buffer_position()),
                ));
            }

            _ => {} // Declarations, doctype, comments and processing instructions
        }
    }

    if let Some(open) = stack.last() {
        return Err(SourceError::parse(
            source_name,
            format!("unclosed element <{}>", open.name),
        ));
    }

    root.ok_or_else(|| SourceError::parse(source_name, "document has no root element"))
}

/// Split a root element into channel and programme collections
pub fn document_from_root(root: XmlElement, source_name: &str) -> SourceResult<XmltvDocument> {
    let mut document = XmltvDocument {
        root_name: root.name,
        root_attributes: root.attributes,
        channels: Vec::new(),
        programmes: Vec::new(),
    };

    for node in &root.children {
        let XmlNode::Element(element) = node else {
            continue;
        };
        match element.name.as_str() {
            CHANNEL_ELEMENT => document
                .channels
                .push(ChannelRecord::from_element(element, source_name)?),
            PROGRAMME_ELEMENT => document
                .programmes
                .push(Programme::from_element(element, source_name)?),
            other => debug!("Ignoring <{}> element in {}", other, source_name),
        }
    }

    Ok(document)
}

fn element_from_start(start: &BytesStart, source_name: &str) -> SourceResult<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| SourceError::parse(source_name, format!("Invalid UTF-8 in XML element name: {e}")))?
        .to_string();

    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr =
            attr.map_err(|e| SourceError::parse(source_name, format!("Invalid attribute: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| SourceError::parse(source_name, format!("Invalid UTF-8 in attribute name: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| SourceError::parse(source_name, format!("Invalid attribute value: {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

/// Whitespace directly under the root, a channel or a programme is indentation
fn is_layout_position(stack: &[XmlElement]) -> bool {
    match stack {
        [_] => true,
        [_, parent] => matches!(parent.name.as_str(), CHANNEL_ELEMENT | PROGRAMME_ELEMENT),
        _ => false,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    source_name: &str,
) -> SourceResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(SourceError::parse(source_name, "multiple root elements"));
        }
    }
    Ok(())
}
