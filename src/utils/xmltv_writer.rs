//! XMLTV serialization of the merged guide

use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::errors::{AppError, AppResult, SourceError};
use crate::models::{MergedGuide, XmlElement, XmlNode};

const INDENT_WIDTH: usize = 2;

/// Render the guide as UTF-8 XML with a declaration and two-space indentation
pub fn render_merged_guide(guide: &MergedGuide) -> AppResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| AppError::serialization(e.to_string()))?;
    write_element(&mut writer, &guide.to_element(), true)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Render and write the guide to `path`
pub async fn write_merged_guide(path: &Path, guide: &MergedGuide) -> AppResult<usize> {
    let bytes = render_merged_guide(guide)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| SourceError::io(path.display().to_string(), e.to_string()))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

/// Write `element` and its subtree
///
/// Elements holding text are written inline even when `indent` is set, since
/// any whitespace the indenting writer inserts would become part of the text.
fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement, indent: bool) -> AppResult<()> {
    if indent && has_text(element) {
        let mut inline = Writer::new(Vec::new());
        write_element(&mut inline, element, false)?;
        writer
            .write_indent()
            .map_err(|e| AppError::serialization(e.to_string()))?;
        writer.get_mut().extend_from_slice(&inline.into_inner());
        return Ok(());
    }

    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| AppError::serialization(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| AppError::serialization(e.to_string()))?;

    for child in &element.children {
        let result = match child {
            XmlNode::Element(child) => {
                write_element(writer, child, indent)?;
                continue;
            }
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
            // A CDATA section cannot contain its own terminator
            XmlNode::CData(text) if text.contains("]]>") => {
                writer.write_event(Event::Text(BytesText::new(text)))
            }
            XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        };
        result.map_err(|e| AppError::serialization(e.to_string()))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| AppError::serialization(e.to_string()))
}

fn has_text(element: &XmlElement) -> bool {
    element
        .children
        .iter()
        .any(|node| matches!(node, XmlNode::Text(_) | XmlNode::CData(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelRecord, Programme};
    use crate::utils::xmltv_parser::parse_xmltv_document;

    fn sample_guide() -> MergedGuide {
        MergedGuide {
            root_name: "tv".to_string(),
            root_attributes: vec![("generator-info-name".to_string(), "m3u4u".to_string())],
            channels: vec![ChannelRecord::placeholder("radio & co")],
            programmes: vec![Programme {
                channel: "radio & co".to_string(),
                start: "20240101000000 +0000".to_string(),
                stop: Some("20240101003000 +0000".to_string()),
                attributes: vec![],
                children: vec![
                    XmlNode::Element(XmlElement::new("title").with_text("Éxitos <en vivo>")),
                    XmlNode::Element(XmlElement::new("icon").with_attribute("src", "a.png")),
                ],
            }],
        }
    }

    #[test]
    fn test_render_declares_utf8() {
        let bytes = render_merged_guide(&sample_guide()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("&lt;en vivo&gt;"));
        assert!(text.contains("<icon src=\"a.png\"/>"));
        assert!(text.ends_with("</tv>\n"));
    }

    #[test]
    fn test_rendered_output_parses_back() {
        let guide = sample_guide();
        let bytes = render_merged_guide(&guide).unwrap();
        let doc = parse_xmltv_document(&bytes, "output").unwrap();

        assert_eq!(doc.root_attributes, guide.root_attributes);
        assert_eq!(doc.channels, guide.channels);
        assert_eq!(doc.programmes, guide.programmes);
    }

    #[test]
    fn test_mixed_content_survives_round_trip() {
        let mut guide = sample_guide();
        guide.programmes[0].children = vec![
            XmlNode::Element(XmlElement::new("title").with_text("Loop")),
            XmlNode::Element(
                XmlElement::new("desc")
                    .with_text("Intro ")
                    .with_child(XmlElement::new("b").with_text("bold"))
                    .with_child(XmlElement::new("i").with_text("x"))
                    .with_text(" tail  "),
            ),
        ];

        let bytes = render_merged_guide(&guide).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\n    <desc>Intro <b>bold</b><i>x</i> tail  </desc>\n"));
        assert!(text.contains("\n    <title>Loop</title>\n"));

        let doc = parse_xmltv_document(&bytes, "output").unwrap();
        assert_eq!(doc.programmes, guide.programmes);
    }

    #[test]
    fn test_cdata_terminator_falls_back_to_text() {
        let mut guide = sample_guide();
        guide.programmes[0].children = vec![XmlNode::Element(XmlElement {
            name: "desc".to_string(),
            attributes: vec![],
            children: vec![XmlNode::CData("a ]]> b".to_string())],
        })];
        let text = String::from_utf8(render_merged_guide(&guide).unwrap()).unwrap();
        assert!(text.contains("a ]]&gt; b"));
    }
}
