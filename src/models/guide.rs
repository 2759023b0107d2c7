//! XMLTV document model
//!
//! Only the attributes the merger reasons about (`id`, `start`, `stop`,
//! `channel`) are lifted into fields. Everything else rides along verbatim.

use serde::{Deserialize, Serialize};

use super::{XmlElement, XmlNode};
use crate::errors::{SourceError, SourceResult};

pub const CHANNEL_ELEMENT: &str = "channel";
pub const PROGRAMME_ELEMENT: &str = "programme";
pub const DISPLAY_NAME_ELEMENT: &str = "display-name";
pub const DESC_ELEMENT: &str = "desc";
pub const DEFAULT_ROOT_ELEMENT: &str = "tv";

/// A `<channel>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    /// Attributes other than `id`, in document order
    pub attributes: Vec<(String, String)>,
    /// Display names, icons, urls... copied verbatim
    pub children: Vec<XmlNode>,
}

impl ChannelRecord {
    pub fn from_element(element: &XmlElement, source_name: &str) -> SourceResult<Self> {
        let id = element.attribute("id").ok_or_else(|| {
            SourceError::parse(source_name, "channel element without an 'id' attribute")
        })?;

        Ok(Self {
            id: id.to_string(),
            attributes: element
                .attributes
                .iter()
                .filter(|(k, _)| k != "id")
                .cloned()
                .collect(),
            children: element.children.clone(),
        })
    }

    /// Channel synthesized for an identifier referenced by generated
    /// programmes but defined by no source: the id doubles as display name.
    pub fn placeholder<S: Into<String>>(id: S) -> Self {
        let id = id.into();
        Self {
            children: vec![XmlNode::Element(
                XmlElement::new(DISPLAY_NAME_ELEMENT).with_text(id.clone()),
            )],
            id,
            attributes: Vec::new(),
        }
    }

    /// Text of the first `<display-name>` child
    pub fn display_name(&self) -> Option<String> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(element) if element.name == DISPLAY_NAME_ELEMENT => {
                Some(element.text())
            }
            _ => None,
        })
    }

    pub fn to_element(&self) -> XmlElement {
        let mut attributes = Vec::with_capacity(self.attributes.len() + 1);
        attributes.push(("id".to_string(), self.id.clone()));
        attributes.extend(self.attributes.iter().cloned());
        XmlElement {
            name: CHANNEL_ELEMENT.to_string(),
            attributes,
            children: self.children.clone(),
        }
    }
}

/// A `<programme>` element as found in a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Programme {
    pub channel: String,
    pub start: String,
    pub stop: Option<String>,
    /// Attributes other than `start`, `stop` and `channel`
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Programme {
    pub fn from_element(element: &XmlElement, source_name: &str) -> SourceResult<Self> {
        let required = |name: &str| {
            element.attribute(name).map(str::to_string).ok_or_else(|| {
                SourceError::parse(
                    source_name,
                    format!("programme element without a '{name}' attribute"),
                )
            })
        };

        Ok(Self {
            channel: required("channel")?,
            start: required("start")?,
            stop: element.attribute("stop").map(str::to_string),
            attributes: element
                .attributes
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "start" | "stop" | "channel"))
                .cloned()
                .collect(),
            children: element.children.clone(),
        })
    }

    pub fn to_element(&self) -> XmlElement {
        let mut attributes = Vec::with_capacity(self.attributes.len() + 3);
        attributes.push(("start".to_string(), self.start.clone()));
        if let Some(stop) = &self.stop {
            attributes.push(("stop".to_string(), stop.clone()));
        }
        attributes.push(("channel".to_string(), self.channel.clone()));
        attributes.extend(self.attributes.iter().cloned());
        XmlElement {
            name: PROGRAMME_ELEMENT.to_string(),
            attributes,
            children: self.children.clone(),
        }
    }
}

/// A parsed guide document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmltvDocument {
    pub root_name: String,
    pub root_attributes: Vec<(String, String)>,
    pub channels: Vec<ChannelRecord>,
    pub programmes: Vec<Programme>,
}

impl XmltvDocument {
    pub fn new() -> Self {
        Self {
            root_name: DEFAULT_ROOT_ELEMENT.to_string(),
            ..Default::default()
        }
    }

    pub fn with_channel(mut self, channel: ChannelRecord) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_programme(mut self, programme: Programme) -> Self {
        self.programmes.push(programme);
        self
    }
}

/// The consolidated output: every channel, then every programme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedGuide {
    pub root_name: String,
    pub root_attributes: Vec<(String, String)>,
    pub channels: Vec<ChannelRecord>,
    pub programmes: Vec<Programme>,
}

impl MergedGuide {
    pub fn channel_ids(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn to_element(&self) -> XmlElement {
        let children = self
            .channels
            .iter()
            .map(ChannelRecord::to_element)
            .chain(self.programmes.iter().map(Programme::to_element))
            .map(XmlNode::Element)
            .collect();

        XmlElement {
            name: self.root_name.clone(),
            attributes: self.root_attributes.clone(),
            children,
        }
    }
}
