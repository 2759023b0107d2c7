//! Schedule expansion
//!
//! Turns a handful of programme templates into concrete programmes covering
//! one or more calendar days. Expansion is pure: the same template, reference
//! day, day count and policy always produce the same programmes.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::{Programme, XmlElement, XmlNode, DESC_ELEMENT};
use crate::utils::datetime::DateTimeParser;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// How a template is turned into programmes for each day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionPolicy {
    /// Tile every day from midnight with back-to-back blocks. The template's
    /// own time of day is ignored. When the block size does not divide a day
    /// the last block is cut short at the following midnight.
    Tile { block_minutes: u32 },
    /// One programme per day at the template's time of day. A stop that
    /// lands on or before the start on the wall clock moves to the next day.
    /// Durations are clamped to `1..=MINUTES_PER_DAY`.
    SingleInstance { duration_minutes: u32 },
    /// The template's own start and stop, shifted by whole days
    Verbatim,
}

impl ExpansionPolicy {
    /// Programmes produced per template per day
    pub fn slots_per_day(&self) -> usize {
        match *self {
            Self::Tile { block_minutes } => {
                MINUTES_PER_DAY.div_ceil(block_minutes.max(1)) as usize
            }
            Self::SingleInstance { .. } | Self::Verbatim => 1,
        }
    }
}

/// A `<programme>` from the template source, with its start time parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammeTemplate {
    pub channel: String,
    pub start: NaiveDateTime,
    /// Offset suffix copied verbatim onto every generated timestamp
    pub offset: String,
    /// Raw stop attribute, only read by [`ExpansionPolicy::Verbatim`]
    pub stop: Option<String>,
    pub payload: Vec<XmlNode>,
}

impl ProgrammeTemplate {
    /// Parse a template programme
    ///
    /// `default_offset` is used when the start attribute has no offset suffix.
    pub fn from_programme(programme: &Programme, default_offset: &str) -> ScheduleResult<Self> {
        let start = DateTimeParser::parse_xmltv(&programme.start).map_err(|source| {
            ScheduleError::MalformedTimestamp {
                channel: programme.channel.clone(),
                value: programme.start.clone(),
                source,
            }
        })?;

        Ok(Self {
            channel: programme.channel.clone(),
            start: start.datetime,
            offset: start.offset.unwrap_or_else(|| default_offset.to_string()),
            stop: programme.stop.clone(),
            payload: programme.children.clone(),
        })
    }

    /// Wall-clock start time of day
    pub fn start_time(&self) -> NaiveTime {
        self.start.time()
    }
}

/// A concrete programme produced from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgramme {
    pub channel: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    /// Offset written on both start and stop
    pub offset: String,
    /// Owned copy of the template payload
    pub payload: Vec<XmlNode>,
}

impl GeneratedProgramme {
    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn into_programme(self) -> Programme {
        Programme {
            start: DateTimeParser::format_xmltv(&self.start, &self.offset),
            stop: Some(DateTimeParser::format_xmltv(&self.stop, &self.offset)),
            channel: self.channel,
            attributes: Vec::new(),
            children: self.payload,
        }
    }
}

/// Expands templates according to a fixed policy
#[derive(Debug, Clone)]
pub struct ScheduleExpander {
    policy: ExpansionPolicy,
    strip_payload_suffix: Option<String>,
}

impl ScheduleExpander {
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self {
            policy,
            strip_payload_suffix: None,
        }
    }

    /// Remove `suffix` from the end of `<desc>` text in every generated copy
    pub fn with_strip_payload_suffix<S: Into<String>>(mut self, suffix: Option<S>) -> Self {
        self.strip_payload_suffix = suffix.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    pub fn policy(&self) -> ExpansionPolicy {
        self.policy
    }

    /// Expand `template` over `day_count` days starting at `reference_day`
    ///
    /// Only [`ExpansionPolicy::Verbatim`] can fail, when the template's stop
    /// is missing or unusable.
    pub fn expand(
        &self,
        template: &ProgrammeTemplate,
        reference_day: NaiveDate,
        day_count: u32,
    ) -> ScheduleResult<Vec<GeneratedProgramme>> {
        let mut generated = Vec::with_capacity(day_count as usize * self.policy.slots_per_day());

        match self.policy {
            ExpansionPolicy::Tile { block_minutes } => {
                let block = Duration::minutes(i64::from(block_minutes.max(1)));
                for day in 0..day_count {
                    let base = midnight(reference_day, day);
                    let day_end = base + Duration::days(1);
                    let mut start = base;
                    while start < day_end {
                        let stop = (start + block).min(day_end);
                        generated.push(self.instance(template, start, stop));
                        start = stop;
                    }
                }
            }

            ExpansionPolicy::SingleInstance { duration_minutes } => {
                let minutes = duration_minutes.clamp(1, MINUTES_PER_DAY);
                let duration = Duration::minutes(i64::from(minutes));
                let time = template.start_time();
                let (stop_time, _) = time.overflowing_add_signed(duration);
                for day in 0..day_count {
                    let date = midnight(reference_day, day).date();
                    let start = date.and_time(time);
                    let mut stop = date.and_time(stop_time);
                    if stop <= start {
                        stop += Duration::days(1);
                    }
                    generated.push(self.instance(template, start, stop));
                }
            }

            ExpansionPolicy::Verbatim => {
                let raw_stop = template.stop.as_deref().ok_or_else(|| ScheduleError::MissingStop {
                    channel: template.channel.clone(),
                })?;
                let parsed = DateTimeParser::parse_xmltv(raw_stop).map_err(|source| {
                    ScheduleError::MalformedTimestamp {
                        channel: template.channel.clone(),
                        value: raw_stop.to_string(),
                        source,
                    }
                })?;

                // Both ends carry the start's offset, the stop's own suffix is ignored
                let mut stop = parsed.datetime;
                if stop <= template.start {
                    stop += Duration::days(1);
                }
                if stop <= template.start {
                    return Err(ScheduleError::InvalidInterval {
                        channel: template.channel.clone(),
                        start: DateTimeParser::format_xmltv(&template.start, &template.offset),
                        stop: raw_stop.to_string(),
                    });
                }

                for day in 0..day_count {
                    let shift = Duration::days(i64::from(day));
                    generated.push(self.instance(template, template.start + shift, stop + shift));
                }
            }
        }

        Ok(generated)
    }

    fn instance(
        &self,
        template: &ProgrammeTemplate,
        start: NaiveDateTime,
        stop: NaiveDateTime,
    ) -> GeneratedProgramme {
        GeneratedProgramme {
            channel: template.channel.clone(),
            start,
            stop,
            offset: template.offset.clone(),
            payload: self.copy_payload(&template.payload),
        }
    }

    fn copy_payload(&self, payload: &[XmlNode]) -> Vec<XmlNode> {
        let Some(suffix) = self.strip_payload_suffix.as_deref() else {
            return payload.to_vec();
        };

        payload
            .iter()
            .map(|node| match node {
                XmlNode::Element(element) if element.name == DESC_ELEMENT => {
                    XmlNode::Element(strip_desc_suffix(element, suffix))
                }
                other => other.clone(),
            })
            .collect()
    }
}

/// Midnight `offset_days` after `reference_day`
fn midnight(reference_day: NaiveDate, offset_days: u32) -> NaiveDateTime {
    (reference_day + Duration::days(i64::from(offset_days))).and_time(NaiveTime::MIN)
}

fn strip_desc_suffix(element: &XmlElement, suffix: &str) -> XmlElement {
    let mut copy = element.clone();
    let last_text = copy.children.iter_mut().rev().find_map(|node| match node {
        XmlNode::Text(text) | XmlNode::CData(text) => Some(text),
        XmlNode::Element(_) => None,
    });
    if let Some(text) = last_text {
        let stripped = text
            .trim_end()
            .strip_suffix(suffix)
            .map(|rest| rest.trim_end().to_string());
        if let Some(stripped) = stripped {
            *text = stripped;
        }
    }
    copy
}
