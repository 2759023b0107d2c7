//! Guide merging
//!
//! Combines the primary guide, the expanded template schedule and an optional
//! supplementary guide into one document. Collections are built first and the
//! output is assembled once at the end, so ordering is a pure function of the
//! inputs:
//!
//! - channels: primary, template, placeholders, supplementary
//! - programmes: primary, generated, supplementary

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::expander::{ExpansionPolicy, ProgrammeTemplate, ScheduleExpander};
use super::registry::ChannelRegistry;
use crate::config::defaults::DEFAULT_OFFSET;
use crate::errors::AppResult;
use crate::models::{ChannelRecord, MergedGuide, Programme, XmltvDocument, DEFAULT_ROOT_ELEMENT};

/// Per-run merge settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// First day of the generated schedule (midnight is implied)
    pub reference_day: NaiveDate,
    pub day_count: u32,
    pub policy: ExpansionPolicy,
    /// Trailing marker removed from `<desc>` text of generated programmes
    pub strip_payload_suffix: Option<String>,
    pub default_offset: String,
}

impl MergeConfig {
    pub fn new(reference_day: NaiveDate, day_count: u32, policy: ExpansionPolicy) -> Self {
        Self {
            reference_day,
            day_count,
            policy,
            strip_payload_suffix: None,
            default_offset: DEFAULT_OFFSET.to_string(),
        }
    }

    pub fn with_strip_payload_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.strip_payload_suffix = Some(suffix.into());
        self
    }
}

/// Counters describing one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStatistics {
    pub primary_channels: usize,
    pub primary_programmes: usize,
    pub template_channels_added: usize,
    pub template_channels_duplicate: usize,
    pub templates_expanded: usize,
    pub generated_programmes: usize,
    pub placeholder_channels: usize,
    pub supplementary_included: bool,
    pub supplementary_channels_added: usize,
    pub supplementary_channels_duplicate: usize,
    pub supplementary_programmes: usize,
}

impl MergeStatistics {
    pub fn total_channels(&self) -> usize {
        self.primary_channels
            + self.template_channels_added
            + self.placeholder_channels
            + self.supplementary_channels_added
    }

    pub fn total_programmes(&self) -> usize {
        self.primary_programmes + self.generated_programmes + self.supplementary_programmes
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub guide: MergedGuide,
    pub statistics: MergeStatistics,
}

pub struct GuideMerger {
    config: MergeConfig,
    expander: ScheduleExpander,
}

impl GuideMerger {
    pub fn new(config: MergeConfig) -> Self {
        let expander = ScheduleExpander::new(config.policy)
            .with_strip_payload_suffix(config.strip_payload_suffix.clone());
        Self { config, expander }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge the three sources into one guide
    ///
    /// Fails only when a template timestamp cannot be expanded; every other
    /// inconsistency (duplicate channels, dangling channel references) is
    /// resolved in place.
    pub fn merge(
        &self,
        primary: &XmltvDocument,
        template_source: &XmltvDocument,
        supplementary: Option<&XmltvDocument>,
    ) -> AppResult<MergeOutcome> {
        let mut statistics = MergeStatistics::default();
        let mut registry = ChannelRegistry::new();

        info!(
            "Merging guide: {} primary channels, {} templates over {} day(s) from {} ({:?})",
            primary.channels.len(),
            template_source.programmes.len(),
            self.config.day_count,
            self.config.reference_day,
            self.config.policy
        );

        // Primary source, copied as-is
        for channel in &primary.channels {
            registry.seed(channel.clone());
        }
        statistics.primary_channels = primary.channels.len();
        statistics.primary_programmes = primary.programmes.len();

        // Template channels
        for channel in &template_source.channels {
            if registry.register(channel.clone()) {
                statistics.template_channels_added += 1;
            } else {
                debug!("Template channel '{}' already defined, keeping first", channel.id);
                statistics.template_channels_duplicate += 1;
            }
        }

        // Expand templates
        let mut generated = Vec::new();
        let mut referenced: BTreeSet<&str> = BTreeSet::new();
        for programme in &template_source.programmes {
            let template = ProgrammeTemplate::from_programme(programme, &self.config.default_offset)?;
            let instances =
                self.expander
                    .expand(&template, self.config.reference_day, self.config.day_count)?;
            debug!(
                "Expanded template for channel '{}' into {} programmes",
                template.channel,
                instances.len()
            );
            referenced.insert(programme.channel.as_str());
            generated.extend(instances.into_iter().map(|g| g.into_programme()));
            statistics.templates_expanded += 1;
        }
        statistics.generated_programmes = generated.len();

        // Placeholders for references no source defines
        let supplementary_ids: HashSet<&str> = supplementary
            .map(|doc| doc.channels.iter().map(|c| c.id.as_str()).collect())
            .unwrap_or_default();
        for id in registry.missing(referenced.iter().copied()) {
            if supplementary_ids.contains(id.as_str()) {
                debug!("Channel '{}' will come from the supplementary guide", id);
                continue;
            }
            info!("Synthesizing placeholder channel '{}'", id);
            registry.register(ChannelRecord::placeholder(id));
            statistics.placeholder_channels += 1;
        }

        // Supplementary source, merged wholesale
        let mut supplementary_programmes: Vec<Programme> = Vec::new();
        if let Some(doc) = supplementary {
            statistics.supplementary_included = true;
            for channel in &doc.channels {
                if registry.register(channel.clone()) {
                    statistics.supplementary_channels_added += 1;
                } else {
                    statistics.supplementary_channels_duplicate += 1;
                }
            }
            supplementary_programmes = doc.programmes.clone();
            statistics.supplementary_programmes = supplementary_programmes.len();
        }

        let mut programmes = Vec::with_capacity(
            primary.programmes.len() + generated.len() + supplementary_programmes.len(),
        );
        programmes.extend(primary.programmes.iter().cloned());
        programmes.extend(generated);
        programmes.extend(supplementary_programmes);

        let root_name = if primary.root_name.is_empty() {
            DEFAULT_ROOT_ELEMENT.to_string()
        } else {
            primary.root_name.clone()
        };

        let guide = MergedGuide {
            root_name,
            root_attributes: primary.root_attributes.clone(),
            channels: registry.into_records(),
            programmes,
        };

        info!(
            "Merged guide: {} channels ({} placeholders), {} programmes ({} generated)",
            guide.channels.len(),
            statistics.placeholder_channels,
            guide.programmes.len(),
            statistics.generated_programmes
        );

        Ok(MergeOutcome { guide, statistics })
    }
}
