//! Guide merge core: channel registry, schedule expansion and the merger that
//! drives both. Nothing in here performs I/O.

pub mod expander;
pub mod merger;
pub mod registry;

pub use expander::{ExpansionPolicy, GeneratedProgramme, ProgrammeTemplate, ScheduleExpander};
pub use merger::{GuideMerger, MergeConfig, MergeOutcome, MergeStatistics};
pub use registry::ChannelRegistry;
