//! Guide retrieval: remote HTTP fetches and local files
//!
//! Everything here runs before the merge starts. A required source that
//! cannot be read fails the whole run; optional sources degrade to `None`.

pub mod ingest_epg;

pub use ingest_epg::{EpgIngestor, GuideLocation};
