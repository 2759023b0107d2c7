//! Utility modules for the EPG merger
//!
//! - `datetime`: XMLTV timestamp parsing and formatting
//! - `decompression`: gzip detection for downloaded guides
//! - `xmltv_parser` / `xmltv_writer`: document (de)serialization

pub mod datetime;
pub mod decompression;
pub mod xmltv_parser;
pub mod xmltv_writer;
