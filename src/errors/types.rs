//! Error type definitions for the EPG merger
//!
//! Only boundary failures and malformed template timestamps are errors.
//! Duplicate channel identifiers and dangling channel references are resolved
//! by the merger itself and never surface here.

use thiserror::Error;

use crate::utils::datetime::DateTimeError;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Schedule expansion errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Output serialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Errors raised while obtaining or parsing a guide document
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failures talking to a remote guide
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// Non-success HTTP responses from a remote guide
    #[error("HTTP error: {status} from {url}")]
    Http { status: u16, url: String },

    /// Local file access failures
    #[error("I/O error: {path} - {message}")]
    Io { path: String, message: String },

    /// Document could not be decompressed
    #[error("Decompression failed: {message}")]
    Decompression { message: String },

    /// Parsing errors for guide content
    #[error("Parse error: {source_name} - {message}")]
    Parse { source_name: String, message: String },
}

/// Errors raised while expanding programme templates
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A template `start`/`stop` attribute is not `YYYYMMDDHHMMSS[offset]`
    #[error("Malformed timestamp '{value}' on programme for channel '{channel}': {source}")]
    MalformedTimestamp {
        channel: String,
        value: String,
        #[source]
        source: DateTimeError,
    },

    /// Verbatim expansion needs the template's own stop time
    #[error("Programme for channel '{channel}' has no stop time")]
    MissingStop { channel: String },

    /// Verbatim stop is more than a day before the start
    #[error("Programme for channel '{channel}' stops at {stop}, before it starts at {start}")]
    InvalidInterval {
        channel: String,
        start: String,
        stop: String,
    },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a fetch error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error for a local path
    pub fn io<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

impl ScheduleError {
    /// Channel the failing template belongs to
    pub fn channel(&self) -> &str {
        match self {
            Self::MalformedTimestamp { channel, .. }
            | Self::MissingStop { channel }
            | Self::InvalidInterval { channel, .. } => channel,
        }
    }
}
