//! Transformation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A transformation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transformation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No transformation backend was compiled into this build. Fatal at startup.
    #[display("no XSLT processor could be found")]
    NoBackend,
    /// Neither a template name nor a template source was supplied.
    #[display("template was not given")]
    TemplateNotGiven,
    #[display("template not found: {_0}")]
    TemplateNotFound(#[error(not(source))] String),
    #[display("template could not be read: {_0}")]
    TemplateUnreadable(#[error(not(source))] String),
    /// Either the source document or the template is not well-formed XML,
    /// or nests deeper than the engines accept.
    #[display("malformed XML: {_0}")]
    MalformedXml(#[error(not(source))] String),
    /// The template is well-formed XML but not a usable stylesheet.
    #[display("invalid stylesheet: {_0}")]
    InvalidStylesheet(#[error(not(source))] String),
    /// The stylesheet compiled but failed while running, or its result could
    /// not be serialized.
    #[display("transformation failed: {_0}")]
    Transform(#[error(not(source))] String),
    /// An extension function argument could not be turned into a record id.
    #[display("invalid record reference: {_0}")]
    InvalidRecordRef(#[error(not(source))] String),
    /// The record date service failed.
    #[display("record date lookup failed for record {_0}")]
    DateLookup(#[error(not(source))] u64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Transformations are deterministic; the same inputs fail the same way.
        false
    }

    /// Returns `true` if the process cannot produce any output at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoBackend)
    }
}
