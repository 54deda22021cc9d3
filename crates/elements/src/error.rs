//! Formatting Element Error Types
//!
//! Categorization itself cannot fail; errors come from reading records and
//! from the document store behind them.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The MARCXML record could not be read.
    #[display("malformed record: {_0}")]
    MalformedRecord(#[error(not(source))] String),
    /// The record carries no usable `001` control number.
    #[display("record has no identifier")]
    MissingIdentifier,
    /// The document store could not be queried.
    #[display("document store unavailable: {_0}")]
    StoreUnavailable(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
