use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration file was named explicitly but does not exist.
    #[display("configuration file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The file extension is not one of `toml`, `yaml`, `yml` or `json`.
    #[display("unsupported configuration format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The merged configuration could not be read into [`crate::Config`].
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
