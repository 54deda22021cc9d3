use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not read {_0}")]
    Input(#[error(not(source))] String),
    #[display("invalid {_0} JSON")]
    Json(#[error(not(source))] &'static str),
    #[display("no transformation backend available")]
    NoBackend,
    #[display("no template given")]
    NoTemplate,
    #[display("transformation produced no output")]
    Transform,
    #[display("could not categorize record")]
    Categorize,
    #[display("could not write output")]
    Output,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoBackend => 2,
            _ => 1,
        }
    }
}
