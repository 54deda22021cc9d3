//! Transformation backends and their discovery.
//!
//! Both backends are XSLT 1.0 processors from the registry, wrapped so a
//! stylesheet sees the same extension functions either way: [`CompiledBackend`]
//! runs libxslt, which registers native callbacks and hands them typed XPath
//! objects, while [`InterpretedBackend`] runs xrust, which only knows
//! stylesheet-defined functions and hands over string values. Which one runs
//! is decided once per process by [`discover`].

#[cfg(feature = "compiled")]
mod compiled;
#[cfg(feature = "interpreted")]
mod interpreted;

#[cfg(feature = "compiled")]
pub use self::compiled::CompiledBackend;
#[cfg(feature = "interpreted")]
pub use self::interpreted::InterpretedBackend;
use crate::error::{ErrorKind, Result};
use crate::functions::Extensions;
use std::sync::OnceLock;

/// A transformation engine.
///
/// Implementations keep no state between calls: everything a run needs is
/// created inside [`Backend::run`] and dropped before it returns.
pub trait Backend: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Applies the stylesheet `template` to the XML document `source`.
    fn run(&self, source: &str, template: &str, extensions: &Extensions) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BackendKind {
    #[display("compiled")]
    Compiled,
    #[display("interpreted")]
    Interpreted,
}

impl BackendKind {
    /// Selection order.
    pub const PRIORITY: [Self; 2] = [Self::Compiled, Self::Interpreted];

    /// Whether this backend was built into the binary.
    pub fn is_available(self) -> bool {
        match self {
            Self::Compiled => cfg!(feature = "compiled"),
            Self::Interpreted => cfg!(feature = "interpreted"),
        }
    }

    /// Instantiates the backend, if it is available.
    pub fn load(self) -> Option<Box<dyn Backend>> {
        match self {
            #[cfg(feature = "compiled")]
            Self::Compiled => Some(Box::new(CompiledBackend)),
            #[cfg(feature = "interpreted")]
            Self::Interpreted => Some(Box::new(InterpretedBackend)),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Returns the first available backend in [`BackendKind::PRIORITY`] order.
pub fn first_available(candidates: &[BackendKind]) -> Result<BackendKind> {
    for &kind in candidates {
        if kind.is_available() {
            return Ok(kind);
        }
        tracing::debug!(backend = %kind, "backend not available");
    }
    exn::bail!(ErrorKind::NoBackend);
}

static SELECTED: OnceLock<Option<BackendKind>> = OnceLock::new();

/// Picks the process-wide backend. The choice is made on the first call only.
pub fn discover() -> Result<Box<dyn Backend>> {
    let selected = *SELECTED.get_or_init(|| match first_available(&BackendKind::PRIORITY) {
        Ok(kind) => {
            tracing::info!(backend = %kind, "selected XSLT backend");
            Some(kind)
        },
        Err(_) => None,
    });
    match selected.and_then(BackendKind::load) {
        Some(backend) => Ok(backend),
        None => exn::bail!(ErrorKind::NoBackend),
    }
}
