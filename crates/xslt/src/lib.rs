pub mod backend;
pub mod error;
pub mod functions;
pub mod nesting;
mod template;

use std::borrow::Cow;
use std::sync::Arc;

use tracing::instrument;

pub use crate::backend::{Backend, BackendKind};
use crate::error::{ErrorKind, Result};
use crate::functions::{Extensions, RecordDates};
pub use crate::template::TemplateStore;

/// The stylesheet to apply: a file name resolved through the
/// [`TemplateStore`], or inline stylesheet source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template<'a> {
    Named(&'a str),
    Source(&'a str),
}
impl<'a> Template<'a> {
    /// Inline source wins when both are given.
    pub fn from_parts(name: Option<&'a str>, source: Option<&'a str>) -> Option<Self> {
        source.map(Self::Source).or(name.map(Self::Named))
    }
}

/// Renders XML records through XSLT stylesheets.
///
/// The backend is chosen once, when the formatter is created; every call
/// after that owns all of its state, so one formatter can be shared freely
/// between threads.
#[derive(Debug)]
pub struct Formatter {
    backend: Box<dyn Backend>,
    templates: TemplateStore,
    extensions: Extensions,
}

impl Formatter {
    /// Creates a formatter on the first available backend.
    ///
    /// Fails with [`ErrorKind::NoBackend`] when this build has none.
    pub fn new(templates: TemplateStore, dates: Arc<dyn RecordDates>) -> Result<Self> {
        Ok(Self::with_backend(backend::discover()?, templates, dates))
    }

    pub fn with_backend(backend: Box<dyn Backend>, templates: TemplateStore, dates: Arc<dyn RecordDates>) -> Self {
        Self { backend, templates, extensions: Extensions::new(dates) }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Transforms `xml` with `template`, reporting why it failed.
    #[instrument(skip_all, fields(backend = %self.backend.kind(), template = ?template))]
    pub fn try_transform(&self, xml: &str, template: Template<'_>) -> Result<String> {
        let stylesheet = match template {
            Template::Source(source) => Cow::Borrowed(source),
            Template::Named(name) => Cow::Owned(self.templates.load(name)?),
        };
        nesting::check(&stylesheet)?;
        nesting::check(xml)?;
        self.backend.run(xml, &stylesheet, &self.extensions)
    }

    /// Transforms `xml` with `template`. Failures are logged and yield `None`.
    pub fn transform(&self, xml: &str, template: Template<'_>) -> Option<String> {
        match self.try_transform(xml, template) {
            Ok(output) => Some(output),
            Err(err) => {
                tracing::warn!(?template, error = ?err, "transformation failed");
                None
            },
        }
    }

    /// Like [`Formatter::transform`], with the template given by name and/or
    /// inline source.
    pub fn format(&self, xml: &str, name: Option<&str>, source: Option<&str>) -> Option<String> {
        match Template::from_parts(name, source) {
            Some(template) => self.transform(xml, template),
            None => {
                tracing::warn!(error = %ErrorKind::TemplateNotGiven, "transformation failed");
                None
            },
        }
    }
}
