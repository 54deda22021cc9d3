use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;

/// Stylesheets on disk, looked up by file name.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Finds `name` under the templates root, falling back to `name` as a
    /// path of its own.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let candidates = [self.root.join(name), PathBuf::from(name)];
        match candidates.into_iter().find(|candidate| candidate.is_file()) {
            Some(path) => {
                tracing::trace!(template = name, path = %path.display(), "resolved template");
                Ok(path)
            },
            None => exn::bail!(ErrorKind::TemplateNotFound(name.to_string())),
        }
    }

    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        std::fs::read_to_string(&path).or_raise(|| ErrorKind::TemplateUnreadable(name.to_string()))
    }
}
