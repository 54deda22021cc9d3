use std::fmt::{Display, Formatter, Result as FmtResult};

use super::split_extension;
use crate::consts::VERSION_MARKER_REGEX;

/// The kind of a managed document.
///
/// Only the exact name `Main` is special: as soon as one document of a
/// record is `Main`, the others are treated as additional files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Doctype {
    Main,
    Other(String),
}
impl Doctype {
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => "Main",
            Self::Other(name) => name,
        }
    }
}
impl From<&str> for Doctype {
    fn from(name: &str) -> Self {
        match name {
            "Main" => Self::Main,
            other => Self::Other(other.to_string()),
        }
    }
}
impl From<String> for Doctype {
    fn from(name: String) -> Self {
        if name == "Main" { Self::Main } else { Self::Other(name) }
    }
}
impl Display for Doctype {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One stored file of a managed document, eg. `thesis.pdf;2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedFile {
    pub full_name: String,
}
impl ManagedFile {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self { full_name: full_name.into() }
    }

    fn unversioned(&self) -> &str {
        match VERSION_MARKER_REGEX.find(&self.full_name) {
            Some(marker) => &self.full_name[..marker.start()],
            None => &self.full_name,
        }
    }

    /// Name without extension and version marker.
    pub fn base_name(&self) -> &str {
        split_extension(self.unversioned()).0
    }

    /// Extension after the last `.`, empty if there is none.
    pub fn format(&self) -> &str {
        split_extension(self.unversioned()).1
    }

    /// Version from a trailing `;<n>` marker.
    pub fn version(&self) -> Option<u32> {
        VERSION_MARKER_REGEX.captures(&self.full_name)?.get(1)?.as_str().parse().ok()
    }
}

/// A document managed by the site for a record: a snapshot of its type,
/// newest version and files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDocument {
    pub doctype: Doctype,
    /// Always at least 1.
    pub latest_version: u32,
    pub files: Vec<ManagedFile>,
}
impl ManagedDocument {
    pub fn new(doctype: impl Into<Doctype>, latest_version: u32) -> Self {
        Self { doctype: doctype.into(), latest_version: latest_version.max(1), files: Vec::new() }
    }

    pub fn with_file(mut self, full_name: impl Into<String>) -> Self {
        self.files.push(ManagedFile::new(full_name));
        self
    }

    pub fn has_older_versions(&self) -> bool {
        self.latest_version > 1
    }

    /// Whether one of the document's files is stored under `filename`.
    ///
    /// This is a prefix match, so `paper.pdf` finds `paper.pdf;1`.
    pub fn owns(&self, filename: &str) -> bool {
        self.files.iter().any(|file| file.full_name.starts_with(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("thesis.pdf", "thesis", "pdf", None)]
    #[case("thesis.pdf;2", "thesis", "pdf", Some(2))]
    #[case("archive.tar.gz;10", "archive.tar", "gz", Some(10))]
    #[case("README", "README", "", None)]
    #[case("notes;draft.txt", "notes;draft", "txt", None)]
    fn test_managed_file_parts(
        #[case] full_name: &str,
        #[case] base_name: &str,
        #[case] format: &str,
        #[case] version: Option<u32>,
    ) {
        let file = ManagedFile::new(full_name);
        assert_eq!(file.base_name(), base_name);
        assert_eq!(file.format(), format);
        assert_eq!(file.version(), version);
    }

    #[rstest]
    #[case("Main", true)]
    #[case("main", false)]
    #[case("Additional", false)]
    #[case("", false)]
    fn test_only_exact_main_is_main(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(Doctype::from(name).is_main(), expected);
        assert_eq!(Doctype::from(name.to_string()).is_main(), expected);
        assert_eq!(Doctype::from(name).as_str(), name);
    }

    #[test]
    fn test_owns_by_prefix() {
        let document = ManagedDocument::new("Main", 1).with_file("paper.pdf;1").with_file("paper.ps;1");
        assert!(document.owns("paper.pdf"));
        assert!(document.owns("paper"));
        assert!(!document.owns("other.pdf"));
    }

    #[test]
    fn test_version_is_at_least_one() {
        assert_eq!(ManagedDocument::new("Main", 0).latest_version, 1);
        assert!(!ManagedDocument::new("Main", 1).has_older_versions());
        assert!(ManagedDocument::new("Main", 3).has_older_versions());
    }
}
