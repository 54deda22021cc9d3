use indexmap::IndexMap;

/// A file served by the site itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MainLink {
    pub url: String,
    pub base_name: String,
    pub format: String,
}

/// A link shown with its description as label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalLink {
    pub url: String,
    pub description: String,
}

/// Where a single file reference ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// No usable URL.
    Ignored,
    /// Listed in [`CategorizedLinks::main`].
    Main,
    /// A file of a non-`Main` document; only flagged.
    Additional,
    External,
    Institutional,
    /// A legacy institutional link already covered by managed documents.
    Suppressed,
}

/// The display-ready view of a record's files and links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLinks {
    /// Site files grouped by description, groups in first-seen order and
    /// each group ordered by URL.
    pub main: IndexMap<String, Vec<MainLink>>,
    pub external: Vec<ExternalLink>,
    /// Only present when categorized for an institutional site.
    pub institutional: Option<Vec<ExternalLink>>,
    pub has_older_versions: bool,
    pub has_additional_files: bool,
    /// One entry per input reference, in input order.
    pub placements: Vec<Placement>,
}

impl CategorizedLinks {
    pub(crate) fn new(institutional_site: bool) -> Self {
        Self { institutional: institutional_site.then(Vec::new), ..Self::default() }
    }

    /// Whether there is no link to show at all.
    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
            && self.external.is_empty()
            && self.institutional.as_ref().is_none_or(Vec::is_empty)
    }

    pub fn main_link_count(&self) -> usize {
        self.main.values().map(Vec::len).sum()
    }

    pub fn count(&self, placement: Placement) -> usize {
        self.placements.iter().filter(|&&p| p == placement).count()
    }
}
