/// A file or link attached to a record (MARC `856 4_`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawFileReference {
    /// `$u`
    pub url: Option<String>,
    /// `$y`
    pub description: Option<String>,
    /// `$q`
    pub format_hint: Option<String>,
}
impl RawFileReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Self::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_format_hint(mut self, format: impl Into<String>) -> Self {
        self.format_hint = Some(format.into());
        self
    }

    /// The URL, unless it is missing or empty. Whitespace counts as a URL.
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// The description, empty when none was given.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}
