use std::borrow::Cow;
use std::collections::HashMap;

/// Strings the elements put in front of readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Default description of a full text.
    Fulltext,
    /// Alternative text of the file icon.
    DownloadFulltext,
    AdditionalFiles,
    /// `{site}` is replaced with the institution name.
    SiteLink,
    SiteLinks,
    ExternalLink,
    ExternalLinks,
}

/// Localized strings for [`Label`]s.
pub trait Labels: Send + Sync {
    fn text(&self, label: Label) -> Cow<'_, str>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct English;

fn english(label: Label) -> &'static str {
    match label {
        Label::Fulltext => "Fulltext",
        Label::DownloadFulltext => "Download fulltext",
        Label::AdditionalFiles => "additional files",
        Label::SiteLink => "{site} link",
        Label::SiteLinks => "{site} links",
        Label::ExternalLink => "external link",
        Label::ExternalLinks => "external links",
    }
}

impl Labels for English {
    fn text(&self, label: Label) -> Cow<'_, str> {
        Cow::Borrowed(english(label))
    }
}

/// English labels with some of them replaced.
#[derive(Debug, Clone, Default)]
pub struct CustomLabels {
    overrides: HashMap<Label, String>,
}

impl CustomLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: Label, text: impl Into<String>) -> Self {
        self.overrides.insert(label, text.into());
        self
    }
}

impl Labels for CustomLabels {
    fn text(&self, label: Label) -> Cow<'_, str> {
        match self.overrides.get(&label) {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Borrowed(english(label)),
        }
    }
}
