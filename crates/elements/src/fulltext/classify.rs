use percent_encoding::percent_decode_str;
use url::Url;

use super::Categorizer;
use crate::consts::SETLINK_MARKER;
use crate::models::{ExternalLink, MainLink, ManagedDocument, Placement, RawFileReference, split_extension};

/// Host and file name of a link. URLs that do not parse have no host and
/// keep everything before the query as their path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkTarget {
    pub host: String,
    /// Percent-decoded last path segment.
    pub filename: String,
}

impl LinkTarget {
    pub fn parse(url: &str) -> Self {
        let (host, path) = match Url::parse(url) {
            Ok(parsed) => (parsed.host_str().unwrap_or_default().to_string(), parsed.path().to_string()),
            Err(_) => (String::new(), url.split(['?', '#']).next().unwrap_or_default().to_string()),
        };
        let segment = path.rsplit('/').next().unwrap_or_default();
        let filename = percent_decode_str(segment).decode_utf8_lossy().into_owned();
        Self { host, filename }
    }

    pub fn base_name(&self) -> &str {
        split_extension(&self.filename).0
    }

    pub fn format(&self) -> &str {
        split_extension(&self.filename).1
    }
}

/// The outcome for one reference, with what it contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    Ignored,
    Main { description: String, link: MainLink, older_versions: bool },
    Additional { older_versions: bool },
    External(ExternalLink),
    Institutional(ExternalLink),
    Suppressed,
}

impl Classification {
    pub fn placement(&self) -> Placement {
        match self {
            Self::Ignored => Placement::Ignored,
            Self::Main { .. } => Placement::Main,
            Self::Additional { .. } => Placement::Additional,
            Self::External(_) => Placement::External,
            Self::Institutional(_) => Placement::Institutional,
            Self::Suppressed => Placement::Suppressed,
        }
    }
}

/// What is known about the record while its references are classified.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordContext<'a> {
    pub documents: &'a [ManagedDocument],
    /// Some document is `Main`, so the others only count as additional files.
    pub distinguishes_main: bool,
    pub institutional_site: bool,
}

impl<'a> RecordContext<'a> {
    pub fn new(documents: &'a [ManagedDocument], institutional_site: bool) -> Self {
        let distinguishes_main = documents.iter().any(|document| document.doctype.is_main());
        Self { documents, distinguishes_main, institutional_site }
    }
}

impl Categorizer {
    pub(crate) fn classify(&self, reference: &RawFileReference, record: &RecordContext<'_>) -> Classification {
        let Some(url) = reference.usable_url() else {
            return Classification::Ignored;
        };
        let target = LinkTarget::parse(url);
        let description = reference.description();
        if url.starts_with(self.site_url()) {
            self.classify_managed(url, &target, description, record)
        } else {
            self.classify_external(url, &target, description, record)
        }
    }

    fn classify_external(
        &self,
        url: &str,
        target: &LinkTarget,
        description: &str,
        record: &RecordContext<'_>,
    ) -> Classification {
        let description = match description {
            "" if url.contains(SETLINK_MARKER) => self.fulltext_label().to_string(),
            "" => url.to_string(),
            given => given.to_string(),
        };
        let link = ExternalLink { url: url.to_string(), description };
        let rules = self.institutional_rules();
        if !record.institutional_site || !rules.is_institutional_host(&target.host) {
            return Classification::External(link);
        }
        // Legacy copies of files the site now manages itself.
        if !record.documents.is_empty() && rules.is_exempt(url, &target.host) {
            return Classification::Suppressed;
        }
        Classification::Institutional(link)
    }

    fn classify_managed(
        &self,
        url: &str,
        target: &LinkTarget,
        description: &str,
        record: &RecordContext<'_>,
    ) -> Classification {
        let Some(document) = record.documents.iter().find(|document| document.owns(&target.filename)) else {
            let description = if description.is_empty() { target.filename.clone() } else { description.to_string() };
            return Classification::External(ExternalLink { url: url.to_string(), description });
        };
        let older_versions = document.has_older_versions();
        if record.distinguishes_main && !document.doctype.is_main() {
            return Classification::Additional { older_versions };
        }
        let description = if description.is_empty() { self.fulltext_label() } else { description };
        Classification::Main {
            description: description.to_string(),
            link: MainLink {
                url: url.to_string(),
                base_name: target.base_name().to_string(),
                format: target.format().to_string(),
            },
            older_versions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://cds.cern.ch/record/1/files/paper.pdf", "cds.cern.ch", "paper.pdf")]
    #[case("http://cds.cern.ch/record/1/files/my%20paper.pdf?version=2", "cds.cern.ch", "my paper.pdf")]
    #[case("https://doc.cern.ch/setlink?base=preprint&id=1", "doc.cern.ch", "setlink")]
    #[case("http://example.org/", "example.org", "")]
    #[case("not a url/file%2Ename?x", "", "file.name")]
    fn test_link_target(#[case] url: &str, #[case] host: &str, #[case] filename: &str) {
        let target = LinkTarget::parse(url);
        assert_eq!(target.host, host);
        assert_eq!(target.filename, filename);
    }

    #[test]
    fn test_link_target_parts() {
        let target = LinkTarget::parse("http://example.org/a/thesis.v2.pdf");
        assert_eq!(target.base_name(), "thesis.v2");
        assert_eq!(target.format(), "pdf");
        let target = LinkTarget::parse("http://example.org/a/README");
        assert_eq!(target.base_name(), "README");
        assert_eq!(target.format(), "");
    }

    fn categorizer() -> Categorizer {
        Categorizer::new("http://cds.cern.ch")
    }

    #[rstest]
    #[case::no_url(RawFileReference::default(), Placement::Ignored)]
    #[case::empty_url(RawFileReference::new(""), Placement::Ignored)]
    #[case::blank_url(RawFileReference::new("  "), Placement::External)]
    #[case::managed_main(RawFileReference::new("http://cds.cern.ch/record/1/files/paper.pdf"), Placement::Main)]
    #[case::managed_figure(RawFileReference::new("http://cds.cern.ch/record/1/files/plot.png"), Placement::Additional)]
    #[case::unmanaged_site_url(RawFileReference::new("http://cds.cern.ch/record/1/files/gone.pdf"), Placement::External)]
    #[case::external(RawFileReference::new("http://arxiv.org/abs/1"), Placement::External)]
    #[case::institutional(RawFileReference::new("http://greybook.cern.ch/x.pdf"), Placement::Institutional)]
    #[case::exempt(RawFileReference::new("http://preprints.cern.ch/x.pdf"), Placement::Suppressed)]
    fn test_placement(#[case] reference: RawFileReference, #[case] expected: Placement) {
        let documents = [
            ManagedDocument::new("Main", 1).with_file("paper.pdf;1"),
            ManagedDocument::new("Figure", 1).with_file("plot.png;1"),
        ];
        let record = RecordContext::new(&documents, true);
        assert_eq!(categorizer().classify(&reference, &record).placement(), expected);
    }

    #[rstest]
    #[case("", "http://doc.cern.ch/setlink?id=1", "Fulltext")]
    #[case("", "http://arxiv.org/abs/1", "http://arxiv.org/abs/1")]
    #[case("Published", "http://arxiv.org/abs/1", "Published")]
    #[case("", " ", " ")]
    fn test_external_descriptions(#[case] description: &str, #[case] url: &str, #[case] expected: &str) {
        let mut reference = RawFileReference::new(url);
        if !description.is_empty() {
            reference = reference.with_description(description);
        }
        let record = RecordContext::new(&[], false);
        assert_eq!(
            categorizer().classify(&reference, &record),
            Classification::External(ExternalLink { url: url.to_string(), description: expected.to_string() })
        );
    }

    #[test]
    fn test_unmanaged_site_url_is_described_by_filename() {
        let reference = RawFileReference::new("http://cds.cern.ch/record/1/files/gone%20away.pdf");
        let record = RecordContext::new(&[], false);
        let Classification::External(link) = categorizer().classify(&reference, &record) else {
            panic!("expected an external link");
        };
        assert_eq!(link.description, "gone away.pdf");
    }
}
