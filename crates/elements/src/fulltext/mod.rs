//! Fulltext link categorization.
//!
//! A record lists its files and links as loosely structured `856` fields:
//! files served by the site, plain external URLs, legacy institutional
//! links, several versions and formats of the same file. [`Categorizer`]
//! turns them into a deterministic [`CategorizedLinks`] structure, which
//! [`render`] turns into the HTML fragment shown on record pages.

mod classify;
mod render;

use tracing::instrument;

pub use self::render::{RenderOptions, render};
use self::classify::{Classification, RecordContext};
use crate::error::Result;
use crate::models::{CategorizedLinks, ManagedDocument, Placement, RawFileReference};
use crate::record::Record;
use crate::store::DocumentStore;

/// How links to the hosting institution's own servers are recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionalRules {
    /// Shown in the "<name> links" heading.
    pub name: String,
    /// Hosts containing this are institutional.
    pub domain_marker: String,
    /// Institutional links whose host contains one of these are legacy
    /// copies of managed files.
    pub exempt_host_markers: Vec<String>,
    /// Same, matched against the whole URL.
    pub exempt_url_markers: Vec<String>,
}

impl Default for InstitutionalRules {
    fn default() -> Self {
        Self {
            name: "CERN".to_string(),
            domain_marker: "cern.ch".to_string(),
            exempt_host_markers: vec!["cms".to_string()],
            exempt_url_markers: ["/setlink?", "documents.cern.ch", "doc.cern.ch", "preprints.cern.ch"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl InstitutionalRules {
    pub fn is_institutional_host(&self, host: &str) -> bool {
        host.contains(&self.domain_marker)
    }

    pub fn is_exempt(&self, url: &str, host: &str) -> bool {
        self.exempt_host_markers.iter().any(|marker| host.contains(marker.as_str()))
            || self.exempt_url_markers.iter().any(|marker| url.contains(marker.as_str()))
    }
}

/// Sorts a record's file references into main files, additional files,
/// external and institutional links.
#[derive(Debug, Clone)]
pub struct Categorizer {
    site_url: String,
    fulltext_label: String,
    institutional: InstitutionalRules,
}

impl Categorizer {
    /// URLs starting with `site_url` are candidates for managed files.
    pub fn new(site_url: impl Into<String>) -> Self {
        let site_url = site_url.into().trim_end_matches('/').to_string();
        Self { site_url, fulltext_label: "Fulltext".to_string(), institutional: InstitutionalRules::default() }
    }

    /// Description given to full texts that came without one.
    pub fn with_fulltext_label(mut self, label: impl Into<String>) -> Self {
        self.fulltext_label = label.into();
        self
    }

    pub fn with_institutional_rules(mut self, rules: InstitutionalRules) -> Self {
        self.institutional = rules;
        self
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn fulltext_label(&self) -> &str {
        &self.fulltext_label
    }

    pub fn institutional_rules(&self) -> &InstitutionalRules {
        &self.institutional
    }

    /// Categorizes the references of record `record_id` against the
    /// documents the site manages for it.
    ///
    /// With `institutional_site` off, institutional hosts are ordinary
    /// external links and [`CategorizedLinks::institutional`] is `None`.
    #[instrument(skip_all, fields(record = record_id, references = references.len(), documents = documents.len()))]
    pub fn categorize(
        &self,
        record_id: u64,
        references: &[RawFileReference],
        documents: &[ManagedDocument],
        institutional_site: bool,
    ) -> CategorizedLinks {
        let record = RecordContext::new(documents, institutional_site);
        let mut links = CategorizedLinks::new(institutional_site);
        for reference in references {
            let classification = self.classify(reference, &record);
            tracing::trace!(url = ?reference.url, placement = ?classification.placement(), "classified reference");
            place(&mut links, classification);
        }
        for group in links.main.values_mut() {
            group.sort_by(|a, b| a.url.cmp(&b.url));
        }
        tracing::debug!(
            main = links.main_link_count(),
            external = links.external.len(),
            additional = links.count(Placement::Additional),
            suppressed = links.count(Placement::Suppressed),
            older_versions = links.has_older_versions,
            "categorized links"
        );
        links
    }

    /// Categorizes `record` with the documents `store` holds for it.
    pub fn categorize_record(
        &self,
        record: &Record,
        store: &dyn DocumentStore,
        institutional_site: bool,
    ) -> Result<CategorizedLinks> {
        let documents = store.managed_documents(record.id, None)?;
        Ok(self.categorize(record.id, &record.file_references(), &documents, institutional_site))
    }
}

fn place(links: &mut CategorizedLinks, classification: Classification) {
    links.placements.push(classification.placement());
    match classification {
        Classification::Ignored | Classification::Suppressed => {},
        Classification::Main { description, link, older_versions } => {
            links.has_older_versions |= older_versions;
            links.main.entry(description).or_default().push(link);
        },
        Classification::Additional { older_versions } => {
            links.has_older_versions |= older_versions;
            links.has_additional_files = true;
        },
        Classification::External(link) => links.external.push(link),
        // Only produced for institutional sites, where the list exists.
        Classification::Institutional(link) => links.institutional.get_or_insert_default().push(link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MainLink;

    #[test]
    fn test_site_url_trailing_slash() {
        assert_eq!(Categorizer::new("http://cds.cern.ch/").site_url(), "http://cds.cern.ch");
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let references = [
            RawFileReference::new("http://site/record/1/files/b.pdf").with_description("Slides"),
            RawFileReference::new("http://site/record/1/files/a.pdf"),
            RawFileReference::new("http://site/record/1/files/a.pdf").with_description("Slides"),
        ];
        let documents = [ManagedDocument::new("Main", 1).with_file("a.pdf;1").with_file("b.pdf;1")];
        let links = Categorizer::new("http://site").categorize(1, &references, &documents, false);
        assert_eq!(links.main.keys().collect::<Vec<_>>(), ["Slides", "Fulltext"]);
        let slides: Vec<&str> = links.main["Slides"].iter().map(|link| link.url.as_str()).collect();
        assert_eq!(slides, ["http://site/record/1/files/a.pdf", "http://site/record/1/files/b.pdf"]);
        assert_eq!(
            links.main["Fulltext"],
            vec![MainLink {
                url: "http://site/record/1/files/a.pdf".into(),
                base_name: "a".into(),
                format: "pdf".into()
            }]
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = InstitutionalRules {
            name: "DESY".into(),
            domain_marker: "desy.de".into(),
            exempt_host_markers: vec![],
            exempt_url_markers: vec!["/legacy/".into()],
        };
        let categorizer = Categorizer::new("http://bib.desy.de").with_institutional_rules(rules);
        let references = [
            RawFileReference::new("http://www.desy.de/report.pdf"),
            RawFileReference::new("http://www.desy.de/legacy/report.pdf"),
            RawFileReference::new("http://cds.cern.ch/report.pdf"),
        ];
        let documents = [ManagedDocument::new("Main", 1)];
        let links = categorizer.categorize(1, &references, &documents, true);
        assert_eq!(links.placements, [Placement::Institutional, Placement::Suppressed, Placement::External]);
    }
}
