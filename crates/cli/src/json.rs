//! JSON documents read and written by the command line.

use bibformat_elements::models::{CategorizedLinks, ExternalLink, MainLink, ManagedDocument, Placement};
use bibformat_elements::record::Subfield;
use bibformat_elements::{DataField, Record};
use bibformat_xslt::functions::MemoryDates;
use exn::{OptionExt, ResultExt};
use facet_json::{from_str as from_json, to_string as to_json};

use crate::error::{ErrorKind, Result};

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct RecordProxy {
    id: u64,
    #[facet(default)]
    fields: Vec<DataFieldProxy>,
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct DataFieldProxy {
    tag: String,
    #[facet(default)]
    ind1: String,
    #[facet(default)]
    ind2: String,
    #[facet(default)]
    subfields: Vec<SubfieldProxy>,
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct SubfieldProxy {
    code: String,
    value: String,
}

impl TryFrom<RecordProxy> for Record {
    type Error = crate::error::Error;
    fn try_from(record: RecordProxy) -> Result<Self> {
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in record.fields {
            let indicator = |value: &str| value.chars().next().unwrap_or(' ');
            let mut data = DataField::new(field.tag, indicator(&field.ind1), indicator(&field.ind2));
            for subfield in field.subfields {
                let code = subfield.code.chars().next().ok_or_raise(|| ErrorKind::Json("record"))?;
                data.subfields.push(Subfield { code, value: subfield.value });
            }
            fields.push(data);
        }
        Ok(Self { id: record.id, fields })
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct DocumentProxy {
    doctype: String,
    #[facet(rename = "version", default)]
    latest_version: u32,
    #[facet(default)]
    files: Vec<String>,
}
impl From<DocumentProxy> for ManagedDocument {
    fn from(document: DocumentProxy) -> Self {
        document
            .files
            .into_iter()
            .fold(ManagedDocument::new(document.doctype, document.latest_version), ManagedDocument::with_file)
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct RecordDatesProxy {
    record: u64,
    created: String,
    modified: String,
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct LinksProxy {
    main: Vec<MainGroupProxy>,
    external: Vec<ExternalLinkProxy>,
    #[facet(default, skip_serializing_if = Option::is_none)]
    institutional: Option<Vec<ExternalLinkProxy>>,
    has_older_versions: bool,
    has_additional_files: bool,
    placements: Vec<PlacementProxy>,
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct MainGroupProxy {
    description: String,
    links: Vec<MainLinkProxy>,
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct MainLinkProxy {
    url: String,
    name: String,
    format: String,
}
impl From<&MainLink> for MainLinkProxy {
    fn from(link: &MainLink) -> Self {
        Self { url: link.url.clone(), name: link.base_name.clone(), format: link.format.clone() }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct ExternalLinkProxy {
    url: String,
    description: String,
}
impl From<&ExternalLink> for ExternalLinkProxy {
    fn from(link: &ExternalLink) -> Self {
        Self { url: link.url.clone(), description: link.description.clone() }
    }
}

#[repr(u8)]
#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) enum PlacementProxy {
    Ignored,
    Main,
    Additional,
    External,
    Institutional,
    Suppressed,
}
impl From<&Placement> for PlacementProxy {
    fn from(placement: &Placement) -> Self {
        match placement {
            Placement::Ignored => Self::Ignored,
            Placement::Main => Self::Main,
            Placement::Additional => Self::Additional,
            Placement::External => Self::External,
            Placement::Institutional => Self::Institutional,
            Placement::Suppressed => Self::Suppressed,
        }
    }
}

impl From<&CategorizedLinks> for LinksProxy {
    fn from(links: &CategorizedLinks) -> Self {
        let external = |links: &[ExternalLink]| links.iter().map(ExternalLinkProxy::from).collect::<Vec<_>>();
        Self {
            main: links
                .main
                .iter()
                .map(|(description, group)| MainGroupProxy {
                    description: description.clone(),
                    links: group.iter().map(MainLinkProxy::from).collect(),
                })
                .collect(),
            external: external(&links.external),
            institutional: links.institutional.as_deref().map(external),
            has_older_versions: links.has_older_versions,
            has_additional_files: links.has_additional_files,
            placements: links.placements.iter().map(PlacementProxy::from).collect(),
        }
    }
}

pub fn record(json: &str) -> Result<Record> {
    from_json::<RecordProxy>(json).or_raise(|| ErrorKind::Json("record"))?.try_into()
}

pub fn documents(json: &str) -> Result<Vec<ManagedDocument>> {
    let documents = from_json::<Vec<DocumentProxy>>(json).or_raise(|| ErrorKind::Json("documents"))?;
    Ok(documents.into_iter().map(ManagedDocument::from).collect())
}

pub fn dates(json: &str) -> Result<MemoryDates> {
    let entries = from_json::<Vec<RecordDatesProxy>>(json).or_raise(|| ErrorKind::Json("dates"))?;
    let mut dates = MemoryDates::new();
    for entry in entries {
        dates.insert(entry.record, entry.created, entry.modified);
    }
    Ok(dates)
}

pub fn links(links: &CategorizedLinks) -> Result<String> {
    to_json(&LinksProxy::from(links)).or_raise(|| ErrorKind::Output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibformat_elements::models::{Doctype, RawFileReference};
    use bibformat_xslt::functions::RecordDates;
    use rstest::rstest;

    #[test]
    fn test_record() {
        let json = r#"{"id":445,"fields":[
            {"tag":"856","ind1":"4","subfields":[{"code":"u","value":"http://cds.cern.ch/record/445/files/a.pdf"}]},
            {"tag":"100","subfields":[{"code":"a","value":"Ellis, J"},{"code":"e","value":"ed."}]}
        ]}"#;
        let record = record(json).unwrap();
        assert_eq!(record.id, 445);
        assert_eq!(record.fields[0].ind2, ' ');
        assert_eq!(record.file_references(), vec![RawFileReference::new("http://cds.cern.ch/record/445/files/a.pdf")]);
        assert_eq!(record.fields[1].subfield('e'), Some("ed."));
    }

    #[rstest]
    #[case::empty_code(r#"{"id":1,"fields":[{"tag":"856","subfields":[{"code":"","value":"x"}]}]}"#)]
    #[case::missing_id(r#"{"fields":[]}"#)]
    #[case::not_json("<record/>")]
    fn test_invalid_record(#[case] json: &str) {
        assert_eq!(*record(json).unwrap_err(), ErrorKind::Json("record"));
    }

    #[test]
    fn test_documents() {
        let json = r#"[{"doctype":"Main","version":2,"files":["a.pdf;2"]},{"doctype":"Figure","files":[]}]"#;
        let documents = documents(json).unwrap();
        assert_eq!(documents[0].doctype, Doctype::Main);
        assert_eq!(documents[0].latest_version, 2);
        assert_eq!(documents[0].files[0].format(), "pdf");
        assert_eq!(documents[1].latest_version, 1);
    }

    #[test]
    fn test_dates() {
        let dates = dates(r#"[{"record":445,"created":"2006-03-01","modified":"2007-11-20"}]"#).unwrap();
        assert_eq!(dates.creation_date(445).unwrap(), "2006-03-01");
        assert_eq!(dates.modification_date(445).unwrap(), "2007-11-20");
    }

    #[test]
    fn test_links() {
        let mut categorized = CategorizedLinks::default();
        categorized.main.insert(
            "Fulltext".into(),
            vec![MainLink { url: "u/a.pdf".into(), base_name: "a".into(), format: "pdf".into() }],
        );
        categorized.external.push(ExternalLink { url: "http://x".into(), description: "x".into() });
        categorized.placements = vec![Placement::Main, Placement::External, Placement::Ignored];
        assert_eq!(
            links(&categorized).unwrap(),
            concat!(
                r#"{"main":[{"description":"Fulltext","links":[{"url":"u/a.pdf","name":"a","format":"pdf"}]}],"#,
                r#""external":[{"url":"http://x","description":"x"}],"#,
                r#""has_older_versions":false,"has_additional_files":false,"#,
                r#""placements":["Main","External","Ignored"]}"#,
            )
        );
    }
}
