//! The editors element: names of a record's `100` authors flagged as editors.

use percent_encoding::utf8_percent_encode;
use quick_xml::escape::escape;

use crate::consts::{AUTHOR_TAG, EDITOR_ROLE, QUERY_VALUE};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorsOptions {
    /// At most this many names; `None` lists all of them.
    pub limit: Option<usize>,
    pub separator: String,
    /// Appended when names were cut off by `limit`.
    pub extension: String,
    /// Link every name to a search for the editor's other records.
    pub print_links: bool,
}

impl Default for EditorsOptions {
    fn default() -> Self {
        Self { limit: None, separator: " ; ".to_string(), extension: "[...]".to_string(), print_links: true }
    }
}

pub fn editor_names(record: &Record) -> Vec<&str> {
    record
        .fields(AUTHOR_TAG, None, None)
        .filter(|field| field.subfield('e') == Some(EDITOR_ROLE))
        .filter_map(|field| field.subfield('a'))
        .collect()
}

/// Lists the record's editors, empty when it has none.
pub fn editors(record: &Record, site_url: &str, options: &EditorsOptions) -> String {
    let site_url = site_url.trim_end_matches('/');
    let names: Vec<String> = editor_names(record)
        .into_iter()
        .map(|name| match options.print_links {
            true => format!(
                r#"<a href="{}/search.py?f=author&amp;p={}">{}</a>"#,
                escape(site_url),
                utf8_percent_encode(name, QUERY_VALUE),
                escape(name),
            ),
            false => escape(name).into_owned(),
        })
        .collect();
    match options.limit {
        Some(limit) if names.len() > limit => names[..limit].join(&options.separator) + &options.extension,
        _ => names.join(&options.separator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DataField;
    use rstest::rstest;

    fn record() -> Record {
        let author = |name: &str, role: Option<&str>| {
            let field = DataField::new("100", ' ', ' ').with_subfield('a', name);
            match role {
                Some(role) => field.with_subfield('e', role),
                None => field,
            }
        };
        Record::new(1)
            .with_field(author("Ellis, J", Some("ed.")))
            .with_field(author("Higgs, P", None))
            .with_field(author("Müller & Co", Some("ed.")))
            .with_field(author("Smith, A", Some("ed.")))
    }

    #[test]
    fn test_editor_names() {
        assert_eq!(editor_names(&record()), ["Ellis, J", "Müller & Co", "Smith, A"]);
    }

    #[rstest]
    #[case(None, "Ellis, J ; Müller &amp; Co ; Smith, A")]
    #[case(Some(3), "Ellis, J ; Müller &amp; Co ; Smith, A")]
    #[case(Some(2), "Ellis, J ; Müller &amp; Co[...]")]
    #[case(Some(0), "[...]")]
    fn test_limit(#[case] limit: Option<usize>, #[case] expected: &str) {
        let options = EditorsOptions { limit, print_links: false, ..EditorsOptions::default() };
        assert_eq!(editors(&record(), "http://cds.cern.ch", &options), expected);
    }

    #[test]
    fn test_links() {
        let options = EditorsOptions { limit: Some(1), ..EditorsOptions::default() };
        assert_eq!(
            editors(&record(), "http://cds.cern.ch/", &options),
            r#"<a href="http://cds.cern.ch/search.py?f=author&amp;p=Ellis%2C%20J">Ellis, J</a>[...]"#
        );
    }

    #[test]
    fn test_no_editors() {
        assert_eq!(editors(&Record::new(1), "http://cds.cern.ch", &EditorsOptions::default()), "");
    }
}
