use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use bibformat_config::Config;
use bibformat_elements::{English, MemoryStore, Record, render};
use bibformat_xslt::{Formatter, Template, TemplateStore};
use exn::{OptionExt, ResultExt};
use tracing::instrument;

use crate::cli::{Cli, Command, EditorsArgs, FulltextArgs, TransformArgs};
use crate::error::{ErrorKind, Result};
use crate::json;

/// Runs the parsed command line, returning what should be printed.
pub fn run(cli: &Cli) -> Result<String> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match &cli.command {
        Command::Transform(args) => transform(&config, args),
        Command::Fulltext(args) => fulltext(&config, args),
        Command::Editors(args) => editors(&config, args),
    }
}

#[instrument(skip_all, fields(source = %args.source.display()))]
fn transform(config: &Config, args: &TransformArgs) -> Result<String> {
    let xml = read(&args.source)?;
    let dates = match &args.dates {
        Some(path) => json::dates(&read(path)?)?,
        None => Default::default(),
    };
    let templates = TemplateStore::new(&config.templates_path);
    let formatter = match args.backend {
        Some(choice) => {
            let backend = bibformat_xslt::BackendKind::from(choice).load().ok_or_raise(|| ErrorKind::NoBackend)?;
            Formatter::with_backend(backend, templates, Arc::new(dates))
        },
        None => Formatter::new(templates, Arc::new(dates)).or_raise(|| ErrorKind::NoBackend)?,
    };
    tracing::debug!(backend = %formatter.backend(), "transforming");
    let inline = args.template_file.as_deref().map(read).transpose()?;
    let template =
        Template::from_parts(args.template.as_deref(), inline.as_deref()).ok_or_raise(|| ErrorKind::NoTemplate)?;
    formatter.try_transform(&xml, template).or_raise(|| ErrorKind::Transform)
}

#[instrument(skip_all, fields(record = %args.record.display()))]
fn fulltext(config: &Config, args: &FulltextArgs) -> Result<String> {
    let record = load_record(&args.record)?;
    let mut store = MemoryStore::new();
    if let Some(path) = &args.documents {
        for document in json::documents(&read(path)?)? {
            store.insert(record.id, document);
        }
    }
    let categorizer = config.categorizer();
    let links = categorizer
        .categorize_record(&record, &store, args.institutional_site || config.institutional_site)
        .or_raise(|| ErrorKind::Categorize)?;
    if args.html {
        Ok(render(&links, record.id, &categorizer, &args.into(), &English))
    } else {
        json::links(&links)
    }
}

#[instrument(skip_all, fields(record = %args.record.display()))]
fn editors(config: &Config, args: &EditorsArgs) -> Result<String> {
    let record = load_record(&args.record)?;
    Ok(bibformat_elements::editors(&record, &config.site_url, &args.into()))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).or_raise(|| ErrorKind::Input(path.display().to_string()))
}

/// Reads MARCXML when the file says so, JSON otherwise.
fn load_record(path: &Path) -> Result<Record> {
    let contents = read(path)?;
    match path.extension().and_then(OsStr::to_str) {
        Some("xml") => Record::from_marcxml(&contents).or_raise(|| ErrorKind::Input(path.display().to_string())),
        _ => json::record(&contents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    const RECORD: &str = r#"<record>
        <controlfield tag="001">445</controlfield>
        <datafield tag="100" ind1=" " ind2=" ">
            <subfield code="a">Ellis, J</subfield>
            <subfield code="e">ed.</subfield>
        </datafield>
        <datafield tag="856" ind1="4" ind2=" ">
            <subfield code="u">http://cds.cern.ch/record/445/files/a.pdf</subfield>
        </datafield>
    </record>"#;

    const STYLESHEET: &str = r#"<xsl:stylesheet version="1.0"
        xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
        xmlns:fn="http://cdsweb.cern.ch/bibformat/fn">
        <xsl:output method="text"/>
        <xsl:template match="/">
            <xsl:value-of select="fn:creation_date(record/controlfield[@tag='001'])"/>
        </xsl:template>
    </xsl:stylesheet>"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("record.xml"), RECORD).unwrap();
        fs::write(dir.path().join("dates.xsl"), STYLESHEET).unwrap();
        fs::write(dir.path().join("dates.json"), r#"[{"record":445,"created":"2006-03-01","modified":"2007-11-20"}]"#)
            .unwrap();
        fs::write(dir.path().join("documents.json"), r#"[{"doctype":"Main","files":["a.pdf;1"]}]"#).unwrap();
        fs::write(
            dir.path().join("bibformat.toml"),
            format!("site_url = \"http://cds.cern.ch/\"\ntemplates_path = {:?}\n", dir.path().display().to_string()),
        )
        .unwrap();
        dir
    }

    /// Runs `args` against the workspace config; `@name` stands for a file in the workspace.
    fn run_in(dir: &TempDir, args: &[&str]) -> Result<String> {
        let config = dir.path().join("bibformat.toml");
        let mut argv = vec!["bibformat".to_string(), "--config".to_string(), config.display().to_string()];
        argv.extend(args.iter().map(|arg| match arg.strip_prefix('@') {
            Some(name) => dir.path().join(name).display().to_string(),
            None => arg.to_string(),
        }));
        run(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_transform_named_template() {
        let dir = workspace();
        let output = run_in(&dir, &["transform", "@record.xml", "--template", "dates.xsl", "--dates", "@dates.json"]);
        assert_eq!(output.unwrap(), "2006-03-01");
    }

    #[test]
    fn test_transform_without_dates() {
        let dir = workspace();
        let output = run_in(&dir, &["transform", "@record.xml", "--template-file", "@dates.xsl", "--backend", "interpreted"]);
        assert_eq!(output.unwrap(), "");
    }

    #[test]
    fn test_transform_missing_template() {
        let dir = workspace();
        let err = run_in(&dir, &["transform", "@record.xml", "--template", "missing.xsl"]).unwrap_err();
        assert_eq!(*err, ErrorKind::Transform);
    }

    #[test]
    fn test_fulltext_json() {
        let dir = workspace();
        let output = run_in(&dir, &["fulltext", "@record.xml", "--documents", "@documents.json"]).unwrap();
        assert_eq!(
            output,
            concat!(
                r#"{"main":[{"description":"Fulltext","links":[{"url":"http://cds.cern.ch/record/445/files/a.pdf","#,
                r#""name":"a","format":"pdf"}]}],"external":[],"has_older_versions":false,"#,
                r#""has_additional_files":false,"placements":["Main"]}"#,
            )
        );
    }

    #[test]
    fn test_fulltext_html() {
        let dir = workspace();
        let output = run_in(&dir, &["fulltext", "@record.xml", "--documents", "@documents.json", "--html"]).unwrap();
        assert_eq!(
            output,
            concat!(
                "<!--START_NOT_FOR_TEXT-->",
                r#"<strong>Fulltext:</strong> <a href="http://cds.cern.ch/record/445/files/a.pdf">PDF</a>"#,
                "<!--END_NOT_FOR_TEXT-->",
            )
        );
    }

    #[test]
    fn test_editors() {
        let dir = workspace();
        assert_eq!(run_in(&dir, &["editors", "@record.xml", "--no-links"]).unwrap(), "Ellis, J");
    }

    #[test]
    fn test_missing_input() {
        let dir = workspace();
        let err = run_in(&dir, &["editors", "@nothing.xml"]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Input(path) if path.ends_with("nothing.xml")));
    }
}
