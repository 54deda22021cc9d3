use bibformat_config::Config;
use bibformat_config::error::ErrorKind;
use rstest::rstest;

#[rstest]
#[case("bibformat.toml", "site_url = \"https://cds.cern.ch/\"\n[institutional]\nname = \"CDS\"\n")]
#[case("bibformat.yaml", "site_url: https://cds.cern.ch/\ninstitutional:\n  name: CDS\n")]
#[case("site.yml", "site_url: https://cds.cern.ch\ninstitutional:\n  name: CDS\n")]
#[case("bibformat.json", r#"{"site_url": "https://cds.cern.ch", "institutional": {"name": "CDS"}}"#)]
fn test_loads_explicit_file(#[case] name: &str, #[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.site_url, "https://cds.cern.ch");
    assert_eq!(config.institutional.name, "CDS");
    assert_eq!(config.institutional.domain_marker, "cern.ch");
    assert_eq!(config.fulltext_label, "Fulltext");
}

#[test]
fn test_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(*err, ErrorKind::NotFound(_)));
}

#[test]
fn test_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bibformat.ini");
    std::fs::write(&path, "site_url=x").unwrap();
    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(*err, ErrorKind::UnsupportedFormat(_)));
}

#[test]
fn test_templates_path_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bibformat.toml");
    std::fs::write(&path, "templates_path = \"/srv/bibformat/xsl\"\ninstitutional_site = true\n").unwrap();
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.templates_path, std::path::PathBuf::from("/srv/bibformat/xsl"));
    assert!(config.institutional_site);
}
