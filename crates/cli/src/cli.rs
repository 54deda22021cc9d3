use std::path::PathBuf;

use bibformat_elements::{EditorsOptions, RenderOptions};
use bibformat_xslt::BackendKind;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bibformat", version, about = "Format bibliographic records")]
pub struct Cli {
    /// Configuration file (toml, yaml or json).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply an XSLT stylesheet to an XML record.
    Transform(TransformArgs),
    /// Sort the file links of a record into fulltext, external and
    /// institutional lists.
    Fulltext(FulltextArgs),
    /// List the editors of a record.
    Editors(EditorsArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("stylesheet").required(true).args(["template", "template_file"])))]
pub struct TransformArgs {
    /// XML document to transform.
    pub source: PathBuf,
    /// Stylesheet name, looked up in the configured templates directory.
    #[arg(long, short)]
    pub template: Option<String>,
    /// Stylesheet file used as inline source.
    #[arg(long)]
    pub template_file: Option<PathBuf>,
    /// JSON list of `{"record", "created", "modified"}` entries for the date
    /// extension functions.
    #[arg(long)]
    pub dates: Option<PathBuf>,
    /// Force a backend instead of taking the first available one.
    #[arg(long, value_enum)]
    pub backend: Option<BackendChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    Compiled,
    Interpreted,
}
impl From<BackendChoice> for BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Compiled => Self::Compiled,
            BackendChoice::Interpreted => Self::Interpreted,
        }
    }
}

#[derive(Debug, Args)]
pub struct FulltextArgs {
    /// Record as MARCXML (`.xml`) or JSON.
    pub record: PathBuf,
    /// JSON list of the record's managed documents.
    #[arg(long, short)]
    pub documents: Option<PathBuf>,
    /// Render HTML instead of printing the categorized links as JSON.
    #[arg(long)]
    pub html: bool,
    /// Sort institutional links into their own list.
    #[arg(long)]
    pub institutional_site: bool,
    /// CSS class of the rendered links.
    #[arg(long, default_value = "")]
    pub style: String,
    #[arg(long, default_value = "; ")]
    pub separator: String,
    /// Prefix each list with a file icon.
    #[arg(long)]
    pub icons: bool,
}
impl From<&FulltextArgs> for RenderOptions {
    fn from(args: &FulltextArgs) -> Self {
        Self { style: args.style.clone(), separator: args.separator.clone(), show_icons: args.icons }
    }
}

#[derive(Debug, Args)]
pub struct EditorsArgs {
    /// Record as MARCXML (`.xml`) or JSON.
    pub record: PathBuf,
    /// Print at most this many editors.
    #[arg(long, short)]
    pub limit: Option<usize>,
    #[arg(long, default_value = " ; ")]
    pub separator: String,
    /// Appended when the list was cut short.
    #[arg(long, default_value = "[...]")]
    pub extension: String,
    /// Print plain names instead of search links.
    #[arg(long)]
    pub no_links: bool,
}
impl From<&EditorsArgs> for EditorsOptions {
    fn from(args: &EditorsArgs) -> Self {
        Self {
            limit: args.limit,
            separator: args.separator.clone(),
            extension: args.extension.clone(),
            print_links: !args.no_links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["bibformat", "transform", "r.xml", "-t", "detailed.xsl"], Some("detailed.xsl"), None)]
    #[case(&["bibformat", "transform", "r.xml", "--template-file", "a.xsl", "--backend", "interpreted"], None, Some(BackendChoice::Interpreted))]
    fn test_transform(
        #[case] argv: &[&str],
        #[case] template: Option<&str>,
        #[case] backend: Option<BackendChoice>,
    ) {
        let Command::Transform(args) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected transform");
        };
        assert_eq!(args.template.as_deref(), template);
        assert_eq!(args.backend, backend);
    }

    #[rstest]
    #[case::no_stylesheet(&["bibformat", "transform", "r.xml"])]
    #[case::unknown_backend(&["bibformat", "transform", "r.xml", "-t", "a.xsl", "--backend", "saxon"])]
    #[case::no_record(&["bibformat", "fulltext"])]
    fn test_rejected(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_render_options() {
        let cli = Cli::try_parse_from(["bibformat", "fulltext", "r.json", "--style", "note", "--icons", "-c", "b.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("b.toml")));
        let Command::Fulltext(args) = cli.command else {
            panic!("expected fulltext");
        };
        let options = RenderOptions::from(&args);
        assert_eq!(options.style, "note");
        assert_eq!(options.separator, "; ");
        assert!(options.show_icons);
    }

    #[test]
    fn test_editors_options() {
        let Command::Editors(args) =
            Cli::try_parse_from(["bibformat", "editors", "r.xml", "-l", "2", "--no-links"]).unwrap().command
        else {
            panic!("expected editors");
        };
        let options = EditorsOptions::from(&args);
        assert_eq!(options.limit, Some(2));
        assert!(!options.print_links);
        assert_eq!(options.extension, "[...]");
    }
}
