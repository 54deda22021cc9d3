use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Stored file names carry their version as a `;<n>` suffix, eg. `thesis.pdf;2`.
regex!(VERSION_MARKER_REGEX, r";(\d+)$");

/// Legacy document server links that are resolved through a redirect.
pub(crate) const SETLINK_MARKER: &str = "/setlink?";

/// MARC tag and indicators holding attached files and links.
pub(crate) const FILE_TAG: &str = "856";
pub(crate) const FILE_INDICATORS: (char, char) = ('4', ' ');
/// MARC tag holding the main author, and editors flagged through `$e`.
pub(crate) const AUTHOR_TAG: &str = "100";
pub(crate) const EDITOR_ROLE: &str = "ed.";

/// Characters left as-is when quoting a value into a search URL.
pub(crate) const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-').remove(b'/');

pub(crate) const FILE_ICON_PATH: &str = "/img/file-icon-text-12x16.gif";
pub(crate) const NOT_FOR_TEXT_START: &str = "<!--START_NOT_FOR_TEXT-->";
pub(crate) const NOT_FOR_TEXT_END: &str = "<!--END_NOT_FOR_TEXT-->";
pub(crate) const LINE_BREAK: &str = "<br />";
