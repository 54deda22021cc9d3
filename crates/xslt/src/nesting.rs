//! Element nesting limit, checked before a document reaches a backend.
//!
//! Both engines build and walk their trees recursively, so a well-formed but
//! absurdly deep document would exhaust the stack. libxml2 refuses documents
//! past the same depth by default.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ErrorKind, Result};

/// Deepest element nesting accepted in sources and stylesheets.
pub const MAX_DEPTH: usize = 256;

/// Fails with [`ErrorKind::MalformedXml`] when `xml` nests elements deeper
/// than [`MAX_DEPTH`].
///
/// Syntax errors are left for the backend to report.
pub fn check(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    exn::bail!(ErrorKind::MalformedXml(format!(
                        "elements nested deeper than {MAX_DEPTH} levels at byte {}",
                        reader.buffer_position()
                    )));
                }
            },
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return Ok(()),
            Ok(_) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn nested(depth: usize) -> String {
        format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[rstest]
    #[case(1)]
    #[case(MAX_DEPTH)]
    fn test_accepts_up_to_limit(#[case] depth: usize) {
        assert!(check(&nested(depth)).is_ok());
    }

    #[rstest]
    #[case(MAX_DEPTH + 1)]
    #[case(20_000)]
    fn test_rejects_deeper_documents(#[case] depth: usize) {
        let err = check(&nested(depth)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedXml(message) if message.contains("256")));
    }

    #[test]
    fn test_siblings_do_not_add_up() {
        let wide = format!("<r>{}</r>", "<a><b/></a>".repeat(MAX_DEPTH * 2));
        assert!(check(&wide).is_ok());
    }

    #[test]
    fn test_leaves_syntax_errors_to_backends() {
        assert!(check("<a><b></a>").is_ok());
    }
}
