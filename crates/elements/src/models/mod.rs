mod document;
mod links;
mod reference;

pub use self::document::{Doctype, ManagedDocument, ManagedFile};
pub use self::links::{CategorizedLinks, ExternalLink, MainLink, Placement};
pub use self::reference::RawFileReference;

/// Splits `name` at its last `.` into base name and extension.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, ""))
}
