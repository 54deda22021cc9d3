mod consts;
pub mod editors;
pub mod error;
pub mod fulltext;
pub mod labels;
pub mod models;
pub mod record;
pub mod store;

pub use crate::editors::{EditorsOptions, editors};
pub use crate::fulltext::{Categorizer, InstitutionalRules, RenderOptions, render};
pub use crate::labels::{CustomLabels, English, Label, Labels};
pub use crate::record::{DataField, Record};
pub use crate::store::{DocumentStore, MemoryStore};
