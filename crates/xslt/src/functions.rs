//! Extension functions callable from stylesheets.
//!
//! Stylesheets declare `xmlns:fn="http://cdsweb.cern.ch/bibformat/fn"` and
//! call `fn:creation_date(...)` / `fn:modification_date(...)`. Whatever the
//! backend hands over is normalized into a [`RecordRef`] first; from there
//! on both backends share the same lookup and failure handling.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};

/// Namespace of the bibformat extension functions.
pub const FUNCTION_NAMESPACE: &str = "http://cdsweb.cern.ch/bibformat/fn";

/// Source of record creation and modification dates.
pub trait RecordDates: Send + Sync {
    fn creation_date(&self, record: u64) -> Result<String>;
    fn modification_date(&self, record: u64) -> Result<String>;
}

/// Dates held in memory, keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct MemoryDates {
    records: HashMap<u64, (String, String)>,
}
impl MemoryDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: u64, created: impl Into<String>, modified: impl Into<String>) {
        self.records.insert(record, (created.into(), modified.into()));
    }
}
impl RecordDates for MemoryDates {
    fn creation_date(&self, record: u64) -> Result<String> {
        self.records.get(&record).map(|(created, _)| created.clone()).ok_or_raise(|| ErrorKind::DateLookup(record))
    }

    fn modification_date(&self, record: u64) -> Result<String> {
        self.records.get(&record).map(|(_, modified)| modified.clone()).ok_or_raise(|| ErrorKind::DateLookup(record))
    }
}

/// A record reference as it arrived from a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Text(String),
    Integer(i64),
    /// The string value of a node-set's first node; `None` when it is empty.
    Node(Option<String>),
    /// The function was called without arguments.
    Missing,
}

impl RecordRef {
    pub fn record_id(&self) -> Result<u64> {
        match self {
            Self::Text(text) | Self::Node(Some(text)) => text
                .trim()
                .parse::<u64>()
                .or_raise(|| ErrorKind::InvalidRecordRef(format!("not a record id: {text:?}"))),
            Self::Integer(id) => {
                u64::try_from(*id).or_raise(|| ErrorKind::InvalidRecordRef(format!("negative record id: {id}")))
            },
            Self::Node(None) => exn::bail!(ErrorKind::InvalidRecordRef("empty node-set".to_string())),
            Self::Missing => exn::bail!(ErrorKind::InvalidRecordRef("no argument given".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFunction {
    Creation,
    Modification,
}
impl DateFunction {
    pub const ALL: [Self; 2] = [Self::Creation, Self::Modification];

    /// Local name under [`FUNCTION_NAMESPACE`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Creation => "creation_date",
            Self::Modification => "modification_date",
        }
    }
}

/// The extension functions bound to a date source.
#[derive(Clone)]
pub struct Extensions {
    dates: Arc<dyn RecordDates>,
}

impl Extensions {
    pub fn new(dates: Arc<dyn RecordDates>) -> Self {
        Self { dates }
    }

    fn lookup(&self, function: DateFunction, record: &RecordRef) -> Result<String> {
        let id = record.record_id()?;
        match function {
            DateFunction::Creation => self.dates.creation_date(id),
            DateFunction::Modification => self.dates.modification_date(id),
        }
    }

    /// Runs `function` for `record`. Failures never reach the stylesheet:
    /// they are logged and the call evaluates to an empty string.
    pub fn evaluate(&self, function: DateFunction, record: &RecordRef) -> String {
        match self.lookup(function, record) {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(function = function.name(), ?record, error = ?err, "extension function failed");
                String::new()
            },
        }
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions").finish_non_exhaustive()
    }
}
