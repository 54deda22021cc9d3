use std::collections::HashMap;

use crate::error::Result;
use crate::models::ManagedDocument;

/// Access to the documents a site manages for its records.
pub trait DocumentStore: Send + Sync {
    /// Documents of `record`, optionally only those of `doctype`.
    fn managed_documents(&self, record: u64, doctype: Option<&str>) -> Result<Vec<ManagedDocument>>;
}

/// Documents held in memory, keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<u64, Vec<ManagedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: u64, document: ManagedDocument) {
        self.documents.entry(record).or_default().push(document);
    }
}

impl DocumentStore for MemoryStore {
    fn managed_documents(&self, record: u64, doctype: Option<&str>) -> Result<Vec<ManagedDocument>> {
        let documents = self.documents.get(&record).map(Vec::as_slice).unwrap_or_default();
        Ok(documents
            .iter()
            .filter(|document| doctype.is_none_or(|doctype| document.doctype.as_str() == doctype))
            .cloned()
            .collect())
    }
}
