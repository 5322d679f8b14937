//! Destinations for assembled documents.

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use leakdex_core::Document;
use leakdex_search::SearchClient;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Upsert-by-id storage for documents.
///
/// Sending the same id twice must overwrite, never duplicate.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn upsert(&self, document: &Document) -> IngestResult<()>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl DocumentSink for SearchClient {
    async fn upsert(&self, document: &Document) -> IngestResult<()> {
        self.index_document(&document.id, &document.fields).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.index()
    }
}

/// Keeps every document in memory, keyed by id.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<BTreeMap<String, Document>>,
    upserts: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct documents held.
    pub fn len(&self) -> usize {
        self.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.lock().ok().and_then(|docs| docs.get(id).cloned())
    }

    /// Stored ids in ascending order.
    pub fn ids(&self) -> Vec<String> {
        self.lock()
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.lock()
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total upserts received, including overwrites.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::Relaxed)
    }

    fn lock(&self) -> IngestResult<std::sync::MutexGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .lock()
            .map_err(|_| IngestError::Sink("memory sink lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn upsert(&self, document: &Document) -> IngestResult<()> {
        self.lock()?.insert(document.id.clone(), document.clone());
        self.upserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Drops every document, counting only. Used for dry runs.
#[derive(Debug, Default)]
pub struct DiscardSink {
    count: AtomicUsize,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentSink for DiscardSink {
    async fn upsert(&self, _document: &Document) -> IngestResult<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "discard"
    }
}
