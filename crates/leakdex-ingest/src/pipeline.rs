//! The streaming ingestion loop.
//!
//! Extraction runs on a blocking worker and feeds assembled documents into a
//! bounded channel. A drain task takes documents off the channel and upserts
//! them with a bounded number in flight. When `await_sink` is set the run
//! waits for the drain before reporting; otherwise the drain is left running
//! and can be awaited later with [`Ingestor::flush`].

use crate::assembler::DocumentAssembler;
use crate::classify::classify;
use crate::download::Download;
use crate::error::{IngestError, IngestResult};
use crate::extractors::{self, ExtractOptions, ExtractStats};
use crate::sink::DocumentSink;
use leakdex_config::IngestConfig;
use leakdex_core::{Document, SourceFormat};
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Upsert outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub succeeded: usize,
    pub failed: usize,
}

impl SinkStats {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn merge(&mut self, other: SinkStats) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    fn record(&mut self, outcome: Result<bool, JoinError>) {
        match outcome {
            Ok(true) => self.succeeded += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                warn!("Upsert task failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Source label stored as `leak_source`.
    pub source: String,
    pub format: SourceFormat,
    /// Documents produced and handed to the sink.
    pub records: usize,
    /// Units that could not be read.
    pub skipped: usize,
    /// Lines dropped as noise.
    pub filtered: usize,
    /// Upsert outcomes, present only when the run waited for the sink.
    pub sink: Option<SinkStats>,
    pub elapsed: Duration,
}

/// Runs uploads through extraction, assembly and the sink.
pub struct Ingestor {
    sink: Arc<dyn DocumentSink>,
    config: IngestConfig,
    options: ExtractOptions,
    assembler: DocumentAssembler,
    pending: Mutex<Vec<JoinHandle<SinkStats>>>,
}

impl Ingestor {
    /// Create an ingestor writing to `sink`.
    pub fn new(sink: Arc<dyn DocumentSink>, config: IngestConfig) -> IngestResult<Self> {
        let options = ExtractOptions::from_config(&config)?;
        let assembler = DocumentAssembler::from_config(&config);
        Ok(Self {
            sink,
            config,
            options,
            assembler,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Replace the document assembler.
    pub fn with_assembler(mut self, assembler: DocumentAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a byte stream in `format`, stored under the label `source`.
    pub async fn ingest_reader<R>(
        &self,
        reader: R,
        format: SourceFormat,
        source: &str,
    ) -> IngestResult<IngestReport>
    where
        R: Read + Send + 'static,
    {
        let started = Instant::now();
        info!("Ingesting {} as {}", source, format);

        let (tx, rx) = mpsc::channel::<Document>(self.config.queue_capacity);

        let options = self.options.clone();
        let assembler = self.assembler.clone();
        let label = source.to_string();
        let producer = tokio::task::spawn_blocking(move || -> (usize, ExtractStats) {
            let reader = BufReader::with_capacity(READ_BUFFER_BYTES, reader);
            let mut extractor = extractors::open(format, reader, &options);
            let mut records = 0;

            for extracted in extractor.by_ref() {
                let document = assembler.assemble(extracted, &label);
                if tx.blocking_send(document).is_err() {
                    warn!("Document queue closed, stopping extraction of {}", label);
                    break;
                }
                records += 1;
            }

            (records, extractor.stats())
        });

        let drain = tokio::spawn(drain(
            Arc::clone(&self.sink),
            rx,
            self.config.sink_concurrency,
        ));

        let (records, stats) = producer.await?;

        let sink = if self.config.await_sink {
            Some(drain.await?)
        } else {
            self.lock_pending()?.push(drain);
            None
        };

        let report = IngestReport {
            source: source.to_string(),
            format,
            records,
            skipped: stats.skipped,
            filtered: stats.filtered,
            sink,
            elapsed: started.elapsed(),
        };

        match report.sink {
            Some(outcome) if outcome.failed > 0 => warn!(
                "Ingested {} records from {}, {} upserts failed",
                report.records, report.source, outcome.failed
            ),
            _ => info!(
                "Ingested {} records from {} ({} skipped) in {:.2?}",
                report.records, report.source, report.skipped, report.elapsed
            ),
        }

        Ok(report)
    }

    /// Ingest a file, labelled by its file name.
    pub async fn ingest_file(&self, path: &Path) -> IngestResult<IngestReport> {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        self.ingest_path(path, &source).await
    }

    /// Ingest a file under an explicit label.
    ///
    /// The format comes from the file's own name; `source` only becomes
    /// `leak_source`.
    pub async fn ingest_path(&self, path: &Path, source: &str) -> IngestResult<IngestReport> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let format = classify(&name, None);
        self.ingest_file_as(path, format, source).await
    }

    /// Ingest a downloaded upload.
    pub async fn ingest_download(&self, download: &Download) -> IngestResult<IngestReport> {
        self.ingest_file_as(download.path(), download.format, &download.source_name)
            .await
    }

    async fn ingest_file_as(
        &self,
        path: &Path,
        format: SourceFormat,
        source: &str,
    ) -> IngestResult<IngestReport> {
        if !path.is_file() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let file = tokio::fs::File::open(path).await?.into_std().await;
        self.ingest_reader(file, format, source).await
    }

    /// Ingest every non-hidden file below `dir`, in name order.
    ///
    /// A file that fails is logged and left out of the result.
    pub async fn ingest_directory(&self, dir: &Path) -> IngestResult<Vec<IngestReport>> {
        if !dir.is_dir() {
            return Err(IngestError::FileNotFound(dir.to_path_buf()));
        }

        let files: Vec<_> = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        debug!("Found {} files under {}", files.len(), dir.display());

        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            match self.ingest_file(&path).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Failed to ingest {}: {}", path.display(), e),
            }
        }

        Ok(reports)
    }

    /// Wait for every detached drain left by runs that did not await the sink.
    pub async fn flush(&self) -> IngestResult<SinkStats> {
        let pending = std::mem::take(&mut *self.lock_pending()?);
        let mut total = SinkStats::default();
        for handle in pending {
            total.merge(handle.await?);
        }
        Ok(total)
    }

    fn lock_pending(&self) -> IngestResult<std::sync::MutexGuard<'_, Vec<JoinHandle<SinkStats>>>> {
        self.pending
            .lock()
            .map_err(|_| IngestError::Sink("pending drain list poisoned".to_string()))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

/// Upsert queued documents with at most `concurrency` in flight.
async fn drain(
    sink: Arc<dyn DocumentSink>,
    mut rx: mpsc::Receiver<Document>,
    concurrency: usize,
) -> SinkStats {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut stats = SinkStats::default();

    while let Some(document) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };

        while let Some(done) = tasks.try_join_next() {
            stats.record(done);
        }

        let sink = Arc::clone(&sink);
        tasks.spawn(async move {
            let _permit = permit;
            match sink.upsert(&document).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to upsert {} into {}: {}", document.id, sink.name(), e);
                    false
                }
            }
        });
    }

    while let Some(done) = tasks.join_next().await {
        stats.record(done);
    }

    debug!(
        "Sink drain finished: {} succeeded, {} failed",
        stats.succeeded, stats.failed
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use std::io::Cursor;
    use tempfile::tempdir;

    struct FailingSink {
        inner: MemorySink,
        reject: &'static str,
    }

    #[async_trait]
    impl DocumentSink for FailingSink {
        async fn upsert(&self, document: &Document) -> IngestResult<()> {
            if document.fields.get_str("user") == Some(self.reject) {
                return Err(IngestError::Sink(format!("rejected {}", document.id)));
            }
            self.inner.upsert(document).await
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn ingestor(sink: Arc<dyn DocumentSink>) -> Ingestor {
        Ingestor::new(sink, IngestConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.csv");
        std::fs::write(&path, "user,pass\nbob,1234\neve,abcd\n").unwrap();

        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone());

        let first = ingestor.ingest_file(&path).await.unwrap();
        let ids_after_first = sink.ids();
        let second = ingestor.ingest_file(&path).await.unwrap();

        assert_eq!(first.format, SourceFormat::Tabular);
        assert_eq!(first.records, 2);
        assert_eq!(second.records, 2);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.upsert_count(), 4);
        assert_eq!(sink.ids(), ids_after_first);

        let bob = sink
            .documents()
            .into_iter()
            .find(|d| d.fields.get_str("user") == Some("bob"))
            .unwrap();
        assert_eq!(bob.leak_source(), Some("dump.csv"));
        assert_eq!(bob.full_text(), Some("bob 1234"));
        assert_eq!(bob.id, leakdex_core::fingerprint("bob 1234", "dump.csv"));
    }

    #[tokio::test]
    async fn test_line_stream_counts() {
        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone());

        let input = "alice@example.com:secret1\nabc\nbob|hunter2\nINSERT INTO t VALUES (1)\n";
        let report = ingestor
            .ingest_reader(
                Cursor::new(input.as_bytes().to_vec()),
                SourceFormat::LineHeuristic,
                "combo.txt",
            )
            .await
            .unwrap();

        assert_eq!(report.format, SourceFormat::LineHeuristic);
        assert_eq!(report.records, 3);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.sink, Some(SinkStats { succeeded: 3, failed: 0 }));
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_content_type_used_without_extension() {
        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone());

        let report = ingestor
            .ingest_reader(
                Cursor::new(br#"[{"user":"bob"}]"#.to_vec()),
                classify("upload", Some("application/json; charset=utf-8")),
                "upload",
            )
            .await
            .unwrap();

        assert_eq!(report.format, SourceFormat::Structured);
        assert_eq!(report.records, 1);
    }

    #[tokio::test]
    async fn test_sink_failures_are_counted_not_fatal() {
        let sink = Arc::new(FailingSink {
            inner: MemorySink::new(),
            reject: "eve",
        });
        let ingestor = ingestor(sink.clone());

        let report = ingestor
            .ingest_reader(
                Cursor::new(b"user,pass\nbob,1\neve,2\ncarol,3\n".to_vec()),
                SourceFormat::Tabular,
                "dump.csv",
            )
            .await
            .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.sink, Some(SinkStats { succeeded: 2, failed: 1 }));
        assert_eq!(sink.inner.len(), 2);
    }

    #[tokio::test]
    async fn test_detached_drain_and_flush() {
        let sink = Arc::new(MemorySink::new());
        let config = IngestConfig {
            await_sink: false,
            ..IngestConfig::default()
        };
        let ingestor = Ingestor::new(sink.clone(), config).unwrap();

        let input: String = (0..50).map(|i| format!("user{}:password{}\n", i, i)).collect();
        let report = ingestor
            .ingest_reader(
                Cursor::new(input.into_bytes()),
                SourceFormat::LineHeuristic,
                "combo.txt",
            )
            .await
            .unwrap();

        assert_eq!(report.records, 50);
        assert!(report.sink.is_none());

        let flushed = ingestor.flush().await.unwrap();
        assert_eq!(flushed, SinkStats { succeeded: 50, failed: 0 });
        assert_eq!(sink.len(), 50);

        assert_eq!(ingestor.flush().await.unwrap(), SinkStats::default());
    }

    #[tokio::test]
    async fn test_tiny_queue_still_delivers_everything() {
        let sink = Arc::new(MemorySink::new());
        let config = IngestConfig {
            queue_capacity: 1,
            sink_concurrency: 1,
            ..IngestConfig::default()
        };
        let ingestor = Ingestor::new(sink.clone(), config).unwrap();

        let input: String = (0..200).map(|i| format!("line number {}\n", i)).collect();
        let report = ingestor
            .ingest_reader(
                Cursor::new(input.into_bytes()),
                SourceFormat::LineHeuristic,
                "notes.txt",
            )
            .await
            .unwrap();

        assert_eq!(report.records, 200);
        assert_eq!(sink.len(), 200);
    }

    #[tokio::test]
    async fn test_upload_date_stamped_when_configured() {
        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone())
            .with_assembler(DocumentAssembler::new(false).with_upload_date("2024-05-01"));

        ingestor
            .ingest_reader(
                Cursor::new(b"alice:secret\n".to_vec()),
                SourceFormat::LineHeuristic,
                "combo.txt",
            )
            .await
            .unwrap();

        let doc = &sink.documents()[0];
        assert_eq!(doc.fields.get_str("upload_date"), Some("2024-05-01"));
    }

    #[tokio::test]
    async fn test_ingest_directory_skips_hidden() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "user,pass\nbob,1234\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "alice:secret\n").unwrap();
        std::fs::write(dir.path().join(".hidden.txt"), "mallory:secret\n").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.json"), r#"[{"user":"eve"}]"#).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config.txt"), "ignored:entry\n").unwrap();

        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone());
        let reports = ingestor.ingest_directory(dir.path()).await.unwrap();

        let sources: Vec<_> = reports.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a.csv", "b.txt", "c.json"]);
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_custom_label_keeps_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "user,pass\nbob,1234\n").unwrap();

        let sink = Arc::new(MemorySink::new());
        let ingestor = ingestor(sink.clone());
        let report = ingestor.ingest_path(&path, "linkedin-2012").await.unwrap();

        assert_eq!(report.format, SourceFormat::Tabular);
        assert_eq!(report.source, "linkedin-2012");
        assert_eq!(report.records, 1);

        let doc = &sink.documents()[0];
        assert_eq!(doc.fields.get_str("user"), Some("bob"));
        assert_eq!(doc.fields.get_str("pass"), Some("1234"));
        assert_eq!(doc.leak_source(), Some("linkedin-2012"));
        assert!(!doc.fields.contains("raw_content"));
    }

    #[test]
    fn test_rejects_invalid_limits() {
        for config in [
            IngestConfig {
                queue_capacity: 0,
                ..IngestConfig::default()
            },
            IngestConfig {
                sink_concurrency: 0,
                ..IngestConfig::default()
            },
            IngestConfig {
                max_line_bytes: 0,
                ..IngestConfig::default()
            },
        ] {
            let result = Ingestor::new(Arc::new(MemorySink::new()), config);
            assert!(matches!(
                result,
                Err(IngestError::Config(leakdex_config::ConfigError::Invalid(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let ingestor = ingestor(Arc::new(MemorySink::new()));
        let result = ingestor.ingest_file(Path::new("/nonexistent/dump.txt")).await;
        assert!(matches!(result, Err(IngestError::FileNotFound(_))));
    }
}
