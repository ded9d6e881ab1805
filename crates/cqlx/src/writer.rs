//! 🚰 writer.rs — the bulk writer. The part that actually moves the rows.
//!
//! 🎬 *[a list of ten thousand accounts. a store that takes a hundred at a time.]*
//! *[the writer cracks its knuckles. "one chunk at a time," it says. "in order."]*
//!
//! ```text
//!   records ──split(batch_size)──▶ chunk ──mapping.insert──▶ Vec<InsertRequest>
//!                                                                   │
//!                                           WriteSink::submit_batch ◀┘  (await, then next)
//! ```
//!
//! 🧠 Knowledge graph:
//! - `WriteSink` is the seam: anything that can accept one chunk of inserts as a unit.
//! - `CqlBatchSink` is the real one: compose a `BEGIN BATCH`, hand it to a backend `Sink`.
//! - One outstanding submission per writer. Chunk k+1 waits for chunk k. Always.
//! - First failure stops the run. Chunks already accepted stay accepted. No retry.
//!
//! 🦆 The duck asked about parallel submission. The duck was told "not in this file".

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backends::Sink;
use crate::composers::BatchComposer;
use crate::errors::{InvalidArgument, SinkError, WriteError};
use crate::mapping::{InsertRequest, TableMapping};
use crate::progress::ProgressMetrics;
use crate::splitter;

/// 🕳️ Where chunks go. One call = one grouped write, from the pipeline's point of view.
///
/// What "grouped" really guarantees (atomicity, ordering) is up to the implementation
/// and the store behind it. The writer only cares about `Ok` or `Err`.
#[async_trait]
pub trait WriteSink: Send {
    async fn submit_batch(&mut self, requests: Vec<InsertRequest>) -> Result<(), SinkError>;
}

/// 📊 What a successful run has to show for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub record_count: u64,
    pub chunk_count: usize,
    /// From just before the first submission to just after the last one.
    pub elapsed: Duration,
}

impl WriteReport {
    /// 🚀 Throughput. Zero when nothing took any measurable time.
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.record_count as f64 / secs
        } else {
            0.0
        }
    }
}

/// 🎼 The real `WriteSink`: composes each chunk into one CQL batch and sends it through a backend.
#[derive(Debug)]
pub struct CqlBatchSink<S> {
    sink: S,
    composer: BatchComposer,
    max_batch_payload_bytes: usize,
}

impl<S: Sink> CqlBatchSink<S> {
    pub fn new(sink: S, composer: BatchComposer, max_batch_payload_bytes: usize) -> Self {
        Self {
            sink,
            composer,
            max_batch_payload_bytes,
        }
    }

    /// 🔙 Hand the backend back, e.g. to `close()` it.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[async_trait]
impl<S: Sink> WriteSink for CqlBatchSink<S> {
    async fn submit_batch(&mut self, requests: Vec<InsertRequest>) -> Result<(), SinkError> {
        let payload = self.composer.compose(&requests);
        if payload.is_empty() {
            return Ok(());
        }
        if payload.len() > self.max_batch_payload_bytes {
            // -- ⚠️ the store will probably reject this. we send it anyway: chunk size is the caller's call.
            warn!(
                "⚠️ batch of {} inserts renders to {} bytes, above the {} byte threshold. The store may reject it; consider a smaller batch size.",
                requests.len(),
                payload.len(),
                self.max_batch_payload_bytes
            );
        }
        self.sink.send(payload).await.with_context(|| {
            format!(
                "💀 a {:?} batch of {} inserts was not accepted",
                self.composer.kind(),
                requests.len()
            )
        })?;
        Ok(())
    }
}

/// 🚰 The bulk writer. Holds the mapping (and optionally a progress display) between runs.
///
/// The writer never creates schema. Provision first, then write.
#[derive(Debug)]
pub struct BulkWriter {
    mapping: TableMapping,
    progress: Option<ProgressMetrics>,
}

impl BulkWriter {
    pub fn new(mapping: TableMapping) -> Self {
        Self {
            mapping,
            progress: None,
        }
    }

    /// 📊 Show a progress bar while writing.
    pub fn with_progress(mut self, progress: ProgressMetrics) -> Self {
        self.progress = Some(progress);
        self
    }

    /// 🚀 Split `records` into chunks of `batch_size`, submit each chunk in order, time the whole thing.
    ///
    /// - `batch_size` of zero or below → `WriteError::InvalidArgument`, nothing submitted.
    /// - a sink failure on chunk k → `WriteError::WriteFailed { failed_at_chunk_index: k, .. }`,
    ///   chunks after k are never attempted.
    /// - a record the mapping can't convert → `WriteError::Mapping`, its chunk is not submitted.
    pub async fn write_all<W, R, I, N>(
        &mut self,
        sink: &mut W,
        records: I,
        batch_size: N,
    ) -> Result<WriteReport, WriteError>
    where
        W: WriteSink + ?Sized,
        R: Serialize,
        I: IntoIterator<Item = R>,
        N: TryInto<usize>,
        InvalidArgument: From<N::Error>,
    {
        let chunks = splitter::split(records, batch_size)?;
        info!(
            "🚀 writing into {} in chunks of {}",
            self.mapping.qualified_table(),
            chunks.chunk_size()
        );

        let started = Instant::now();
        let mut record_count: u64 = 0;
        let mut chunk_count: usize = 0;

        let outcome = async {
            for (chunk_index, chunk) in chunks.enumerate() {
                let requests = chunk
                    .iter()
                    .map(|record| self.mapping.insert(record))
                    .collect::<anyhow::Result<Vec<_>>>()
                    .map_err(|source| WriteError::Mapping {
                        chunk_index,
                        records_written: record_count,
                        source: source.into(),
                    })?;
                let rows = requests.len() as u64;

                debug!("🪣 submitting chunk {} ({} inserts)", chunk_index, rows);
                sink.submit_batch(requests)
                    .await
                    .map_err(|cause| WriteError::WriteFailed {
                        failed_at_chunk_index: chunk_index,
                        records_written: record_count,
                        cause,
                    })?;

                record_count += rows;
                chunk_count += 1;
                if let Some(progress) = self.progress.as_mut() {
                    progress.update(rows);
                }
            }
            Ok::<(), WriteError>(())
        }
        .await;

        let elapsed = started.elapsed();
        if let Some(progress) = self.progress.as_ref() {
            progress.finish();
        }
        outcome?;

        info!(
            "✅ {} records in {} chunks written to {} in {:?}",
            record_count,
            chunk_count,
            self.mapping.qualified_table(),
            elapsed
        );
        Ok(WriteReport {
            record_count,
            chunk_count,
            elapsed,
        })
    }
}
