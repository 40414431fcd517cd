//! Batch row streaming
//!
//! A [`ReportStream`] pulls its report's query one keyset page at a time.
//! Nothing is fetched until the consumer asks for a row, and at most one
//! assembled page is held in memory.

use crate::adapters::database::ReportSource;
use crate::core::report::{self, ReportContext, Select};
use crate::domain::{ReportKind, Result, Row};
use crate::log_batch_fetched;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source rows fetched per page
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Counters shared between a stream and whoever consumes it
#[derive(Debug, Default)]
pub struct StreamStats {
    fetched: AtomicU64,
    skipped: AtomicU64,
}

impl StreamStats {
    /// Source rows read so far
    pub fn fetched(&self) -> u64 {
        self.fetched.load(Ordering::Relaxed)
    }

    /// Source rows left out of the output so far
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Pagination state carried between pulls
struct Pager {
    kind: ReportKind,
    ctx: Arc<ReportContext>,
    source: Arc<dyn ReportSource + Send + Sync>,
    query: Arc<Select>,
    batch_size: usize,
    stats: Arc<StreamStats>,
    after: Option<i64>,
    exhausted: bool,
    pending: VecDeque<Row>,
}

impl Pager {
    async fn next_row(mut self) -> Result<Option<(Row, Self)>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some((row, self)));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self
                .source
                .fetch_page(&self.query, self.after, self.batch_size)
                .await?;
            log_batch_fetched!(self.query.name(), page.len(), self.after);

            match page.last() {
                Some(last) => self.after = Some(last.cursor()?),
                None => self.exhausted = true,
            }
            if page.len() < self.batch_size {
                self.exhausted = true;
            }
            self.stats
                .fetched
                .fetch_add(page.len() as u64, Ordering::Relaxed);

            let batch =
                report::assemble(self.kind, &self.ctx, self.source.as_ref(), &page).await?;
            if batch.skipped > 0 {
                tracing::debug!(
                    report = %self.kind,
                    skipped = batch.skipped,
                    "Rows skipped in batch"
                );
                self.stats
                    .skipped
                    .fetch_add(batch.skipped, Ordering::Relaxed);
            }
            self.pending.extend(batch.rows);
        }
    }
}

/// The lazily produced output of one report
pub struct ReportStream {
    kind: ReportKind,
    header: Option<Vec<String>>,
    rows: BoxStream<'static, Result<Row>>,
    stats: Arc<StreamStats>,
}

impl ReportStream {
    /// Build the stream for `kind`; unavailable reports get an empty stream
    /// without a header
    pub fn open(
        kind: ReportKind,
        ctx: Arc<ReportContext>,
        source: Arc<dyn ReportSource + Send + Sync>,
        batch_size: usize,
    ) -> Self {
        let stats = Arc::new(StreamStats::default());
        let header = report::headers(kind, &ctx);

        let rows = match report::query(kind, &ctx) {
            Some(query) => {
                let pager = Pager {
                    kind,
                    ctx,
                    source,
                    query: Arc::new(query),
                    batch_size: batch_size.max(1),
                    stats: Arc::clone(&stats),
                    after: None,
                    exhausted: false,
                    pending: VecDeque::new(),
                };
                stream::try_unfold(pager, Pager::next_row).boxed()
            }
            None => stream::empty().boxed(),
        };

        Self {
            kind,
            header,
            rows,
            stats,
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Header row, `None` when the report does not exist in this format
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.header.is_some()
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        Arc::clone(&self.stats)
    }

    /// Pull the next row; fetches the next page when the current one is used up
    pub async fn next_row(&mut self) -> Option<Result<Row>> {
        self.rows.next().await
    }

    /// Drain the remaining rows into memory
    ///
    /// # Errors
    ///
    /// Returns the first error the stream yields.
    pub async fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl fmt::Debug for ReportStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportStream")
            .field("kind", &self.kind)
            .field("header", &self.header)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
