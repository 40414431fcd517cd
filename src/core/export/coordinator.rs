//! Export coordinator - main orchestrator for the export process
//!
//! The coordinator resolves the request's scope against the source, builds
//! one [`ReportStream`] per enabled report and hands them out in the shape
//! callers expect: nothing, a single stream, or a keyed collection.
//! [`ExportCoordinator::run`] drives those streams into files.

use crate::adapters::database::ReportSource;
use crate::config::{OutputConfig, RosterConfig};
use crate::core::export::batch::{ReportStream, DEFAULT_BATCH_SIZE};
use crate::core::export::sink::{CsvSink, SinkOutcome};
use crate::core::export::summary::{ExportSummary, ReportOutcome};
use crate::core::report::{HeaderLabels, ReportContext, Scope};
use crate::domain::{
    AccountId, ReportKind, ReportRequest, Result, RosterError, UnresolvedLoginPolicy,
};
use crate::{log_error_with_context, log_report_complete, log_report_start};
use std::collections::BTreeMap;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// The streams of one export, shaped by how many reports were enabled
#[derive(Debug)]
pub enum ReportSet {
    /// No report enabled; only the summary text is produced
    Empty,
    /// Exactly one report enabled, handed out unwrapped
    Single(ReportStream),
    /// Several reports, keyed by kind (catalog order)
    Multiple(BTreeMap<ReportKind, ReportStream>),
}

impl ReportSet {
    pub fn len(&self) -> usize {
        match self {
            ReportSet::Empty => 0,
            ReportSet::Single(_) => 1,
            ReportSet::Multiple(streams) => streams.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enabled kinds, in catalog order
    pub fn kinds(&self) -> Vec<ReportKind> {
        match self {
            ReportSet::Empty => Vec::new(),
            ReportSet::Single(stream) => vec![stream.kind()],
            ReportSet::Multiple(streams) => streams.keys().copied().collect(),
        }
    }

    /// Flatten into a list of streams, in catalog order
    pub fn into_streams(self) -> Vec<ReportStream> {
        match self {
            ReportSet::Empty => Vec::new(),
            ReportSet::Single(stream) => vec![stream],
            ReportSet::Multiple(streams) => streams.into_values().collect(),
        }
    }
}

/// Everything one export produces before any row is pulled
#[derive(Debug)]
pub struct ExportOutput {
    /// Human-readable description of the request
    pub extra_text: String,
    pub reports: ReportSet,
}

/// Builds the summary text: term, deleted flag and enabled report names
pub fn extra_text(ctx: &ReportContext, enabled: &[ReportKind]) -> String {
    let mut text = String::new();
    if let Some(term) = &ctx.scope.term {
        text.push_str(&format!("Term: {}; ", term.name));
    }
    if ctx.include_deleted {
        text.push_str("Include Deleted Objects; ");
    }
    text.push_str("Reports: ");
    for kind in enabled {
        text.push_str(kind.as_str());
        text.push(' ');
    }
    text
}

/// Export coordinator
pub struct ExportCoordinator {
    source: Arc<dyn ReportSource + Send + Sync>,
    root: AccountId,
    request: ReportRequest,
    unresolved_logins: UnresolvedLoginPolicy,
    labels: HeaderLabels,
    batch_size: usize,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        source: Arc<dyn ReportSource + Send + Sync>,
        root: AccountId,
        request: ReportRequest,
    ) -> Self {
        Self {
            source,
            root,
            request,
            unresolved_logins: UnresolvedLoginPolicy::default(),
            labels: HeaderLabels::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Create a coordinator for the `[report]` section of a configuration
    ///
    /// # Errors
    ///
    /// Returns a validation error for ids that are not positive.
    pub fn from_config(
        config: &RosterConfig,
        source: Arc<dyn ReportSource + Send + Sync>,
    ) -> Result<Self> {
        let root = config
            .report
            .root_account()
            .map_err(RosterError::Validation)?;
        let request = config
            .report
            .to_request()
            .map_err(RosterError::Validation)?;

        Ok(Self::new(source, root, request)
            .with_unresolved_login_policy(config.report.unresolved_login_policy)
            .with_header_labels(HeaderLabels::new(config.report.header_labels.clone())))
    }

    pub fn with_unresolved_login_policy(mut self, policy: UnresolvedLoginPolicy) -> Self {
        self.unresolved_logins = policy;
        self
    }

    pub fn with_header_labels(mut self, labels: HeaderLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn request(&self) -> &ReportRequest {
        &self.request
    }

    /// Load the root, sub-account and term records and the trust list
    ///
    /// # Errors
    ///
    /// A missing or non-root root account, or a sub-account or term outside
    /// the root, is a [`RosterError::Validation`]. Source failures propagate.
    pub async fn resolve_scope(&self) -> Result<Scope> {
        let root = self
            .source
            .account(self.root)
            .await?
            .ok_or_else(|| RosterError::Validation(format!("Account {} not found", self.root)))?;
        if !root.is_root() {
            return Err(RosterError::Validation(format!(
                "Account {} is not a root account",
                self.root
            )));
        }

        let sub_account = match self.request.sub_account {
            Some(id) if id == root.id => None,
            Some(id) => {
                let account = self.source.account(id).await?.ok_or_else(|| {
                    RosterError::Validation(format!("Sub-account {id} not found"))
                })?;
                if account.root() != root.id {
                    return Err(RosterError::Validation(format!(
                        "Sub-account {id} does not belong to root account {}",
                        root.id
                    )));
                }
                Some(account)
            }
            None => None,
        };

        let term = match self.request.term {
            Some(id) => {
                let term = self
                    .source
                    .term(id)
                    .await?
                    .ok_or_else(|| RosterError::Validation(format!("Term {id} not found")))?;
                if term.root_account_id != root.id {
                    return Err(RosterError::Validation(format!(
                        "Term {id} does not belong to root account {}",
                        root.id
                    )));
                }
                Some(term)
            }
            None => None,
        };

        let trusted_accounts = self.source.trusted_account_ids(root.id).await?;
        tracing::debug!(
            root = %root.id,
            sub_account = ?sub_account.as_ref().map(|a| a.id.get()),
            term = ?term.as_ref().map(|t| t.id.get()),
            trusted = trusted_accounts.len(),
            "Resolved export scope"
        );

        Ok(Scope {
            root,
            sub_account,
            term,
            trusted_accounts,
        })
    }

    /// Resolve the scope and build the shared report context
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_scope`].
    pub async fn context(&self) -> Result<ReportContext> {
        let scope = self.resolve_scope().await?;
        let mut ctx = ReportContext::new(self.request.format, scope);
        ctx.created_by_sis = self.request.created_by_sis;
        ctx.include_deleted = self.request.include_deleted;
        ctx.unresolved_logins = self.unresolved_logins;
        ctx.labels = self.labels.clone();
        Ok(ctx)
    }

    /// Build the streams for every enabled report; no rows are fetched yet
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_scope`].
    pub async fn prepare(&self) -> Result<ExportOutput> {
        let enabled = self.request.enabled();
        let ctx = Arc::new(self.context().await?);
        let extra_text = extra_text(&ctx, &enabled);

        let open = |kind| {
            ReportStream::open(kind, Arc::clone(&ctx), Arc::clone(&self.source), self.batch_size)
        };
        let reports = match enabled.as_slice() {
            [] => ReportSet::Empty,
            [kind] => ReportSet::Single(open(*kind)),
            kinds => ReportSet::Multiple(kinds.iter().map(|k| (*k, open(*k))).collect()),
        };

        Ok(ExportOutput {
            extra_text,
            reports,
        })
    }

    /// Execute the export, writing `<directory>/<report>.csv` per report
    ///
    /// With `dry_run` the streams are drained and counted without writing
    /// anything. Reports are produced sequentially in catalog order; the
    /// shutdown flag stops the current report at the next row boundary and
    /// skips the remaining ones.
    ///
    /// # Errors
    ///
    /// The first failing report ends the export.
    pub async fn run(
        &self,
        output: &OutputConfig,
        dry_run: bool,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ExportSummary> {
        let start_time = Instant::now();
        tracing::info!(
            format = %self.request.format,
            root = %self.root,
            dry_run,
            "Starting export process"
        );

        let prepared = self.prepare().await?;
        let mut summary = ExportSummary::new(self.request.format, prepared.extra_text, dry_run);

        if prepared.reports.is_empty() {
            tracing::warn!(requested = ?self.request.reports, "No known reports requested");
            return Ok(summary.with_duration(start_time.elapsed()));
        }

        let sink = CsvSink::new(output.delimiter_byte().map_err(RosterError::Configuration)?);
        let directory = Path::new(&output.directory);
        if !dry_run {
            std::fs::create_dir_all(directory)?;
        }

        for mut stream in prepared.reports.into_streams() {
            let kind = stream.kind();
            if *shutdown.borrow() {
                summary.interrupted = true;
                break;
            }
            if !stream.is_available() {
                summary.add_report(ReportOutcome::unavailable(kind));
                continue;
            }

            log_report_start!(kind, self.request.format);
            let report_start = Instant::now();

            let (written, file) = if dry_run {
                (sink.count(&mut stream, &shutdown).await, None)
            } else {
                let path = directory.join(format!("{kind}.csv"));
                let file = std::fs::File::create(&path)?;
                (
                    sink.write_report(&mut stream, BufWriter::new(file), &shutdown)
                        .await,
                    Some(path),
                )
            };
            let SinkOutcome { rows, interrupted } = match written {
                Ok(outcome) => outcome,
                Err(e) => {
                    log_error_with_context!(e, format!("Report {kind} failed").as_str());
                    if let Some(path) = &file {
                        // A truncated file must not pass for a finished report
                        if let Err(remove) = std::fs::remove_file(path) {
                            tracing::warn!(
                                path = %path.display(),
                                error = %remove,
                                "Failed to remove partial report file"
                            );
                        }
                    }
                    return Err(e);
                }
            };

            let skipped = stream.stats().skipped();
            log_report_complete!(kind, rows, skipped, report_start.elapsed());
            summary.add_report(ReportOutcome {
                report: kind,
                available: true,
                rows,
                skipped,
                file,
            });

            if interrupted {
                summary.interrupted = true;
                break;
            }
        }

        if output.write_manifest && !dry_run {
            summary.write_manifest(directory)?;
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
