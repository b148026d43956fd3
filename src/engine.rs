use crate::cleanup;
use crate::config::AppConfig;
use crate::content;
use crate::error::Error;
use crate::grouper;
use crate::hasher::{HashCache, HashMethod};
use crate::model::{
    DeletionReport, DuplicateGroup, KeepPolicy, MailboxSource, MessageContent, ScanOutcome,
    SourceError,
};
use crate::progress::ProgressReporter;
use crate::scanner;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Multi-source orchestrator. Owns the configuration, the shared hash
/// cache and the cancellation token, and exposes the four engine
/// operations: `scan`, `delete`, `get_content`, `clear_cache`.
pub struct ScanEngine {
    config: AppConfig,
    cache: HashCache,
    cancel: Arc<AtomicBool>,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let cache = HashCache::open(&config.cache_path)?;
        Ok(Self {
            config,
            cache,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Cooperative cancellation flag, checked at every chunk boundary
    /// during scans and between groups during cleanup.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    pub fn clear_cache(&self) -> Result<(), Error> {
        self.cache.clear_all()
    }

    /// Fan one scanner task per source across a bounded worker pool and
    /// merge the results in input order.
    ///
    /// A failed source becomes one `SourceError` entry and never cancels
    /// or degrades its siblings; grouping happens per source and the merge
    /// concatenates, so a digest collision across two files stays two
    /// groups.
    pub fn scan(
        &self,
        sources: &[MailboxSource],
        method: HashMethod,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanOutcome, Error> {
        self.cancel.store(false, Ordering::Relaxed);
        let start = Instant::now();

        if sources.is_empty() {
            debug!("Scan requested with no sources");
            return Ok(ScanOutcome {
                groups: Vec::new(),
                source_errors: Vec::new(),
                total_groups: 0,
                total_redundant_messages: 0,
                messages_scanned: 0,
                cache_hits: 0,
                scan_duration: start.elapsed(),
            });
        }

        let workers = self.config.max_workers.max(1).min(sources.len());
        info!(
            "Scanning {} mailbox(es) with {} worker(s), criteria '{}'",
            sources.len(),
            workers,
            method
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Other(format!("failed to build worker pool: {}", e)))?;

        let results: Vec<Result<scanner::SourceScan, Error>> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    scanner::scan_source(
                        source,
                        method,
                        &self.cache,
                        self.config.chunk_size,
                        &self.cancel,
                        reporter,
                    )
                })
                .collect()
        });

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut source_errors: Vec<SourceError> = Vec::new();
        let mut messages_scanned = 0usize;
        let mut cache_hits = 0usize;

        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(scan) => {
                    messages_scanned += scan.messages_scanned;
                    cache_hits += scan.cache_hits;
                    if scan.skipped > 0 {
                        debug!(
                            "{}: {} message(s) skipped as unreadable",
                            source.display_name, scan.skipped
                        );
                    }
                    groups.extend(grouper::group_duplicates(scan.records));
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("Error scanning {}: {}", source.display_name, e);
                    source_errors.push(SourceError {
                        display_name: source.display_name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let total_groups = groups.len();
        let total_redundant_messages = groups.iter().map(|g| g.redundant()).sum();
        let scan_duration = start.elapsed();

        info!(
            "Scan complete in {:.2}s: {} groups, {} redundant messages, {} cache hits",
            scan_duration.as_secs_f64(),
            total_groups,
            total_redundant_messages,
            cache_hits,
        );
        reporter.on_scan_complete(
            total_groups,
            total_redundant_messages,
            scan_duration.as_secs_f64(),
        );

        Ok(ScanOutcome {
            groups,
            source_errors,
            total_groups,
            total_redundant_messages,
            messages_scanned,
            cache_hits,
            scan_duration,
        })
    }

    /// Delete every non-kept member of the selected groups. See
    /// [`cleanup::delete_duplicates`] for the per-store batching and
    /// failure semantics.
    pub fn delete(
        &self,
        groups: &[DuplicateGroup],
        group_indices: &[usize],
        keep_policy: &KeepPolicy<'_>,
    ) -> DeletionReport {
        cleanup::delete_duplicates(groups, group_indices, keep_policy, &self.cancel)
    }

    /// Full headers and decoded text parts of one group member, for
    /// preview.
    pub fn get_content(
        &self,
        groups: &[DuplicateGroup],
        group_index: usize,
        member_index: usize,
    ) -> Result<MessageContent, Error> {
        content::get_content(groups, group_index, member_index)
    }
}
