/// Progress sink for scan reporting.
///
/// The engine never writes to stdout itself; collaborators implement this
/// with whatever sink they own (the CLI uses indicatif bars). All methods
/// have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_source_start(&self, _source: &str, _total_messages: usize) {}
    /// Called after every processed chunk of one source.
    fn on_chunk(&self, _source: &str, _processed: usize, _total_messages: usize) {}
    fn on_source_complete(&self, _source: &str, _messages: usize, _duration_secs: f64) {}
    fn on_scan_complete(&self, _groups: usize, _redundant: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
