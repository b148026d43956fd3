use crate::storage::MessageKey;
use std::path::PathBuf;
use std::time::Duration;

/// One mailbox file selected for scanning.
#[derive(Debug, Clone)]
pub struct MailboxSource {
    pub path: PathBuf,
    /// Human-readable folder label, e.g. "Local Folders/Inbox".
    pub display_name: String,
}

impl MailboxSource {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }
}

/// One message as seen by the engine, alive from scan through cleanup.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub source_file: PathBuf,
    /// The store's locator for in-place removal. Opaque outside the store.
    pub key: MessageKey,
    pub message_id: String,
    pub digest: u64,
    pub subject: String,
    pub from: String,
    /// Raw Date header value, kept verbatim for display.
    pub date: String,
    /// Best-effort parsed Date as unix seconds. `None` when parsing fails;
    /// such records sort as the oldest possible.
    pub date_ts: Option<i64>,
    pub size: u64,
    pub folder_label: String,
}

impl MessageRecord {
    /// Sort key for intra-group ordering: unparseable dates first.
    pub fn date_sort_key(&self) -> i64 {
        self.date_ts.unwrap_or(i64::MIN)
    }
}

/// Two or more messages sharing a digest. Members are ordered by parsed
/// date ascending; index 0 is the default keep candidate.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub digest: u64,
    pub members: Vec<MessageRecord>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members beyond the kept one.
    pub fn redundant(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}

/// A source file that failed outright; siblings are unaffected.
#[derive(Debug, Clone)]
pub struct SourceError {
    pub display_name: String,
    pub message: String,
}

/// Aggregate result of one scan invocation.
#[derive(Debug)]
pub struct ScanOutcome {
    pub groups: Vec<DuplicateGroup>,
    pub source_errors: Vec<SourceError>,
    pub total_groups: usize,
    /// Σ(group size − 1) over all groups.
    pub total_redundant_messages: usize,
    pub messages_scanned: usize,
    pub cache_hits: usize,
    pub scan_duration: Duration,
}

/// Outcome of one cleanup invocation. Always returned, even on total
/// failure; only a store that cannot be opened at all short-circuits,
/// and that still lands here as `(0, [error])` for its batch.
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub deleted_count: usize,
    pub errors: Vec<String>,
}

/// How the Cleanup Engine picks the surviving member of each group.
pub enum KeepPolicy<'a> {
    /// Keep index 0, the earliest-dated member. No interaction.
    KeepFirst,
    /// Ask the caller per group. The callback receives the group's position
    /// in the selection and the group itself, and returns a 0-based member
    /// index; out-of-range answers fall back to 0.
    Select(&'a dyn Fn(usize, &DuplicateGroup) -> usize),
}

/// One decoded text part of a message body.
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub content_type: String,
    pub text: String,
}

/// Full content of one group member, for preview.
#[derive(Debug, Clone)]
pub struct MessageContent {
    /// All headers in message order.
    pub headers: Vec<(String, String)>,
    pub body_parts: Vec<BodyPart>,
}
