use crate::error::Error;
use crate::hasher::{self, HashCache, HashMethod};
use crate::model::{MailboxSource, MessageRecord};
use crate::progress::ProgressReporter;
use crate::storage::MboxStore;
use mail_parser::{Message, MessageParser};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Everything one scanned source contributes to the merge.
pub struct SourceScan {
    pub records: Vec<MessageRecord>,
    pub messages_scanned: usize,
    pub cache_hits: usize,
    pub skipped: usize,
}

/// Scan one mailbox file in bounded chunks.
///
/// Per message: parse, derive a message id (synthesizing one when the
/// header is absent), consult the cache, compute the digest on a miss and
/// write it back before moving on. Malformed messages are logged and
/// skipped; only store-level failures abort the scan. The cancellation
/// token is checked at every chunk boundary.
pub fn scan_source(
    source: &MailboxSource,
    method: HashMethod,
    cache: &HashCache,
    chunk_size: usize,
    cancel: &AtomicBool,
    reporter: &dyn ProgressReporter,
) -> Result<SourceScan, Error> {
    let start = Instant::now();
    let store = MboxStore::open(&source.path)?;
    let keys: Vec<_> = store.keys().collect();
    let total = keys.len();
    let chunk_size = chunk_size.max(1);

    debug!(
        "Scanning {} ({} messages, chunks of {})",
        source.display_name, total, chunk_size
    );
    reporter.on_source_start(&source.display_name, total);

    let mut records = Vec::with_capacity(total);
    let mut cache_hits = 0usize;
    let mut skipped = 0usize;

    for (chunk_index, chunk) in keys.chunks(chunk_size).enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        let chunk_start = chunk_index * chunk_size;
        for (offset, key) in chunk.iter().enumerate() {
            let position = chunk_start + offset;

            let raw = match store.read(*key) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Skipping unreadable message {} in {}: {}",
                        position, source.display_name, e
                    );
                    skipped += 1;
                    continue;
                }
            };

            let message = match MessageParser::new().parse(&raw[..]) {
                Some(message) => message,
                None => {
                    warn!(
                        "Skipping unparseable message {} in {}",
                        position, source.display_name
                    );
                    skipped += 1;
                    continue;
                }
            };

            let message_id = message
                .message_id()
                .map(str::to_string)
                .unwrap_or_else(|| format!("no-id-{}-{}", chunk_start, position));

            let mut from_cache = false;
            let digest = match cache.get(&message_id, &source.path, method) {
                Ok(Some(digest)) => {
                    from_cache = true;
                    digest
                }
                Ok(None) => hasher::compute_digest(&message, method),
                Err(e) => {
                    warn!("Error reading from hash cache: {}", e);
                    hasher::compute_digest(&message, method)
                }
            };
            if from_cache {
                cache_hits += 1;
            } else if let Err(e) = cache.set(&message_id, &source.path, method, digest) {
                warn!("Error writing to hash cache: {}", e);
            }

            let (date, date_ts) = date_fields(&message);
            let subject = message.subject().unwrap_or("(No Subject)").to_string();
            let mut from = hasher::digest::from_field(&message);
            if from.is_empty() {
                from = "(No Sender)".to_string();
            }

            records.push(MessageRecord {
                source_file: source.path.clone(),
                key: *key,
                message_id,
                digest,
                subject,
                from,
                date,
                date_ts,
                size: raw.len() as u64,
                folder_label: source.display_name.clone(),
            });
        }

        let processed = (chunk_start + chunk.len()).min(total);
        reporter.on_chunk(&source.display_name, processed, total);
    }

    let messages_scanned = records.len();
    reporter.on_source_complete(
        &source.display_name,
        messages_scanned,
        start.elapsed().as_secs_f64(),
    );

    Ok(SourceScan {
        records,
        messages_scanned,
        cache_hits,
        skipped,
    })
}

/// Date header as a display string plus a best-effort unix timestamp.
/// Unparsed Date headers surface from the parser as plain text and get a
/// second chance through chrono; failure leaves the timestamp `None`.
fn date_fields(message: &Message<'_>) -> (String, Option<i64>) {
    if let Some(parsed) = message.date() {
        return (parsed.to_string(), Some(parsed.to_timestamp()));
    }

    let raw = message
        .headers()
        .iter()
        .find(|header| header.name().eq_ignore_ascii_case("Date"))
        .and_then(|header| header.value().as_text())
        .unwrap_or_default()
        .trim()
        .to_string();
    let ts = chrono::DateTime::parse_from_rfc2822(&raw)
        .ok()
        .map(|d| d.timestamp());
    (raw, ts)
}
