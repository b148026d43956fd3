use crate::model::{DuplicateGroup, MessageRecord};
use std::collections::HashMap;

/// Group records by digest and keep only real duplicate groups (2+
/// members).
///
/// Members are sorted by parsed date ascending; records whose date failed
/// to parse sort as the oldest, and the sort is stable so scan order breaks
/// ties. Groups come out ordered by descending size, first-seen digest
/// breaking ties — worst offenders first, and the same order on every run
/// over unchanged input.
pub fn group_duplicates(records: Vec<MessageRecord>) -> Vec<DuplicateGroup> {
    let mut first_seen: Vec<u64> = Vec::new();
    let mut by_digest: HashMap<u64, Vec<MessageRecord>> = HashMap::new();

    for record in records {
        let bucket = by_digest.entry(record.digest).or_default();
        if bucket.is_empty() {
            first_seen.push(record.digest);
        }
        bucket.push(record);
    }

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for digest in first_seen {
        if let Some(mut members) = by_digest.remove(&digest) {
            if members.len() > 1 {
                members.sort_by_key(|record| record.date_sort_key());
                groups.push(DuplicateGroup { digest, members });
            }
        }
    }

    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups
}
