use crate::model::{DeletionReport, DuplicateGroup, KeepPolicy};
use crate::storage::{MboxStore, MessageKey};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Delete all non-kept members of the selected groups.
///
/// Deletions are planned group by group, then executed store by store so
/// each mailbox file is opened and flushed exactly once. Failure handling:
/// - an invalid group index becomes an error entry, valid ones still run;
/// - a member that fails to delete is reported and does not block its
///   siblings;
/// - a store that cannot be opened contributes zero deletions and one
///   descriptive error for its whole batch.
///
/// The cancellation token is honored between groups during planning only;
/// a group is either planned in full or not at all, so no group is ever
/// left half-deleted.
pub fn delete_duplicates(
    groups: &[DuplicateGroup],
    group_indices: &[usize],
    keep_policy: &KeepPolicy<'_>,
    cancel: &AtomicBool,
) -> DeletionReport {
    let mut report = DeletionReport::default();

    if groups.is_empty() {
        report.errors.push("No duplicates to delete".to_string());
        return report;
    }

    let mut valid_indices = Vec::new();
    for &idx in group_indices {
        if idx < groups.len() {
            valid_indices.push(idx);
        } else {
            report.errors.push(format!("Invalid group index: {}", idx));
        }
    }
    if valid_indices.is_empty() {
        return report;
    }

    // Plan: store path → keys to remove, in first-appearance order.
    let mut plan: Vec<(PathBuf, Vec<MessageKey>)> = Vec::new();
    let mut planned_groups = 0usize;

    for (selection_pos, &idx) in valid_indices.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            let skipped = valid_indices.len() - selection_pos;
            warn!("Cleanup cancelled with {} group(s) unprocessed", skipped);
            report
                .errors
                .push(format!("Cleanup cancelled: {} group(s) not processed", skipped));
            break;
        }

        let group = &groups[idx];
        let keep_idx = match keep_policy {
            KeepPolicy::KeepFirst => 0,
            KeepPolicy::Select(select) => {
                let chosen = select(selection_pos, group);
                if chosen >= group.len() {
                    warn!(
                        "Invalid keep index {} for group of {}, keeping first",
                        chosen,
                        group.len()
                    );
                    0
                } else {
                    chosen
                }
            }
        };

        for (member_idx, member) in group.members.iter().enumerate() {
            if member_idx == keep_idx {
                continue;
            }
            match plan.iter_mut().find(|(path, _)| *path == member.source_file) {
                Some((_, keys)) => keys.push(member.key),
                None => plan.push((member.source_file.clone(), vec![member.key])),
            }
        }
        planned_groups += 1;
    }

    debug!(
        "Cleanup plan: {} group(s) across {} store(s)",
        planned_groups,
        plan.len()
    );

    for (path, keys) in plan {
        let mut store = match MboxStore::open(&path) {
            Ok(store) => store,
            Err(e) => {
                report
                    .errors
                    .push(format!("Error opening mailbox {}: {}", path.display(), e));
                continue;
            }
        };

        let mut removed_here = 0usize;
        for key in keys {
            match store.remove(key) {
                Ok(()) => removed_here += 1,
                Err(e) => {
                    report
                        .errors
                        .push(format!("Error deleting message from {}: {}", path.display(), e));
                }
            }
        }

        // One durable commit per store, not one per message.
        match store.flush() {
            Ok(()) => report.deleted_count += removed_here,
            Err(e) => {
                report
                    .errors
                    .push(format!("Error flushing mailbox {}: {}", path.display(), e));
            }
        }
    }

    info!(
        "Cleanup complete: {} message(s) deleted, {} error(s)",
        report.deleted_count,
        report.errors.len()
    );
    report
}
