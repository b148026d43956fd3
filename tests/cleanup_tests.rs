use std::fs;
use std::path::Path;
use tempfile::tempdir;

use mail_dedupe::{
    AppConfig, HashMethod, KeepPolicy, MailboxSource, ScanEngine, SilentReporter,
};

fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        cache_path: dir.join("cache.db").to_string_lossy().into_owned(),
        ..AppConfig::default()
    }
}

fn push_message(out: &mut String, id: &str, date: &str, from: &str, subject: &str, body: &str) {
    out.push_str(&format!("From {} Mon Apr  1 09:00:00 2025\n", from));
    out.push_str(&format!("Message-ID: {}\n", id));
    out.push_str(&format!("Date: {}\n", date));
    out.push_str(&format!("From: {}\n", from));
    out.push_str(&format!("Subject: {}\n", subject));
    out.push_str(&format!("\n{}\n\n", body));
}

/// Three resends of the same newsletter, written newest-first so the sort
/// has to reorder them.
fn write_resend_mailbox(path: &Path) {
    let mut mbox = String::new();
    push_message(
        &mut mbox,
        "<resend-3@example.com>",
        "Wed, 03 Apr 2025 10:00:00 -0400",
        "news@example.com",
        "Monthly Digest",
        "newest copy",
    );
    push_message(
        &mut mbox,
        "<resend-1@example.com>",
        "Mon, 01 Apr 2025 10:00:00 -0400",
        "news@example.com",
        "Monthly Digest",
        "oldest copy",
    );
    push_message(
        &mut mbox,
        "<resend-2@example.com>",
        "Tue, 02 Apr 2025 10:00:00 -0400",
        "news@example.com",
        "Monthly Digest",
        "middle copy",
    );
    fs::write(path, mbox).unwrap();
}

#[test]
fn test_keep_first_retains_the_earliest_dated_member() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");
    write_resend_mailbox(&mbox_path);
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();
    assert_eq!(outcome.total_groups, 1);

    let dates: Vec<_> = outcome.groups[0]
        .members
        .iter()
        .map(|m| m.date_ts.unwrap())
        .collect();
    assert!(dates.windows(2).all(|w| w[0] <= w[1]));

    let report = engine.delete(&outcome.groups, &[0], &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 2);
    assert!(report.errors.is_empty());

    let remaining = fs::read_to_string(&mbox_path).unwrap();
    assert!(remaining.contains("oldest copy"));
    assert!(!remaining.contains("middle copy"));
    assert!(!remaining.contains("newest copy"));
}

#[test]
fn test_select_policy_keeps_the_chosen_member() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");
    write_resend_mailbox(&mbox_path);
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();

    // Keep the newest copy (sorted index 2) instead of the default.
    let select = |_position: usize, _group: &mail_dedupe::DuplicateGroup| 2usize;
    let report = engine.delete(&outcome.groups, &[0], &KeepPolicy::Select(&select));
    assert_eq!(report.deleted_count, 2);
    assert!(report.errors.is_empty());

    let remaining = fs::read_to_string(&mbox_path).unwrap();
    assert!(remaining.contains("newest copy"));
    assert!(!remaining.contains("oldest copy"));
}

#[test]
fn test_select_policy_out_of_range_falls_back_to_first() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");
    write_resend_mailbox(&mbox_path);
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();

    let select = |_position: usize, _group: &mail_dedupe::DuplicateGroup| 99usize;
    let report = engine.delete(&outcome.groups, &[0], &KeepPolicy::Select(&select));
    assert_eq!(report.deleted_count, 2);

    let remaining = fs::read_to_string(&mbox_path).unwrap();
    assert!(remaining.contains("oldest copy"));
}

#[test]
fn test_invalid_group_indices_are_reported_but_valid_ones_run() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");
    write_resend_mailbox(&mbox_path);
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();

    let report = engine.delete(&outcome.groups, &[7, 0], &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Invalid group index: 7"));
}

#[test]
fn test_unopenable_store_reports_zero_deleted_and_one_error() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");
    write_resend_mailbox(&mbox_path);
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();

    // The mailbox disappears between scan and cleanup.
    fs::remove_file(&mbox_path).unwrap();

    let report = engine.delete(&outcome.groups, &[0], &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Error opening mailbox"));
}

#[test]
fn test_cleanup_spanning_two_stores_flushes_both() {
    let tmp = tempdir().unwrap();
    let inbox_path = tmp.path().join("Inbox");
    let archive_path = tmp.path().join("Archive");
    write_resend_mailbox(&inbox_path);

    let mut archive = String::new();
    for _ in 0..2 {
        push_message(
            &mut archive,
            "<archived-duplicate@example.com>",
            "Thu, 04 Apr 2025 08:00:00 -0400",
            "archive@example.com",
            "Archived Notice",
            "archived body",
        );
    }
    fs::write(&archive_path, archive).unwrap();

    let sources = [
        MailboxSource::new(&inbox_path, "Inbox"),
        MailboxSource::new(&archive_path, "Archive"),
    ];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();
    assert_eq!(outcome.total_groups, 2);

    let all: Vec<usize> = (0..outcome.groups.len()).collect();
    let report = engine.delete(&outcome.groups, &all, &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 3);
    assert!(report.errors.is_empty());

    let rescan = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();
    assert_eq!(rescan.total_groups, 0);
    assert_eq!(rescan.messages_scanned, 2);
}

#[test]
fn test_empty_group_list_reports_nothing_to_delete() {
    let tmp = tempdir().unwrap();
    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();

    let report = engine.delete(&[], &[0], &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 0);
    assert_eq!(report.errors, vec!["No duplicates to delete".to_string()]);
}
