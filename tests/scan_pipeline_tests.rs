use std::fs;
use std::path::Path;
use tempfile::tempdir;

use mail_dedupe::{
    demo, AppConfig, Error, HashMethod, KeepPolicy, MailboxSource, ScanEngine, SilentReporter,
};

fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        cache_path: dir.join("cache.db").to_string_lossy().into_owned(),
        // Small chunks so multi-chunk iteration is exercised even by tiny
        // fixtures.
        chunk_size: 2,
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

/// The six-message demo scenario: Inbox holds two team-meeting duplicates
/// and three company-picnic duplicates, Sent holds one unique message.
#[test]
fn test_demo_scenario_groups_and_cleanup() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();

    assert!(outcome.source_errors.is_empty());
    assert_eq!(outcome.total_groups, 2);
    assert_eq!(outcome.total_redundant_messages, 3);
    assert_eq!(outcome.messages_scanned, 6);

    // Worst offenders first: the picnic group (3) before the meeting group (2).
    assert_eq!(outcome.groups[0].len(), 3);
    assert_eq!(outcome.groups[1].len(), 2);
    assert_eq!(
        outcome.groups[0].members[0].message_id,
        "<company-picnic-duplicate@example.com>"
    );
    assert_eq!(
        outcome.groups[1].members[0].message_id,
        "<team-meeting-duplicate@example.com>"
    );

    let report = engine.delete(&outcome.groups, &[0, 1], &KeepPolicy::KeepFirst);
    assert_eq!(report.deleted_count, 3);
    assert!(report.errors.is_empty(), "unexpected: {:?}", report.errors);

    // One representative of each group survives, the unique message is
    // untouched.
    let rescan = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    assert_eq!(rescan.total_groups, 0);
    assert_eq!(rescan.messages_scanned, 3);
}

#[test]
fn test_repeated_scans_are_deterministic() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let first = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    let second = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();

    assert_eq!(first.total_groups, second.total_groups);
    for (a, b) in first.groups.iter().zip(second.groups.iter()) {
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.len(), b.len());
        for (ma, mb) in a.members.iter().zip(b.members.iter()) {
            assert_eq!(ma.message_id, mb.message_id);
            assert_eq!(ma.subject, mb.subject);
        }
    }
}

#[test]
fn test_second_scan_is_served_from_cache() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let first = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    // Duplicates share the cache key of their first member, so the three
    // redundant messages already hit within the first pass.
    assert_eq!(first.cache_hits, 3);

    let second = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    assert_eq!(second.cache_hits, second.messages_scanned);
    assert_eq!(first.total_groups, second.total_groups);
}

#[test]
fn test_clear_cache_forces_recomputation() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    assert!(engine.cache().count_keys().unwrap() > 0);

    engine.clear_cache().unwrap();
    assert_eq!(engine.cache().count_keys().unwrap(), 0);

    // Back to square one: only the intra-scan duplicate hits remain.
    let rescan = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    assert_eq!(rescan.cache_hits, 3);
}

#[test]
fn test_single_corrupted_source_does_not_poison_the_rest() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let mut sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let corrupt_path = mail_dir.join("Broken");
    fs::write(&corrupt_path, "this is not an mbox file\n").unwrap();
    sources.push(MailboxSource::new(&corrupt_path, "Demo/Broken"));

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.source_errors.len(), 1);
    assert_eq!(outcome.source_errors[0].display_name, "Demo/Broken");
    // The valid folders still produce full results.
    assert_eq!(outcome.total_groups, 2);
    assert_eq!(outcome.total_redundant_messages, 3);
}

#[test]
fn test_zero_duplicates_is_a_successful_empty_result() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");

    let mut mbox = String::new();
    push_message(
        &mut mbox,
        "<one@example.com>",
        "Mon, 01 Apr 2025 10:00:00 -0400",
        "a@example.com",
        "first",
        "body one",
    );
    push_message(
        &mut mbox,
        "<two@example.com>",
        "Mon, 01 Apr 2025 11:00:00 -0400",
        "b@example.com",
        "second",
        "body two",
    );
    fs::write(&mbox_path, mbox).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(
            &[MailboxSource::new(&mbox_path, "Inbox")],
            HashMethod::Strict,
            &SilentReporter,
        )
        .unwrap();

    assert!(outcome.groups.is_empty());
    assert!(outcome.source_errors.is_empty());
    assert_eq!(outcome.total_redundant_messages, 0);
    assert_eq!(outcome.messages_scanned, 2);
}

#[test]
fn test_criteria_change_regroups_the_same_messages() {
    let tmp = tempdir().unwrap();
    let mbox_path = tmp.path().join("Inbox");

    // Same subject and sender, different ids, dates and bodies: duplicates
    // under subject-sender only.
    let mut mbox = String::new();
    for (i, body) in ["first body", "second body"].iter().enumerate() {
        push_message(
            &mut mbox,
            &format!("<resend-{}@example.com>", i),
            &format!("Mon, 01 Apr 2025 1{}:00:00 -0400", i),
            "newsletter@example.com",
            "Monthly Digest",
            body,
        );
    }
    fs::write(&mbox_path, mbox).unwrap();
    let sources = [MailboxSource::new(&mbox_path, "Inbox")];

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();

    let strict = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();
    assert_eq!(strict.total_groups, 0);

    let coarse = engine
        .scan(&sources, HashMethod::SubjectSender, &SilentReporter)
        .unwrap();
    assert_eq!(coarse.total_groups, 1);
    assert_eq!(coarse.groups[0].len(), 2);
}

#[test]
fn test_get_content_and_invalid_selection() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();
    let outcome = engine
        .scan(&sources, HashMethod::Strict, &SilentReporter)
        .unwrap();

    let content = engine.get_content(&outcome.groups, 0, 0).unwrap();
    let subject = content
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Subject"))
        .map(|(_, value)| value.clone());
    assert_eq!(subject.as_deref(), Some("Invitation: Company Picnic"));
    assert!(!content.body_parts.is_empty());
    assert!(content.body_parts[0].text.contains("company picnic"));
    assert!(content.body_parts[0].content_type.starts_with("text/"));

    assert!(matches!(
        engine.get_content(&outcome.groups, 99, 0),
        Err(Error::InvalidSelection(_))
    ));
    assert!(matches!(
        engine.get_content(&outcome.groups, 0, 99),
        Err(Error::InvalidSelection(_))
    ));
}

#[test]
fn test_cancellation_token_stops_the_scan() {
    let tmp = tempdir().unwrap();
    let mail_dir = tmp.path().join("mail");
    let sources = demo::create_demo_mailboxes(&mail_dir).unwrap();

    let engine = ScanEngine::new(test_config(tmp.path())).unwrap();

    // scan() resets the token at start, so cancel from another thread once
    // it is underway.
    let cancel_token = engine.cancel_token();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(1));
        cancel_token.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    let result = engine.scan(&sources, HashMethod::Strict, &SilentReporter);
    handle.join().unwrap();

    // Tiny fixtures may finish before the cancel lands; either outcome is
    // acceptable, anything else is a bug.
    match result {
        Ok(_) => {}
        Err(Error::Cancelled) => {}
        Err(other) => panic!("Unexpected error: {:?}", other),
    }
}
