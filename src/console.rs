use colored::*;
use dashmap::DashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mail_dedupe::{DeletionReport, DuplicateGroup, ProgressReporter, ScanOutcome};
use std::io::{self, Write};
use std::time::Duration;

/// CLI progress reporter: one indicatif bar per source, attached to a
/// shared `MultiProgress` because sources scan concurrently.
pub struct CliReporter {
    multi: MultiProgress,
    bars: DashMap<String, ProgressBar>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: DashMap::new(),
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_source_start(&self, source: &str, total_messages: usize) {
        let pb = self.multi.add(ProgressBar::new(total_messages as u64));
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} messages",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(source.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.bars.insert(source.to_string(), pb);
    }

    fn on_chunk(&self, source: &str, processed: usize, _total_messages: usize) {
        if let Some(pb) = self.bars.get(source) {
            pb.set_position(processed as u64);
        }
    }

    fn on_source_complete(&self, source: &str, messages: usize, duration_secs: f64) {
        if let Some((_, pb)) = self.bars.remove(source) {
            pb.finish_and_clear();
        }
        eprintln!(
            "  \x1b[32m✓\x1b[0m {}: {} messages in {:.2}s",
            source, messages, duration_secs
        );
    }

    fn on_scan_complete(&self, groups: usize, redundant: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} duplicate groups ({} redundant messages) in {:.2}s",
            groups, redundant, duration_secs
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn format_date(record: &mail_dedupe::MessageRecord) -> String {
    match record
        .date_ts
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
    {
        Some(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        None => record.date.clone(),
    }
}

pub fn print_outcome(outcome: &ScanOutcome) {
    if outcome.groups.is_empty() {
        println!("{}", "No duplicate emails found.".yellow());
    } else {
        println!(
            "Found {} duplicate groups ({} duplicate emails)",
            format!("{}", outcome.total_groups).red(),
            format!("{}", outcome.total_redundant_messages).red(),
        );
        println!();

        for (i, group) in outcome.groups.iter().enumerate() {
            println!("Duplicate Group {} ({} emails)", i + 1, group.len());
            println!("{}", "-".repeat(80));
            for (j, member) in group.members.iter().enumerate() {
                let marker = if j == 0 { " (original)" } else { "" };
                println!("{}.{}", j + 1, marker);
                println!("   Date: {}", format_date(member));
                println!("   From: {}", truncate(&member.from, 40));
                println!("   Subject: {}", truncate(&member.subject, 60));
                println!("   Folder: {}", member.folder_label);
            }
            println!();
        }
    }

    if !outcome.source_errors.is_empty() {
        println!("{}", "Some folders could not be scanned:".yellow());
        for err in &outcome.source_errors {
            println!("  - {}: {}", err.display_name, err.message);
        }
    }

    println!(
        "Scanned {} messages, {} served from cache, in {}",
        outcome.messages_scanned,
        outcome.cache_hits,
        format!("{:.2}s", outcome.scan_duration.as_secs_f64()).green(),
    );
}

pub fn print_deletion_report(report: &DeletionReport) {
    println!(
        "Deleted {} duplicate emails",
        format!("{}", report.deleted_count).green()
    );
    if !report.errors.is_empty() {
        println!("{}", "Some errors occurred during deletion:".yellow());
        for error in report.errors.iter().take(5) {
            println!("  - {}", error);
        }
        if report.errors.len() > 5 {
            println!("  ... and {} more errors", report.errors.len() - 5);
        }
    }
}

/// Ask per group which member to keep. 1-based input, defaults to the
/// first (earliest) message on empty or invalid input.
pub fn prompt_keep_index(position: usize, group: &DuplicateGroup) -> usize {
    println!();
    println!("Duplicate Group {} ({} emails)", position + 1, group.len());
    println!("{}", "-".repeat(80));
    for (j, member) in group.members.iter().enumerate() {
        let marker = if j == 0 { " (suggested to keep)" } else { "" };
        println!("{}{}", j + 1, marker);
        println!("   Date: {}", format_date(member));
        println!("   From: {}", truncate(&member.from, 40));
        println!("   Subject: {}", truncate(&member.subject, 60));
    }

    print!("Enter the index of the email to keep (default: 1): ");
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return 0;
    }
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= group.len() => n - 1,
        _ => {
            if !input.trim().is_empty() {
                println!("{}", "Invalid index, keeping the first email".red());
            }
            0
        }
    }
}

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Flat CSV export of the duplicate report, one row per group member.
pub fn export_groups_csv(groups: &[DuplicateGroup], path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["group", "digest", "date", "from", "subject", "folder", "size"])?;
    for (i, group) in groups.iter().enumerate() {
        for member in &group.members {
            writer.write_record([
                (i + 1).to_string(),
                format!("{:016x}", group.digest),
                format_date(member),
                member.from.clone(),
                member.subject.clone(),
                member.folder_label.clone(),
                member.size.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
