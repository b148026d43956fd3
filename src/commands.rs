use clap::{Args, Parser, Subcommand};
use mail_dedupe::HashMethod;

#[derive(Debug, Parser)]
#[command(name = "mail-dedupe")]
#[command(about = "Find and remove duplicate emails in mbox mailboxes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan mailboxes for duplicates, optionally cleaning them
    Scan(ScanArgs),
    /// List the mailbox files that would be scanned, then exit
    ListFolders(ListArgs),
    /// Display the number of keys in the hash cache
    CountHashCache,
    /// Delete every entry in the hash cache
    ClearHashCache,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Mailbox files or directories to scan (default: configured root paths)
    pub paths: Vec<String>,

    /// Duplicate detection criteria: strict, content, headers or
    /// subject-sender (default: configured criteria)
    #[arg(long)]
    pub criteria: Option<HashMethod>,

    /// Delete duplicates automatically, keeping the earliest message of
    /// each group
    #[arg(long)]
    pub auto_clean: bool,

    /// Ask per group which message to keep before deleting
    #[arg(long, conflicts_with = "auto_clean")]
    pub interactive: bool,

    /// Write the duplicate report to a CSV file
    #[arg(long)]
    pub export_csv: Option<String>,

    /// Maximum number of worker threads (default: configured max_workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Messages per scan chunk (default: configured chunk_size)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Build a temporary demo mailbox pair and scan that instead
    #[arg(long)]
    pub demo: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Directories to search for mailbox files (default: configured root
    /// paths)
    pub paths: Vec<String>,
}
