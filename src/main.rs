mod commands;
mod console;
mod logging;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use commands::{Cli, Commands, ListArgs, ScanArgs};
use console::CliReporter;
use dotenv::dotenv;
use mail_dedupe::{demo, discover, AppConfig, HashCache, KeepPolicy, MailboxSource, ScanEngine};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match mail_dedupe::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan(scan_args)) => {
            if let Err(err) = run_scan(&config, scan_args) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::ListFolders(list_args)) => {
            if let Err(err) = run_list_folders(&config, list_args) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::CountHashCache) => {
            info!("Counting hash cache keys...");
            match HashCache::open(&config.cache_path).and_then(|cache| cache.count_keys()) {
                Ok(count) => println!("Total keys in hash cache: {}", count),
                Err(err) => error!("Error counting cache keys: {}", err),
            }
        }
        Some(Commands::ClearHashCache) => {
            match console::prompt_confirm(
                "Are you SURE you want to clear the entire hash cache?",
                Some(false),
            ) {
                Ok(true) => match HashCache::open(&config.cache_path)
                    .and_then(|cache| cache.clear_all())
                {
                    Ok(()) => println!("Hash cache cleared"),
                    Err(err) => error!("Error clearing hash cache: {}", err),
                },
                _ => {
                    process::exit(0);
                }
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn resolve_sources(config: &AppConfig, paths: &[String]) -> Vec<MailboxSource> {
    let roots = if paths.is_empty() {
        config.root_paths.clone()
    } else {
        paths.to_vec()
    };
    discover::discover_sources(&roots, &config.ignore_patterns)
}

fn run_list_folders(config: &AppConfig, args: ListArgs) -> anyhow::Result<()> {
    let sources = resolve_sources(config, &args.paths);
    if sources.is_empty() {
        bail!("No mail folders found. Specify a path or configure root_paths.");
    }
    println!("Found {} mail folders:", sources.len());
    for (i, source) in sources.iter().enumerate() {
        println!("  {}. {}", i + 1, source.display_name);
    }
    Ok(())
}

fn run_scan(config: &AppConfig, args: ScanArgs) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    let config = &config;

    let method = match args.criteria {
        Some(method) => method,
        None => config
            .criteria
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("invalid criteria in configuration")?,
    };

    let mut demo_dir: Option<PathBuf> = None;
    let sources = if args.demo {
        println!("Running in demo mode with test emails...");
        let dir = std::env::temp_dir().join(format!("mail-dedupe-demo-{}", process::id()));
        let sources = demo::create_demo_mailboxes(&dir)?;
        demo_dir = Some(dir);
        sources
    } else {
        resolve_sources(config, &args.paths)
    };

    if sources.is_empty() {
        bail!("No mail folders found. Specify a path or configure root_paths.");
    }

    println!("Found {} mail folders:", sources.len());
    for (i, source) in sources.iter().enumerate() {
        println!("  {}. {}", i + 1, source.display_name);
    }
    println!();
    println!("Duplicate detection criteria: {}", method);

    let engine = ScanEngine::new(config.clone())?;
    let reporter = CliReporter::new();
    let outcome = engine.scan(&sources, method, &reporter)?;

    println!();
    console::print_outcome(&outcome);

    if let Some(csv_path) = &args.export_csv {
        console::export_groups_csv(&outcome.groups, csv_path)?;
        println!("Report written to {}", csv_path);
    }

    if !outcome.groups.is_empty() {
        let all_groups: Vec<usize> = (0..outcome.groups.len()).collect();

        if args.auto_clean {
            println!("Auto-cleaning duplicates...");
            let report = engine.delete(&outcome.groups, &all_groups, &KeepPolicy::KeepFirst);
            console::print_deletion_report(&report);
        } else if args.interactive
            && console::prompt_confirm("Delete duplicates from these folders?", Some(false))?
        {
            let select = |position: usize, group: &mail_dedupe::DuplicateGroup| {
                console::prompt_keep_index(position, group)
            };
            let report = engine.delete(&outcome.groups, &all_groups, &KeepPolicy::Select(&select));
            console::print_deletion_report(&report);
        }
    }

    if let Some(dir) = demo_dir {
        if let Err(err) = fs::remove_dir_all(&dir) {
            info!("Could not clean up demo directory {}: {}", dir.display(), err);
        }
    }

    Ok(())
}
