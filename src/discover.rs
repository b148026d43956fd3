use crate::model::MailboxSource;
use glob::Pattern;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, error};

/// File extensions that are never mailboxes, skipped without sniffing.
const NON_MAIL_EXTENSIONS: &[&str] = &[
    "msf", "html", "xhtml", "txt", "js", "json", "css", "dat", "sqlite", "log",
];

/// Walk the given roots and surface every mbox file found as a source
/// descriptor, filtering by glob ignore patterns.
///
/// A root that is itself a file is taken as a single source. Unreadable
/// directories are logged and skipped. The result is sorted by path so
/// repeated discovery over unchanged trees is deterministic.
pub fn discover_sources(root_paths: &[String], ignore_globs: &[String]) -> Vec<MailboxSource> {
    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let mut sources = Vec::new();
    for root in root_paths {
        let root_path = Path::new(root);
        if root_path.is_file() {
            let label = root_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.clone());
            sources.push(MailboxSource::new(root_path, label));
            continue;
        }

        let label = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.clone());
        visit_dir(root_path, root_path, &label, &ignore_patterns, &mut sources);
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Discovered {} mailbox file(s)", sources.len());
    sources
}

fn visit_dir(
    dir: &Path,
    root: &Path,
    label: &str,
    ignore_patterns: &[Pattern],
    out: &mut Vec<MailboxSource>,
) {
    if ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(dir))
    {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            error!("Error reading directory {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                error!("Error getting metadata for {}: {}", path.display(), err);
                continue;
            }
        };

        if path.is_dir() {
            visit_dir(&path, root, label, ignore_patterns, out);
        } else if !metadata.file_type().is_symlink() && metadata.len() > 0 {
            if ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
            {
                continue;
            }
            if looks_like_mbox(&path) {
                out.push(MailboxSource::new(&path, display_name(root, label, &path)));
            }
        }
    }
}

/// `.mbox` is taken at face value; extensionless files (and the classic
/// INBOX name) are sniffed for the "From " separator.
fn looks_like_mbox(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("mbox") => true,
        Some(ext) if NON_MAIL_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => false,
        Some(_) => false,
        None => starts_with_from(path),
    }
}

fn starts_with_from(path: &Path) -> bool {
    let mut buffer = [0u8; 5];
    match File::open(path).and_then(|mut f| f.read_exact(&mut buffer).map(|_| buffer)) {
        Ok(head) => &head == b"From ",
        Err(_) => false,
    }
}

fn display_name(root: &Path, label: &str, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => {
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            format!("{}/{}", label, rel)
        }
        Err(_) => format!("{}/{}", label, path.display()),
    }
}
