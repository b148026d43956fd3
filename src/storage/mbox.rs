use crate::error::Error;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Locator for one message inside its owning store. Opaque to everything
/// outside this module; only valid against the store that produced it and
/// only until that store is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey(usize);

#[derive(Debug, Clone, Copy)]
struct Span {
    /// Offset of the "From " envelope line.
    envelope_start: u64,
    /// Offset of the first header byte, just past the envelope line.
    body_start: u64,
    end: u64,
}

/// A classic mbox file: messages delimited by "From " lines at the start of
/// the file or after a blank line. Supports sequential iteration, random
/// lookup by key and in-place removal with a single durable flush that
/// rewrites the file through a temp sibling and atomic rename.
pub struct MboxStore {
    path: PathBuf,
    file: File,
    spans: Vec<Span>,
    removed: HashSet<usize>,
}

impl MboxStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            Error::Mailbox(format!("cannot open mailbox {}: {}", path.display(), e))
        })?;
        let spans = index_spans(&path, &file)?;
        debug!("Indexed {} messages in {}", spans.len(), path.display());
        Ok(Self {
            path,
            file,
            spans,
            removed: HashSet::new(),
        })
    }

    /// Number of messages currently in the store, removals included until
    /// the next flush.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = MessageKey> + '_ {
        (0..self.spans.len()).map(MessageKey)
    }

    /// Raw message bytes (headers and body, without the envelope line).
    pub fn read(&self, key: MessageKey) -> Result<Vec<u8>, Error> {
        let span = self
            .spans
            .get(key.0)
            .ok_or_else(|| Error::Mailbox(format!("no message with key {}", key.0)))?;
        let mut file = &self.file;
        file.seek(SeekFrom::Start(span.body_start))?;
        let len = (span.end - span.body_start) as usize;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Mark a message for removal. Takes effect on `flush`.
    pub fn remove(&mut self, key: MessageKey) -> Result<(), Error> {
        if key.0 >= self.spans.len() {
            return Err(Error::Mailbox(format!("no message with key {}", key.0)));
        }
        if !self.removed.insert(key.0) {
            return Err(Error::Mailbox(format!(
                "message {} already removed",
                key.0
            )));
        }
        trace!("Marked message {} for removal", key.0);
        Ok(())
    }

    /// Rewrite the file without the removed messages. Surviving messages are
    /// preserved byte-for-byte. One temp-file write plus an atomic rename;
    /// the store re-indexes itself afterwards so the handle stays usable.
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.removed.is_empty() {
            return Ok(());
        }

        let tmp_path = PathBuf::from(format!("{}.tmp", self.path.display()));
        {
            let mut src = &self.file;
            let mut out = File::create(&tmp_path)?;
            for (idx, span) in self.spans.iter().enumerate() {
                if self.removed.contains(&idx) {
                    continue;
                }
                src.seek(SeekFrom::Start(span.envelope_start))?;
                let mut chunk = src.take(span.end - span.envelope_start);
                io::copy(&mut chunk, &mut out)?;
            }
            out.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            "Flushed {}: {} messages removed",
            self.path.display(),
            self.removed.len()
        );

        self.file = File::open(&self.path)?;
        self.spans = index_spans(&self.path, &self.file)?;
        self.removed.clear();
        Ok(())
    }
}

/// Scan for "From " envelope lines. A separator only counts at the start of
/// the file or right after a blank line, which keeps "From " quoting inside
/// bodies from splitting a message.
fn index_spans(path: &Path, file: &File) -> Result<Vec<Span>, Error> {
    let file_len = file.metadata()?.len();
    let mut file = file;
    file.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(file);
    let mut spans: Vec<Span> = Vec::new();
    let mut line = Vec::new();
    let mut offset: u64 = 0;
    let mut prev_blank = true;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        if prev_blank && line.starts_with(b"From ") {
            let body_start = offset + read as u64;
            if let Some(last) = spans.last_mut() {
                last.end = offset;
            }
            spans.push(Span {
                envelope_start: offset,
                body_start,
                end: file_len,
            });
        }
        prev_blank = line == b"\n" || line == b"\r\n";
        offset += read as u64;
    }

    if spans.is_empty() && file_len > 0 {
        return Err(Error::Mailbox(format!(
            "{} is not an mbox file (no 'From ' separator found)",
            path.display()
        )));
    }
    Ok(spans)
}
