//! Append-only request log file.
//!
//! All mutation happens under one mutex so an append and a later patch of the
//! same record cannot interleave with other writers. `append` hands back a
//! [`RecordHandle`] naming the line it wrote; `patch` reacquires the lock and
//! rewrites exactly that line. Records are never removed one by one, so a line
//! index stays valid until the next `clear`, which bumps the generation and
//! turns older handles into no-ops.
//!
//! The store remembers the file length it last left behind. A different length
//! on the next operation means someone else touched the file: lines are
//! recounted (and a partial tail terminated), and a shorter file also retires
//! outstanding handles.
//!
//! Lines are handled as bytes. A line that is not valid UTF-8 is read back
//! lossily (the parser then drops it) and written back untouched by patches.
//! Patches rewrite the whole file through a temp file + rename, so readers
//! never observe a half-written log.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, ReqLogError};

/// Permission bits for newly created log files.
pub const LOG_FILE_MODE: u32 = 0o644;

/// Identifies one appended line until the store is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHandle {
    line: usize,
    generation: u64,
}

impl RecordHandle {
    /// Zero-based line index in the log file.
    pub fn line(&self) -> usize {
        self.line
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Complete lines currently in the file; `None` until (re)counted.
    lines: Option<usize>,
    /// File length after our last write; only meaningful with `lines`.
    len: u64,
    generation: u64,
}

impl StoreState {
    /// Reconcile the cached view with the file's current length.
    fn observe(&mut self, file_len: Option<u64>) {
        let Some(known) = self.lines.map(|_| self.len) else {
            return;
        };
        match file_len {
            Some(len) if len == known => {}
            Some(len) if len > known => self.lines = None,
            // Shrunk or deleted: earlier line indexes may now name other records.
            _ => {
                self.lines = None;
                self.generation += 1;
            }
        }
    }
}

/// File-backed, single-writer line store.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line (a trailing `\n` is added if missing).
    ///
    /// Creates the file with mode `0644` when absent. A partial last line left
    /// behind by an interrupted write is terminated first so the new record
    /// always starts on its own line.
    pub fn append(&self, line: &str) -> Result<RecordHandle> {
        let mut state = self.lock()?;
        state.observe(self.file_len());

        let mut file = open_for_append(&self.path).map_err(io_failure)?;
        let lines = match state.lines {
            Some(n) => n,
            None => count_and_repair(&mut file).map_err(io_failure)?,
        };

        let mut buf = line.to_string();
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        let written = file
            .write_all(buf.as_bytes())
            .and_then(|()| file.metadata())
            .map(|m| m.len());
        match written {
            Ok(len) => {
                state.lines = Some(lines + 1);
                state.len = len;
            }
            Err(e) => {
                // A short write may have left a partial tail; recount next time.
                state.lines = None;
                return Err(io_failure(e));
            }
        }

        Ok(RecordHandle {
            line: lines,
            generation: state.generation,
        })
    }

    /// Rewrite the line named by `handle`.
    ///
    /// Returns `Ok(false)` without touching the file when the store was cleared
    /// (or the file shrank) after the handle was issued, or the line is gone.
    pub fn patch<F>(&self, handle: RecordHandle, transform: F) -> Result<bool>
    where
        F: FnOnce(&str) -> String,
    {
        let mut state = self.lock()?;
        state.observe(self.file_len());
        if handle.generation != state.generation {
            tracing::debug!(line = handle.line, "patch skipped: log cleared since append");
            return Ok(false);
        }
        self.rewrite_line(&mut state, |n| (handle.line < n).then_some(handle.line), transform)
    }

    /// Rewrite the last line of the log. No-op on an empty or missing file.
    pub fn patch_last_line<F>(&self, transform: F) -> Result<bool>
    where
        F: FnOnce(&str) -> String,
    {
        let mut state = self.lock()?;
        state.observe(self.file_len());
        self.rewrite_line(&mut state, |n| n.checked_sub(1), transform)
    }

    /// Truncate the log to empty, creating it if needed. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        open_with_mode(&mut opts, &self.path).map_err(io_failure)?;
        state.lines = Some(0);
        state.len = 0;
        state.generation += 1;
        Ok(())
    }

    /// All lines in file order, without their trailing newline.
    ///
    /// Invalid UTF-8 is replaced lossily so one corrupt line cannot hide the
    /// rest of the log. Fails with `ReqLogError::NotFound` when the file does
    /// not exist.
    pub fn read_all(&self) -> Result<Vec<String>> {
        let _state = self.lock()?;
        let bytes = fs::read(&self.path)?;
        Ok(split_lines(&bytes)
            .map(|l| {
                let l = l.strip_suffix(b"\n").unwrap_or(l);
                let l = l.strip_suffix(b"\r").unwrap_or(l);
                String::from_utf8_lossy(l).into_owned()
            })
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| ReqLogError::Internal("log store lock poisoned".into()))
    }

    fn file_len(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// `<file name>.tmp` next to the log.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("request-log"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn rewrite_line<P, F>(&self, state: &mut StoreState, pick: P, transform: F) -> Result<bool>
    where
        P: FnOnce(usize) -> Option<usize>,
        F: FnOnce(&str) -> String,
    {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(io_failure(e)),
        };

        let lines: Vec<&[u8]> = split_lines(&bytes).collect();
        let Some(idx) = pick(lines.len()) else {
            return Ok(false);
        };

        let original = lines[idx];
        let (body, newline) = match original.strip_suffix(b"\n") {
            Some(body) => (body, "\n"),
            None => (original, ""),
        };
        let mut patched = transform(&String::from_utf8_lossy(body));
        patched.retain(|c| c != '\n' && c != '\r');
        patched.push_str(newline);

        let tmp = self.tmp_path();
        let written = write_replacing(&tmp, &self.path, &lines, idx, patched.as_bytes());
        let len = match written {
            Ok(len) => len,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(io_failure(e));
            }
        };

        let complete = lines.last().map_or(true, |l| l.ends_with(b"\n"));
        state.lines = complete.then_some(lines.len());
        state.len = len;
        Ok(true)
    }
}

fn io_failure(e: std::io::Error) -> ReqLogError {
    ReqLogError::Io(e.to_string())
}

/// Lines including their trailing `\n` (the last one may lack it).
fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes
        .split_inclusive(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
}

/// Write `lines` to `tmp` with line `idx` swapped for `patched`, then move it over `dest`.
fn write_replacing(
    tmp: &Path,
    dest: &Path,
    lines: &[&[u8]],
    idx: usize,
    patched: &[u8],
) -> std::io::Result<u64> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    let mut out = open_with_mode(&mut opts, tmp)?;
    let mut len = 0u64;
    for (i, l) in lines.iter().enumerate() {
        let l = if i == idx { patched } else { *l };
        out.write_all(l)?;
        len += l.len() as u64;
    }
    out.sync_data()?;
    fs::rename(tmp, dest)?;
    Ok(len)
}

fn open_for_append(path: &Path) -> std::io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.read(true).append(true).create(true);
    open_with_mode(&mut opts, path)
}

#[cfg(unix)]
fn open_with_mode(opts: &mut OpenOptions, path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    opts.mode(LOG_FILE_MODE).open(path)
}

#[cfg(not(unix))]
fn open_with_mode(opts: &mut OpenOptions, path: &Path) -> std::io::Result<File> {
    opts.open(path)
}

/// Count complete lines, terminating a trailing partial line if present.
fn count_and_repair(file: &mut File) -> std::io::Result<usize> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let mut lines = bytes.iter().filter(|&&b| b == b'\n').count();
    if bytes.last().is_some_and(|&b| b != b'\n') {
        file.write_all(b"\n")?;
        lines += 1;
    }
    Ok(lines)
}
