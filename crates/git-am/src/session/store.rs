//! Session Store (component A): read/write/remove files inside a session
//! directory with the atomic-write discipline the spec requires.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{AmError, Result};

/// One session directory (`rebase-apply` under the repository's control
/// directory). Knows nothing about session *semantics* (cur/last/etc.);
/// that's layered on top in `session::Session`. This type only knows how
/// to read, write, and remove files relative to its root, distinguishing
/// "file does not exist" from a genuine I/O error.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Create the directory if it does not already exist. Idempotent
    /// against a concurrent/leftover directory from a previous failed
    /// setup, matching `mkdir` + ignore-EEXIST in the original.
    pub fn create_dir(&self) -> Result<()> {
        match fs::create_dir(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(io_err(&self.dir, e)),
        }
    }

    /// Read `name` from the session directory. Returns `Ok(None)` if the
    /// file does not exist (the expected, non-fatal case); any other I/O
    /// error is fatal. If `trim` is set, trailing ASCII whitespace
    /// (including a trailing newline) is stripped.
    pub fn read_file(&self, name: &str, trim: bool) -> Result<Option<Vec<u8>>> {
        let path = self.path_of(name);
        match fs::read(&path) {
            Ok(mut bytes) => {
                if trim {
                    while matches!(bytes.last(), Some(b) if b.is_ascii_whitespace()) {
                        bytes.pop();
                    }
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    /// Write `contents` to `name`, replacing any existing file. Uses the
    /// standard create-write-close sequence; the pipeline's crash-safety
    /// comes from the *ordering* of writes across files (see
    /// `Session::advance`), not from per-file atomic rename.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.path_of(name);
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        f.write_all(contents).map_err(|e| io_err(&path, e))?;
        f.sync_all().map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    /// Remove `name` if present; a missing file is not an error.
    pub fn remove_file(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    /// Recursively remove the whole session directory. Not an error if it
    /// is already gone.
    pub fn remove_directory_recursively(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&self.dir, e)),
        }
    }

    /// True if `name` exists as a regular file directly inside this
    /// session directory (used by `am_in_progress`-style detection, which
    /// cares only about presence, not contents).
    pub fn file_exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Open `name` for reading, truncating-and-creating first if it does
    /// not exist already — used when an external tool wants to write
    /// directly into a session-relative file via an inherited fd (e.g.
    /// the mail parser's `info` capture).
    pub fn create_for_write(&self, name: &str) -> Result<File> {
        let path = self.path_of(name);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))
    }
}

fn io_err(path: &Path, source: io::Error) -> AmError {
    AmError::Io {
        path: path.to_path_buf(),
        source,
    }
}
