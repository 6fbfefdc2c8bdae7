//! Session State Machine (component G) layered over the Session Store
//! (component A): `None → Live → None`, with `cur`/`last`/authorship/message
//! as the in-memory mirror of on-disk state described in the data model.

pub mod store;

use std::path::{Path, PathBuf};

use crate::authscript::{self, AuthorTriple};
use crate::detect::PatchFormat;
use crate::error::{AmError, Result};
use crate::external::ExternalTool;
use crate::split;
use store::SessionStore;

/// Fixed width used to render patch numbers as zero-padded filenames.
const PREC: usize = 4;

pub struct Session {
    store: SessionStore,
    repo_root: PathBuf,
    cur: u32,
    last: u32,
    prec: usize,
    author: Option<AuthorTriple>,
    msg: Option<Vec<u8>>,
}

impl Session {
    pub fn new(dir: impl Into<PathBuf>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            store: SessionStore::new(dir),
            repo_root: repo_root.into(),
            cur: 0,
            last: 0,
            prec: PREC,
            author: None,
            msg: None,
        }
    }

    #[doc(hidden)]
    pub fn for_testing(dir: impl Into<PathBuf>, repo_root: impl Into<PathBuf>) -> Self {
        Self::new(dir, repo_root)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn cur(&self) -> u32 {
        self.cur
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn prec(&self) -> usize {
        self.prec
    }

    pub fn author(&self) -> Option<&AuthorTriple> {
        self.author.as_ref()
    }

    pub fn msg(&self) -> Option<&[u8]> {
        self.msg.as_deref()
    }

    pub fn set_parsed(&mut self, author: AuthorTriple, msg: Vec<u8>) {
        self.author = Some(author);
        self.msg = Some(msg);
    }

    /// A session exists iff the directory exists and both `next` and
    /// `last` are regular files directly inside it.
    pub fn in_progress(dir: impl AsRef<Path>) -> bool {
        let store = SessionStore::new(dir.as_ref());
        store.exists() && store.file_exists("last") && store.file_exists("next")
    }

    /// Patch filename for `cur`: `prec`-digit zero-padded decimal.
    pub fn msgnum(&self) -> String {
        format!("{:0width$}", self.cur, width = self.prec)
    }

    pub fn mail_path(&self) -> PathBuf {
        self.store.path_of(&self.msgnum())
    }

    /// Set up a brand new session: create the directory, split the inputs
    /// into numbered message files, then commit the session as live by
    /// writing `last` and finally `next` (the commit point — see the data
    /// model invariant that `next`'s existence is what makes a session
    /// externally observable as in-progress).
    pub fn setup(
        &mut self,
        tool: &dyn ExternalTool,
        format: PatchFormat,
        paths: &[String],
    ) -> Result<()> {
        if format != PatchFormat::Mbox {
            return Err(AmError::DetectionFailure);
        }

        self.store.create_dir()?;

        let last = match split::split_mail(tool, &self.store, self.prec, paths) {
            Ok(last) => last,
            Err(e) => {
                self.store.remove_directory_recursively()?;
                return Err(e);
            }
        };

        self.cur = 1;
        self.last = last;

        self.store
            .write_file("last", self.last.to_string().as_bytes())?;
        self.store
            .write_file("next", self.cur.to_string().as_bytes())?;

        Ok(())
    }

    /// Load an in-progress session's state from disk.
    pub fn load(&mut self) -> Result<()> {
        let next = self
            .store
            .read_file("next", true)?
            .ok_or_else(|| AmError::Bug("state file 'next' does not exist".into()))?;
        self.cur = parse_u32(&next)?;

        let last = self
            .store
            .read_file("last", true)?
            .ok_or_else(|| AmError::Bug("state file 'last' does not exist".into()))?;
        self.last = parse_u32(&last)?;

        self.author = authscript::read_author_script(&self.store)?;
        self.msg = self.store.read_file("final-commit", false)?;

        Ok(())
    }

    /// Free the current patch's in-memory authorship/message, delete the
    /// corresponding scratch files, then bump `cur` and persist it.
    ///
    /// Order is load-bearing: scratch is deleted *before* `next` is
    /// rewritten, so a crash right after the bump can never make the next
    /// iteration observe stale authorship left over from this one.
    pub fn advance(&mut self) -> Result<()> {
        self.author = None;
        self.msg = None;

        self.store.remove_file("author-script")?;
        self.store.remove_file("final-commit")?;

        self.cur += 1;
        self.store
            .write_file("next", self.cur.to_string().as_bytes())?;

        Ok(())
    }

    /// Recursively remove the session directory, ending the run.
    pub fn destroy(&self) -> Result<()> {
        self.store.remove_directory_recursively()
    }
}

fn parse_u32(bytes: &[u8]) -> Result<u32> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| AmError::Bug(format!("non-numeric state file contents: {bytes:?}")))
}
