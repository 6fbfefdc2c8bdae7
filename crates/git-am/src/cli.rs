//! Command-line surface: `git-am [--patch-format=mbox] [<mbox>|<Maildir>...]`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "git-am", about = "Apply a series of patches from a mailbox")]
pub struct Cli {
    /// Format the patches are in; only "mbox" is recognized.
    #[arg(long = "patch-format")]
    pub patch_format: Option<String>,

    /// Mbox files or Maildirs to read patches from. With none given, and no
    /// session already in progress, patches are read from standard input.
    pub paths: Vec<String>,
}
