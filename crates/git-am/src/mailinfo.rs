//! Mail Parser Driver (component E): invokes the external mail parser on
//! one message, harvests authorship + subject + body from its `key: value`
//! stdout, and composes the final commit message.

use std::path::Path;

use bstr::BString;

use crate::error::{AmError, Result};
use crate::external::{ExternalTool, ToolInvocation};
use crate::session::store::SessionStore;

/// One parsed patch's authorship and message, ready to be persisted as
/// `author-script`/`final-commit` (component B) and fed to the applier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMail {
    pub author_name: BString,
    pub author_email: BString,
    pub author_date: BString,
    pub message: Vec<u8>,
}

/// Verdict returned from parsing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    Keep(ParsedMail),
    /// Non-patch housekeeping message (e.g. pine's internal folder data).
    Skip,
}

const INTERNAL_DATA_MARKER: &[u8] = b"Mail System Internal Data";

fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in content.iter().enumerate() {
        if b == b'\n' {
            lines.push(&content[start..i]);
            start = i + 1;
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Strip trailing whitespace on each line, collapse runs of blank lines to
/// a single blank line, and remove leading/trailing blank lines. Mirrors
/// C git's `stripspace()` as used on the composed commit message.
fn normalize_message(input: &[u8]) -> Vec<u8> {
    let mut out_lines: Vec<&[u8]> = Vec::new();
    let mut pending_blank = false;

    for raw in split_lines(input) {
        let mut end = raw.len();
        while end > 0 && (raw[end - 1] == b' ' || raw[end - 1] == b'\t' || raw[end - 1] == b'\r') {
            end -= 1;
        }
        let line = &raw[..end];

        if line.is_empty() {
            if out_lines.is_empty() {
                continue;
            }
            pending_blank = true;
        } else {
            if pending_blank {
                out_lines.push(&[]);
                pending_blank = false;
            }
            out_lines.push(line);
        }
    }

    let mut result = Vec::new();
    for (i, line) in out_lines.iter().enumerate() {
        if i > 0 {
            result.push(b'\n');
        }
        result.extend_from_slice(line);
    }
    if !result.is_empty() {
        result.push(b'\n');
    }
    result
}

/// Parse `mail_path` via the external mail parser, filling in authorship
/// and message, and writing `patch` into the session directory as a side
/// effect of the external tool invocation itself.
pub fn parse_mail(
    tool: &dyn ExternalTool,
    store: &SessionStore,
    mail_path: &Path,
) -> Result<MailOutcome> {
    let mail_bytes = std::fs::read(mail_path).map_err(|e| AmError::Io {
        path: mail_path.to_path_buf(),
        source: e,
    })?;

    let msg_path = store.path_of("msg");
    let patch_path = store.path_of("patch");
    let msg_path_str = msg_path.to_string_lossy();
    let patch_path_str = patch_path.to_string_lossy();
    let invocation = ToolInvocation::new(&["mailinfo", msg_path_str.as_ref(), patch_path_str.as_ref()])
        .with_cwd(store.dir())
        .with_stdin(mail_bytes);

    let output = tool.run(&invocation)?;
    store.write_file("info", &output.stdout)?;

    let mut subject_lines: Vec<&[u8]> = Vec::new();
    let mut author_name: &[u8] = b"";
    let mut author_email: &[u8] = b"";
    let mut author_date: &[u8] = b"";

    for line in split_lines(&output.stdout) {
        if let Some(x) = line.strip_prefix(b"Subject: ".as_slice()) {
            subject_lines.push(x);
        } else if let Some(x) = line.strip_prefix(b"Author: ".as_slice()) {
            author_name = x;
        } else if let Some(x) = line.strip_prefix(b"Email: ".as_slice()) {
            author_email = x;
        } else if let Some(x) = line.strip_prefix(b"Date: ".as_slice()) {
            author_date = x;
        }
    }

    if author_name == INTERNAL_DATA_MARKER {
        return Ok(MailOutcome::Skip);
    }

    let patch_empty = match std::fs::metadata(&patch_path) {
        Ok(m) => m.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            return Err(AmError::Io {
                path: patch_path,
                source: e,
            })
        }
    };
    if patch_empty {
        return Err(AmError::EmptyPatch);
    }

    let mut message = Vec::new();
    for (i, s) in subject_lines.iter().enumerate() {
        if i > 0 {
            message.push(b'\n');
        }
        message.extend_from_slice(s);
    }
    message.extend_from_slice(b"\n\n");
    if let Some(body) = store.read_file("msg", false)? {
        message.extend_from_slice(&body);
    }

    Ok(MailOutcome::Keep(ParsedMail {
        author_name: author_name.into(),
        author_email: author_email.into(),
        author_date: author_date.into(),
        message: normalize_message(&message),
    }))
}
