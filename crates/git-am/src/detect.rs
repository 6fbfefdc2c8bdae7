//! Format Detector (component C): classifies the input paths as `Mbox`
//! (the only supported family) or `Unknown`. An `Unknown` verdict at
//! setup time is a fatal user error.

use std::fs;
use std::path::Path;

use regex::bytes::Regex;

use crate::error::{AmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    Mbox,
    Unknown,
}

/// Split `content` into lines, treating both `\n` and `\r\n` as
/// terminators. The final fragment (with no trailing terminator) is
/// included as a line only if non-empty, matching a `getline`-style read
/// to EOF.
fn split_lines_crlf(content: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in content.iter().enumerate() {
        if b == b'\n' {
            let mut end = i;
            if end > start && content[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(&content[start..end]);
            start = i + 1;
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

fn is_indented(line: &[u8]) -> bool {
    matches!(line.first(), Some(b' ') | Some(b'\t'))
}

/// Detect the patch format of `paths`. Empty input, `"-"`, or an existing
/// directory as the first entry all mean "mbox, read from stdin or a
/// Maildir". Otherwise the first path is opened and its header-looking
/// lines are checked against the RFC 2822 field-name shape.
pub fn detect_patch_format(paths: &[String]) -> Result<PatchFormat> {
    let first = match paths.first() {
        None => return Ok(PatchFormat::Mbox),
        Some(p) => p,
    };

    if first == "-" || Path::new(first).is_dir() {
        return Ok(PatchFormat::Mbox);
    }

    let content = fs::read(first).map_err(|e| AmError::Io {
        path: first.into(),
        source: e,
    })?;
    let lines = split_lines_crlf(&content);

    let mut idx = 0;
    while idx < lines.len() && lines[idx].is_empty() {
        idx += 1;
    }
    if idx >= lines.len() {
        return Ok(PatchFormat::Unknown);
    }

    let l1 = lines[idx];
    if l1.starts_with(b"From ") || l1.starts_with(b"From: ") {
        return Ok(PatchFormat::Mbox);
    }

    let header_re = Regex::new(r"^[!-9;-~]+:").expect("static regex is valid");
    for &line in &lines[idx..] {
        if line.is_empty() {
            break;
        }
        if is_indented(line) {
            continue;
        }
        if !header_re.is_match(line) {
            return Ok(PatchFormat::Unknown);
        }
    }

    Ok(PatchFormat::Mbox)
}
