//! Authorship Script Codec (component B): the three shell-quoted
//! `GIT_AUTHOR_*` assignments persisted in the session's `author-script`
//! file, in the exact order and quoting convention the original
//! `git-am.sh`/`builtin/am.c` used (strict parsing is intentional: the
//! encoder is the sole writer, so anything else is refused outright).

use bstr::BString;

use crate::error::{AmError, Result};
use crate::session::store::SessionStore;

const FILE_NAME: &str = "author-script";

const KEYS: [&str; 3] = ["GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL", "GIT_AUTHOR_DATE"];

/// The current patch's authorship triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorTriple {
    pub name: BString,
    pub email: BString,
    pub date: BString,
}

/// POSIX single-quote a byte string: wrap in `'...'`, escaping every
/// embedded `'` as `'\''`. No other byte is special.
pub fn quote(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(b'\'');
    for &c in value {
        if c == b'\'' {
            out.extend_from_slice(b"'\\''");
        } else {
            out.push(c);
        }
    }
    out.push(b'\'');
    out
}

/// Parse a POSIX single-quoted string back into its raw value. Returns
/// `None` for anything that is not *exactly* `'...'` with the `'\''`
/// escape convention: no double quotes, no other backslash escapes, no
/// concatenation of adjacent quoted segments, and nothing after the
/// closing quote.
pub fn unquote(input: &[u8]) -> Option<Vec<u8>> {
    if input.first() != Some(&b'\'') {
        return None;
    }
    let mut i = 1;
    let mut out = Vec::new();
    loop {
        match input.get(i) {
            None => return None,
            Some(&b'\'') => {
                if input.get(i + 1) == Some(&b'\\')
                    && input.get(i + 2) == Some(&b'\'')
                    && input.get(i + 3) == Some(&b'\'')
                {
                    out.push(b'\'');
                    i += 4;
                } else {
                    i += 1;
                    return if i == input.len() { Some(out) } else { None };
                }
            }
            Some(&c) => {
                out.push(c);
                i += 1;
            }
        }
    }
}

/// Write `GIT_AUTHOR_NAME='...'\nGIT_AUTHOR_EMAIL='...'\nGIT_AUTHOR_DATE='...'\n`
/// to the session's `author-script` file, overwriting any previous one.
pub fn write_author_script(store: &SessionStore, triple: &AuthorTriple) -> Result<()> {
    let mut buf = Vec::new();
    for (key, value) in KEYS.iter().zip([&triple.name, &triple.email, &triple.date]) {
        buf.extend_from_slice(key.as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(&quote(value));
        buf.push(b'\n');
    }
    store.write_file(FILE_NAME, &buf)
}

/// Read and parse `author-script`. Returns `Ok(None)` if the file is
/// absent (first run of a fresh patch, nothing to restore). Any other
/// deviation from the exact three-line format is a fatal `ParseAuthorScript`.
pub fn read_author_script(store: &SessionStore) -> Result<Option<AuthorTriple>> {
    let content = match store.read_file(FILE_NAME, false)? {
        Some(c) => c,
        None => return Ok(None),
    };

    let mut cursor = 0usize;
    let mut values = Vec::with_capacity(3);
    for key in KEYS {
        values.push(parse_assignment(&content, &mut cursor, key)?);
    }
    if cursor != content.len() {
        return Err(AmError::ParseAuthorScript);
    }

    Ok(Some(AuthorTriple {
        name: values[0].clone().into(),
        email: values[1].clone().into(),
        date: values[2].clone().into(),
    }))
}

fn parse_assignment(content: &[u8], cursor: &mut usize, key: &str) -> Result<Vec<u8>> {
    let rest = &content[*cursor..];
    let nl = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(AmError::ParseAuthorScript)?;
    let line = &rest[..nl];

    let mut prefix = Vec::with_capacity(key.len() + 1);
    prefix.extend_from_slice(key.as_bytes());
    prefix.push(b'=');

    let value_bytes = line
        .strip_prefix(prefix.as_slice())
        .ok_or(AmError::ParseAuthorScript)?;
    let value = unquote(value_bytes).ok_or(AmError::ParseAuthorScript)?;

    *cursor += nl + 1;
    Ok(value)
}
