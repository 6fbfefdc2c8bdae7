//! Mail Splitter Driver (component D): invokes the external mail splitter
//! against one or more mbox files/Maildirs, populating the session
//! directory with zero-padded numbered message files.

use crate::error::{AmError, Result};
use crate::external::{ExternalTool, ToolInvocation};
use crate::session::store::SessionStore;

/// Split `paths` into numbered message files inside `store`'s directory.
/// Returns the highest patch number written (`last`); the caller is
/// responsible for setting `cur := 1`.
///
/// Contract with the external splitter: `-d<prec> -o<dir> -b -- <paths...>`,
/// with the last line of its stdout being the highest number it wrote. That
/// contract is undocumented on the splitter's side, so the captured value is
/// validated to be a positive decimal integer before being trusted.
pub fn split_mail(
    tool: &dyn ExternalTool,
    store: &SessionStore,
    prec: usize,
    paths: &[String],
) -> Result<u32> {
    let dir_flag = format!("-o{}", store.dir().display());
    let prec_flag = format!("-d{}", prec);

    let mut args: Vec<&str> = vec!["mailsplit", &prec_flag, &dir_flag, "-b", "--"];
    args.extend(paths.iter().map(String::as_str));

    let invocation = ToolInvocation::new(&args);
    let output = tool.run(&invocation)?;
    if !output.status_ok {
        return Err(AmError::SplitFailure);
    }

    let last_line = output
        .stdout
        .split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .next_back()
        .ok_or(AmError::SplitFailure)?;

    let last_str = std::str::from_utf8(last_line).map_err(|_| AmError::SplitFailure)?;
    let last: u32 = last_str.trim().parse().map_err(|_| AmError::SplitFailure)?;
    if last == 0 {
        return Err(AmError::SplitFailure);
    }

    Ok(last)
}
