//! Run Loop (component H): iterates `cur..=last`, orchestrating the
//! per-patch `detect → split → parse → apply → commit → advance` pipeline
//! that `Session::setup`/`load` have already gotten to the starting line.

use std::io::Write;

use crate::apply_commit::{self, ApplyOutcome};
use crate::authscript::{self, AuthorTriple};
use crate::error::{AmError, Result};
use crate::external::{ExternalTool, ToolInvocation};
use crate::mailinfo::{self, MailOutcome};
use crate::repo;
use crate::session::Session;

fn refresh_index(tool: &dyn ExternalTool, session: &Session) -> Result<()> {
    let invocation = ToolInvocation::new(&["update-index", "-q", "--refresh"])
        .with_cwd(session.repo_root());
    let output = tool.run(&invocation)?;
    if !output.status_ok {
        return Err(AmError::Bug("unable to write index file".into()));
    }
    Ok(())
}

fn trigger_background_gc(tool: &dyn ExternalTool, session: &Session) {
    let invocation =
        ToolInvocation::new(&["gc", "--auto"]).with_cwd(session.repo_root());
    // Best-effort: a failed background gc must never fail the am run.
    let _ = tool.run(&invocation);
}

/// Run the full per-patch loop starting from `session`'s current state
/// until `cur > last`, then destroy the session and kick off a best-effort
/// `gc --auto`. On `ApplyFailed`, the session is left live on disk so a
/// later invocation can resume at the same patch.
pub fn am_run(
    tool: &dyn ExternalTool,
    session: &mut Session,
    reflog_action: &str,
    out: &mut impl Write,
    log: &mut impl Write,
) -> Result<()> {
    refresh_index(tool, session)?;

    while session.cur() <= session.last() {
        let mail_path = session.mail_path();
        if !mail_path.is_file() {
            session.advance()?;
            continue;
        }

        let outcome = mailinfo::parse_mail(tool, session.store(), &mail_path)?;
        let parsed = match outcome {
            MailOutcome::Skip => {
                session.advance()?;
                continue;
            }
            MailOutcome::Keep(parsed) => parsed,
        };

        let author = AuthorTriple {
            name: parsed.author_name,
            email: parsed.author_email,
            date: parsed.author_date,
        };
        session.set_parsed(author, parsed.message);

        authscript::write_author_script(session.store(), session.author().unwrap())?;
        session
            .store()
            .write_file("final-commit", session.msg().unwrap())?;

        let subject = String::from_utf8_lossy(apply_commit::first_line(session.msg().unwrap()))
            .into_owned();
        writeln!(out, "Applying: {subject}").ok();

        match apply_commit::run_apply(tool, session)? {
            ApplyOutcome::Failed => {
                writeln!(out, "Patch failed at {} {}", session.msgnum(), subject).ok();
                if repo::advice_amworkdir(tool, session.repo_root()) {
                    writeln!(
                        out,
                        "The copy of the patch that failed is found in: {}",
                        session.store().path_of("patch").display()
                    )
                    .ok();
                }
                return Err(AmError::ApplyFailed {
                    msgnum: session.msgnum(),
                    subject,
                });
            }
            ApplyOutcome::Applied => {}
        }

        let author = session.author().unwrap().clone();
        let msg = session.msg().unwrap().to_vec();
        apply_commit::do_commit(tool, session, &author, &msg, reflog_action, log)?;

        session.advance()?;
    }

    session.destroy()?;
    trigger_background_gc(tool, session);

    Ok(())
}
