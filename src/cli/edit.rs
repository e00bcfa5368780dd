//! `set` and `merge`: change fields and write them back.

use anyhow::{Result, bail};

use dynset::log;
use dynset::logger::{status_success, status_warning};
use dynset::session::{EditSession, ReadFallback, SessionError};
use dynset::settings::{EditReport, EditSet, LineChange, MergeOutcome};

use super::args::EditArgs;
use super::common::{Context, Device, plural};

/// What `set` did on the worker.
struct SetOutcome {
    report: EditReport,
    changes: Vec<LineChange>,
    written: bool,
}

pub fn run_set(device: &Device, ctx: &Context, args: &EditArgs) -> Result<()> {
    let edits = EditSet::from_assignments(&args.assignments)?;
    let path = ctx.path.clone();
    let dry_run = args.dry_run;

    let outcome = device.run("write", ctx.path.display(), move |channel| {
        let mut session = EditSession::load(channel, &path, ReadFallback::Fail)?;
        let report = session.apply(&edits);
        if !report.is_clean() || dry_run {
            let changes = session.preview();
            return Ok::<_, SessionError>(SetOutcome {
                report,
                changes,
                written: false,
            });
        }
        let commit = session.commit_exact()?;
        Ok(SetOutcome {
            report,
            changes: commit.changes,
            written: commit.written,
        })
    })??;

    if !outcome.report.is_clean() {
        for error in &outcome.report.errors {
            log!("error"; "{error}");
        }
        bail!(
            "nothing written, {} rejected",
            plural(outcome.report.errors.len(), "edit")
        );
    }

    print_changes(&outcome.changes);
    for name in &outcome.report.unchanged {
        log!("set"; "`{name}` already has this value");
    }

    let lines = plural(outcome.changes.len(), "line");
    if dry_run {
        status_warning(&format!("dry run, {lines} would change"));
    } else if outcome.written {
        status_success(&format!("wrote {lines} to {} (verified)", ctx.path.display()));
    } else {
        status_success("no changes");
    }
    Ok(())
}

pub fn run_merge(
    device: &Device,
    ctx: &Context,
    args: &EditArgs,
    fallback_default: bool,
) -> Result<()> {
    let updates = EditSet::from_assignments(&args.assignments)?.to_update_map();
    let path = ctx.path.clone();
    let fallback = ctx.fallback(fallback_default);
    let dry_run = args.dry_run;

    let outcome: MergeOutcome = device.run("merge", ctx.path.display(), move |channel| {
        let session = EditSession::load(channel, &path, fallback)?;
        if dry_run {
            session.preview_merge(&updates)
        } else {
            session.commit_merge(&updates)
        }
    })??;

    // commit_merge logs unknown keys itself
    if dry_run {
        for name in &outcome.unknown {
            status_warning(&format!("no field named `{name}`, skipped"));
        }
    }

    let values = plural(outcome.applied, "value");
    if dry_run {
        print!("{}", outcome.text);
        status_warning(&format!("dry run, {values} would be merged"));
    } else {
        status_success(&format!(
            "merged {values} into {} (verified)",
            ctx.path.display()
        ));
    }
    Ok(())
}

fn print_changes(changes: &[LineChange]) {
    for change in changes {
        println!("{}", format_change(change));
    }
}

fn format_change(change: &LineChange) -> String {
    format!(
        "{:>4}: {} → {}",
        change.line,
        change.old.trim(),
        change.new.trim()
    )
}
