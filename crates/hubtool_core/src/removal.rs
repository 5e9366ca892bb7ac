use std::path::{Path, PathBuf};

use crate::audit_log::AuditLog;
use crate::client::HubWriteApi;
use crate::confirm::{GateDecision, confirm_selection};
use crate::filter::{ItemFilter, filter_items};
use crate::locate::{LocateOptions, locate_archived_items};
use crate::model::ContentItem;
use crate::mutate::{BatchOptions, BatchReport, apply_removal};
use crate::reporter::{Prompt, Reporter};
use crate::target::RemovalTarget;

/// Everything one `remove-archived-*` invocation was asked to do.
#[derive(Debug, Clone)]
pub struct RemovalOptions {
    pub target: RemovalTarget,
    pub location: LocateOptions,
    pub filter: ItemFilter,
    pub force: bool,
    pub silent: bool,
    pub ignore_error: bool,
    /// Log file path; may contain `<DATE>`. `None` means no log file.
    pub log_file: Option<PathBuf>,
}

impl RemovalOptions {
    fn is_unfiltered(&self) -> bool {
        self.location.is_unscoped() && self.filter.is_empty()
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub selected: usize,
    pub report: BatchReport,
    pub log: AuditLog,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum RunOutcome {
    NothingFound,
    Declined,
    Completed(RunSummary),
}

/// Locate, filter, confirm, mutate and log. Location and filter failures are
/// reported and treated as an empty selection; per-item failures land in the
/// audit log. Nothing here returns an error to the caller.
pub fn run_removal<A>(
    api: &mut A,
    options: &RemovalOptions,
    reporter: &mut dyn Reporter,
    prompt: &mut dyn Prompt,
) -> RunOutcome
where
    A: HubWriteApi + ?Sized,
{
    let mut log = AuditLog::new(options.target.log_title());

    for warning in options.location.ignored_filter_warnings() {
        reporter.warn(&warning);
    }

    let selection = select_items(api, options, reporter);
    match confirm_selection(
        &selection,
        options.target,
        options.force,
        options.is_unfiltered(),
        reporter,
        prompt,
    ) {
        GateDecision::NothingFound => return RunOutcome::NothingFound,
        GateDecision::Declined => return RunOutcome::Declined,
        GateDecision::Proceed => {}
    }

    let selected = selection.len();
    let report = apply_removal(
        api,
        selection,
        &BatchOptions {
            target: options.target,
            ignore_error: options.ignore_error,
        },
        &mut log,
    );

    let log_path = if options.silent {
        None
    } else {
        options
            .log_file
            .as_deref()
            .and_then(|template| match log.write_to(template) {
                Ok(path) => Some(path),
                Err(error) => {
                    reporter.error(&format!("{error:#}"));
                    None
                }
            })
    };

    print_summary(options.target, selected, &report, log_path.as_deref(), reporter);

    RunOutcome::Completed(RunSummary {
        selected,
        report,
        log,
        log_path,
    })
}

fn select_items<A>(
    api: &mut A,
    options: &RemovalOptions,
    reporter: &mut dyn Reporter,
) -> Vec<ContentItem>
where
    A: HubWriteApi + ?Sized,
{
    let located = match locate_archived_items(api, &options.location) {
        Ok(items) => items,
        Err(error) => {
            reporter.error(&format!("{error:#}"));
            return Vec::new();
        }
    };
    tracing::debug!(count = located.len(), "located archived content items");

    match filter_items(located, options.target, &options.filter) {
        Ok(items) => items,
        Err(error) => {
            reporter.error(&format!("{error:#}"));
            Vec::new()
        }
    }
}

fn print_summary(
    target: RemovalTarget,
    selected: usize,
    report: &BatchReport,
    log_path: Option<&Path>,
    reporter: &mut dyn Reporter,
) {
    if report.stopped_early {
        reporter.error(&format!(
            "Stopped after a failure; {} content items were not processed. Use --ignoreError to continue past failures.",
            selected - report.succeeded - report.failed
        ));
    } else if report.failed > 0 {
        reporter.warn(&format!(
            "{} content items failed and were skipped.",
            report.failed
        ));
    }
    reporter.info(&format!(
        "Removed the {} from {} of {selected} content items.",
        target.field_label(),
        report.succeeded
    ));
    if !report.publish_jobs.is_empty() {
        reporter.info(&format!(
            "Queued {} publish jobs; they complete asynchronously.",
            report.publish_jobs.len()
        ));
        for job in &report.publish_jobs {
            if let Some(location) = job.location.as_deref() {
                reporter.info(&format!("  {}: {location}", job.content_item_id));
            }
        }
    }
    if let Some(path) = log_path {
        reporter.info(&format!("Log written to {}", path.display()));
    }
}
