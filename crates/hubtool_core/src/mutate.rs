use anyhow::{Context, Error};

use crate::audit_log::AuditLog;
use crate::client::HubWriteApi;
use crate::model::{ContentItem, ContentItemStatus, PublishJob};
use crate::target::RemovalTarget;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub target: RemovalTarget,
    pub ignore_error: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub stopped_early: bool,
    /// Publishes handed to the hub queue. They are not awaited.
    pub publish_jobs: Vec<PublishJob>,
}

struct ItemFailure {
    status: ContentItemStatus,
    error: Error,
}

/// Strip the target field from each item in order, one item at a time.
/// Without `ignore_error` the first failure ends the batch.
pub fn apply_removal<A>(
    api: &mut A,
    items: Vec<ContentItem>,
    options: &BatchOptions,
    log: &mut AuditLog,
) -> BatchReport
where
    A: HubWriteApi + ?Sized,
{
    let mut report = BatchReport::default();
    let target = options.target;

    for item in items {
        let id = item.id.clone();
        let label = item.label.clone();
        let captured = target.captured_value(&item);

        match remove_field(api, item, target) {
            Ok(job) => {
                log.add_action(target.action_name(), &id, captured.as_deref());
                if let Some(job) = job {
                    report.publish_jobs.push(job);
                }
                report.succeeded += 1;
                tracing::info!(%id, action = target.action_name(), "content item updated");
            }
            Err(failure) => {
                report.failed += 1;
                log.add_comment(&format!("{id} failed: {:#}", failure.error));
                let message = format!(
                    "could not remove {} from {id} ({label}); item status is now {}",
                    target.field_label(),
                    failure.status
                );
                let cause = failure.error.root_cause().to_string();
                tracing::warn!(%id, status = %failure.status, error = %failure.error, "content item update failed");
                if options.ignore_error {
                    log.add_warning(&message, Some(&cause));
                } else {
                    log.add_error(&message, Some(&cause));
                    report.stopped_early = true;
                    break;
                }
            }
        }
    }

    report
}

fn remove_field<A>(
    api: &mut A,
    item: ContentItem,
    target: RemovalTarget,
) -> Result<Option<PublishJob>, ItemFailure>
where
    A: HubWriteApi + ?Sized,
{
    let mut status = item.status;
    let fail = |status, error| ItemFailure { status, error };

    let mut current = api
        .unarchive(&item)
        .context("unarchive failed")
        .map_err(|error| fail(status, error))?;
    status = current.status;

    target.clear_field(&mut current);
    let updated = api
        .update(&current)
        .context("update failed")
        .map_err(|error| fail(status, error))?;
    status = updated.status;

    match target {
        RemovalTarget::DeliveryKey => {
            api.archive(&updated)
                .context("archive failed")
                .map_err(|error| fail(status, error))?;
            Ok(None)
        }
        RemovalTarget::ActiveFlag => {
            let job = api
                .publish(&updated)
                .context("publish failed")
                .map_err(|error| fail(status, error))?;
            Ok(Some(job))
        }
    }
}
