use crate::model::ContentItem;
use crate::reporter::{Prompt, Reporter};
use crate::target::RemovalTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    NothingFound,
    Declined,
    Proceed,
}

/// List the selection and ask before touching it. `unfiltered` means no
/// location or pattern filter narrowed the set, which changes the question.
pub fn confirm_selection(
    items: &[ContentItem],
    target: RemovalTarget,
    force: bool,
    unfiltered: bool,
    reporter: &mut dyn Reporter,
    prompt: &mut dyn Prompt,
) -> GateDecision {
    let field = target.field_label();
    if items.is_empty() {
        reporter.info(&format!(
            "Nothing found: no archived content items with a {field} matched, aborting."
        ));
        return GateDecision::NothingFound;
    }

    reporter.info(&format!("The following content items will have their {field} removed:"));
    for item in items {
        reporter.info(&format!("  {} ({})", item.label, item.id));
    }
    reporter.info(&format!("Total: {}", items.len()));

    if force {
        return GateDecision::Proceed;
    }

    let question = if unfiltered {
        format!(
            "Providing no filter will remove the {field} from ALL archived content items! Are you sure you want to do this?"
        )
    } else {
        format!(
            "Are you sure you want to remove the {field} from these {} archived content items?",
            items.len()
        )
    };

    match prompt.confirm(&question) {
        Ok(true) => GateDecision::Proceed,
        Ok(false) => {
            reporter.info("Aborted, no content items were changed.");
            GateDecision::Declined
        }
        Err(error) => {
            reporter.error(&format!("{error:#}"));
            GateDecision::Declined
        }
    }
}
