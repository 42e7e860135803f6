//! Untaken command - clears today's dose for a user

use super::{CommandReply, Invocation};
use crate::notify::calendar_for;
use crate::platform::ResolvedUser;

/// Execute the untaken command
pub fn execute(target: &ResolvedUser, inv: &Invocation<'_>) -> Result<CommandReply, String> {
    let mutation = inv
        .engine
        .store()
        .unmark(&target.id, inv.today)
        .map_err(|e| {
            log::error!("Failed to clear dose for {}: {}", target.id, e);
            format!("Could not save the record: {}", e)
        })?;

    let content = if mutation.changed {
        format!(
            "↩️ Cleared **{}**'s record for {}.",
            target.display_name, inv.today
        )
    } else {
        format!(
            "**{}** was not marked as taken for {}, nothing to clear.",
            target.display_name, inv.today
        )
    };

    let calendars = calendar_for(target, &mutation.log, inv.today)
        .into_iter()
        .collect();
    Ok(CommandReply::new(content, calendars))
}
