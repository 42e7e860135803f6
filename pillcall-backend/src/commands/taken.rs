//! Taken command - records today's dose for a user

use super::{CommandReply, Invocation};
use crate::notify::calendar_for;
use crate::platform::ResolvedUser;

/// Execute the taken command
pub fn execute(target: &ResolvedUser, inv: &Invocation<'_>) -> Result<CommandReply, String> {
    let mutation = inv
        .engine
        .store()
        .mark_completed(&target.id, inv.today)
        .map_err(|e| {
            log::error!("Failed to record dose for {}: {}", target.id, e);
            format!("Could not save the record: {}", e)
        })?;

    let content = if mutation.changed {
        format!(
            "💊 Recorded **{}**'s medication for {}. Well done!",
            target.display_name, inv.today
        )
    } else {
        format!(
            "**{}** was already marked as taken for {}.",
            target.display_name, inv.today
        )
    };

    let calendars = calendar_for(target, &mutation.log, inv.today)
        .into_iter()
        .collect();
    Ok(CommandReply::new(content, calendars))
}
