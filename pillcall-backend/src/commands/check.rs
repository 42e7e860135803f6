//! Check command - shows a user's month and whether today's dose is recorded

use super::{CommandReply, Invocation};
use crate::adherence::is_completed_today;
use crate::notify::calendar_for;
use crate::platform::ResolvedUser;

/// Execute the check command
pub fn execute(target: &ResolvedUser, inv: &Invocation<'_>) -> Result<CommandReply, String> {
    let log = inv.engine.store().snapshot();

    let statement = if is_completed_today(&log, &target.id, inv.today) {
        format!(
            "✅ **{}** has taken today's medication ({}).",
            target.display_name, inv.today
        )
    } else {
        format!(
            "⏰ **{}** has not taken today's medication yet ({}).",
            target.display_name, inv.today
        )
    };

    let total = log.user_log(&target.id).completed_days();
    let content = format!("{}\n{} day(s) recorded in total.", statement, total);

    let calendars = calendar_for(target, &log, inv.today).into_iter().collect();
    Ok(CommandReply::new(content, calendars))
}
