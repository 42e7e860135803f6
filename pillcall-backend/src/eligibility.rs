//! Which registered users still need a reminder today.

use crate::adherence::is_completed_today;
use crate::error::PlatformError;
use crate::platform::{ResolvedUser, UserDirectory};
use adherence_types::AdherenceLog;
use chrono::NaiveDate;

/// Registered ids without a completion entry for `today`, in configured order.
pub fn users_pending<'a>(
    registered: &'a [String],
    log: &AdherenceLog,
    today: NaiveDate,
) -> Vec<&'a str> {
    registered
        .iter()
        .map(String::as_str)
        .filter(|id| !is_completed_today(log, id, today))
        .collect()
}

/// Resolve every id, keeping each outcome alongside its id.
pub async fn resolve_all(
    directory: &dyn UserDirectory,
    ids: &[&str],
) -> Vec<(String, Result<ResolvedUser, PlatformError>)> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        resolved.push((id.to_string(), directory.resolve(id).await));
    }
    resolved
}

/// Drop the ids that failed to resolve, logging each one.
pub fn keep_resolved(
    outcomes: Vec<(String, Result<ResolvedUser, PlatformError>)>,
) -> Vec<ResolvedUser> {
    outcomes
        .into_iter()
        .filter_map(|(id, outcome)| match outcome {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Skipping user {}: {}", id, e);
                None
            }
        })
        .collect()
}

/// Pending users, resolved to display names. Empty means nobody needs a reminder.
pub async fn resolve_pending(
    directory: &dyn UserDirectory,
    registered: &[String],
    log: &AdherenceLog,
    today: NaiveDate,
) -> Vec<ResolvedUser> {
    let pending = users_pending(registered, log, today);
    if pending.is_empty() {
        return Vec::new();
    }
    keep_resolved(resolve_all(directory, &pending).await)
}
