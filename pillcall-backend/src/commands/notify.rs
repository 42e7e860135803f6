//! Notify command - runs a notification pass on demand

use super::{CommandReply, Invocation};
use crate::notify::PassOutcome;

/// Execute the notify command
pub async fn execute(inv: &Invocation<'_>) -> Result<CommandReply, String> {
    let outcome = inv
        .engine
        .run_pass(inv.directory, inv.sink, inv.today)
        .await
        .map_err(|e| {
            log::error!("On-demand notification failed: {}", e);
            format!("Failed to send the reminder: {}", e)
        })?;

    let content = match outcome {
        PassOutcome::Notified(count) => format!("📣 Sent a reminder to {} user(s).", count),
        PassOutcome::AllCompliant => {
            "🎉 Everyone has already taken their medication today. No reminder sent.".to_string()
        }
        PassOutcome::Unresolved(count) => format!(
            "⚠️ {} user(s) still need their medication, but none could be found on Discord. No reminder sent.",
            count
        ),
    };
    Ok(CommandReply::new(content, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{directory, invocation, today};
    use crate::notify::composer::tests::user;
    use crate::eligibility::tests::StubDirectory;
    use crate::notify::tests::{engine, RecordingSink};

    #[tokio::test]
    async fn test_notify_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, &["1", "2"], Some("Go!"));
        let (directory, sink, invoker) = (directory(), RecordingSink::default(), user("1"));
        let inv = invocation(&engine, &directory, &sink, &invoker);

        let reply = execute(&inv).await.unwrap();
        assert!(reply.content.contains("2 user(s)"));
        assert_eq!(sink.sent.lock().len(), 1);

        engine.store().mark_completed("1", today()).unwrap();
        engine.store().mark_completed("2", today()).unwrap();
        let reply = execute(&inv).await.unwrap();
        assert!(reply.content.contains("Everyone has already taken"));
        assert_eq!(sink.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_notify_reports_unresolved_users() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, &["1", "2"], Some("Go!"));
        let directory = StubDirectory {
            unknown: vec!["1".to_string(), "2".to_string()],
        };
        let (sink, invoker) = (RecordingSink::default(), user("1"));
        let inv = invocation(&engine, &directory, &sink, &invoker);

        let reply = execute(&inv).await.unwrap();
        assert!(reply.content.contains("2 user(s) still need"));
        assert!(!reply.content.contains("Everyone"));
        assert!(sink.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_notify_delivery_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, &["1"], Some("Go!"));
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let (directory, invoker) = (directory(), user("1"));
        let inv = invocation(&engine, &directory, &sink, &invoker);

        let err = execute(&inv).await.unwrap_err();
        assert!(err.starts_with("Failed to send the reminder"));
    }
}
