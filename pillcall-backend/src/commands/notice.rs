//! Notice command - privately previews what a reminder would look like

use super::{CommandReply, Invocation};

/// Execute the notice command
pub async fn execute(inv: &Invocation<'_>) -> CommandReply {
    let notice = inv
        .engine
        .preview(inv.directory, inv.invoker, inv.today)
        .await;

    CommandReply::new(format!("**Test notice**\n{}", notice.text), notice.calendars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{directory, invocation};
    use crate::notify::composer::tests::user;
    use crate::notify::tests::{engine, RecordingSink};
    use crate::notify::composer::FALLBACK_LINE;

    #[tokio::test]
    async fn test_notice_is_not_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, &["1"], None);
        let (directory, sink, invoker) = (directory(), RecordingSink::default(), user("1"));
        let inv = invocation(&engine, &directory, &sink, &invoker);

        let reply = execute(&inv).await;
        assert!(reply.content.starts_with("**Test notice**\n<@1> Time for your meds!"));
        assert!(reply.content.contains(FALLBACK_LINE));
        assert_eq!(reply.calendars.len(), 1);
        assert!(sink.sent.lock().is_empty());
    }
}
