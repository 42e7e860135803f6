//! Slash command handling

mod check;
mod notice;
mod notify;
mod taken;
mod untaken;

use crate::notify::{ReminderEngine, UserCalendar};
use crate::platform::{NoticeSink, ResolvedUser, UserDirectory};
use chrono::NaiveDate;

/// Available commands. User-targeted ones default to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Private preview of a reminder: `/notice`
    Notice,
    /// Run a real notification pass now: `/notify`
    Notify,
    /// Show a user's month: `/check [user]`
    Check(Option<ResolvedUser>),
    /// Record today's dose: `/taken [user]`
    Taken(Option<ResolvedUser>),
    /// Clear today's dose: `/untaken [user]`
    Untaken(Option<ResolvedUser>),
}

/// Registration data for one slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub takes_user: bool,
}

pub const COMMANDS: [CommandSpec; 5] = [
    CommandSpec {
        name: "notice",
        description: "Preview the reminder message privately.",
        takes_user: false,
    },
    CommandSpec {
        name: "notify",
        description: "Remind everyone who hasn't taken their medication today.",
        takes_user: false,
    },
    CommandSpec {
        name: "check",
        description: "Show this month's medication calendar.",
        takes_user: true,
    },
    CommandSpec {
        name: "taken",
        description: "Record that today's medication was taken.",
        takes_user: true,
    },
    CommandSpec {
        name: "untaken",
        description: "Undo today's medication record.",
        takes_user: true,
    },
];

impl Command {
    /// Replies only the invoker should see.
    pub fn is_private(&self) -> bool {
        matches!(self, Command::Notice | Command::Notify)
    }
}

/// What to send back to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    pub calendars: Vec<UserCalendar>,
}

impl CommandReply {
    pub fn new(content: String, calendars: Vec<UserCalendar>) -> Self {
        Self { content, calendars }
    }
}

/// Parse a command from its slash-command name
pub fn parse(name: &str, target: Option<ResolvedUser>) -> Option<Command> {
    match name.trim().to_lowercase().as_str() {
        "notice" => Some(Command::Notice),
        "notify" => Some(Command::Notify),
        "check" => Some(Command::Check(target)),
        "taken" => Some(Command::Taken(target)),
        "untaken" => Some(Command::Untaken(target)),
        other => {
            log::debug!("Unknown command '{}'", other);
            None
        }
    }
}

/// Per-invocation inputs shared by every command.
pub struct Invocation<'a> {
    pub engine: &'a ReminderEngine,
    pub directory: &'a dyn UserDirectory,
    pub sink: &'a dyn NoticeSink,
    pub invoker: &'a ResolvedUser,
    pub today: NaiveDate,
}

/// Execute a command and return the response
pub async fn execute(cmd: Command, inv: &Invocation<'_>) -> Result<CommandReply, String> {
    log::info!("Command {:?} from {}", cmd, inv.invoker.id);

    match cmd {
        Command::Notice => Ok(notice::execute(inv).await),
        Command::Notify => notify::execute(inv).await,
        Command::Check(target) => check::execute(target.as_ref().unwrap_or(inv.invoker), inv),
        Command::Taken(target) => taken::execute(target.as_ref().unwrap_or(inv.invoker), inv),
        Command::Untaken(target) => untaken::execute(target.as_ref().unwrap_or(inv.invoker), inv),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::eligibility::tests::StubDirectory;
    use crate::notify::tests::RecordingSink;
    use crate::notify::composer::tests::user;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    pub fn directory() -> StubDirectory {
        StubDirectory { unknown: Vec::new() }
    }

    pub fn invocation<'a>(
        engine: &'a ReminderEngine,
        directory: &'a StubDirectory,
        sink: &'a RecordingSink,
        invoker: &'a ResolvedUser,
    ) -> Invocation<'a> {
        Invocation {
            engine,
            directory,
            sink,
            invoker,
            today: today(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("notice", None), Some(Command::Notice));
        assert_eq!(parse("NOTIFY", None), Some(Command::Notify));
        assert_eq!(parse("check", None), Some(Command::Check(None)));
        assert_eq!(
            parse("taken", Some(user("7"))),
            Some(Command::Taken(Some(user("7"))))
        );
        assert_eq!(parse("untaken", None), Some(Command::Untaken(None)));
    }

    #[test]
    fn test_private_commands() {
        assert!(Command::Notice.is_private());
        assert!(Command::Notify.is_private());
        assert!(!Command::Check(None).is_private());
        assert!(!Command::Taken(None).is_private());
    }

    #[test]
    fn test_parse_unknown() {
        assert!(parse("register", None).is_none());
        assert!(parse("", None).is_none());
    }

    #[test]
    fn test_every_spec_parses() {
        for spec in COMMANDS {
            assert!(parse(spec.name, None).is_some(), "{} should parse", spec.name);
        }
    }

    #[tokio::test]
    async fn test_target_defaults_to_invoker() {
        let dir = tempfile::tempdir().unwrap();
        let engine = crate::notify::tests::engine(&dir, &["1"], Some("Go!"));
        let (directory, sink, invoker) = (directory(), RecordingSink::default(), user("1"));
        let inv = invocation(&engine, &directory, &sink, &invoker);

        execute(Command::Taken(None), &inv).await.unwrap();
        assert!(engine.store().load().is_completed("1", today()));

        execute(Command::Taken(Some(user("2"))), &inv).await.unwrap();
        assert!(engine.store().load().is_completed("2", today()));
    }
}
