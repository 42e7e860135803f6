//! The notification pass: find who is pending, compose, deliver.

pub mod composer;

pub use composer::{calendar_for, Composer, Notice, UserCalendar};

use crate::adherence::LogStore;
use crate::ai::TextGenerator;
use crate::config::Config;
use crate::eligibility;
use crate::error::PlatformError;
use crate::platform::{NoticeSink, ResolvedUser, UserDirectory};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// A notice mentioning this many users was delivered.
    Notified(usize),
    /// Everyone has already taken today's dose; nothing was sent.
    AllCompliant,
    /// This many users are pending but none could be resolved; nothing was sent.
    Unresolved(usize),
}

/// Everything a notification pass or a command needs, built once at startup.
pub struct ReminderEngine {
    config: Arc<Config>,
    store: Arc<LogStore>,
    composer: Composer,
}

impl ReminderEngine {
    pub fn new(config: Arc<Config>, store: Arc<LogStore>, generator: Arc<dyn TextGenerator>) -> Self {
        let composer = Composer::from_config(&config, generator);
        Self {
            config,
            store,
            composer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Run one full pass. Never writes to the log.
    pub async fn run_pass(
        &self,
        directory: &dyn UserDirectory,
        sink: &dyn NoticeSink,
        today: NaiveDate,
    ) -> Result<PassOutcome, PlatformError> {
        let log = self.store.snapshot();
        let pending_ids = eligibility::users_pending(&self.config.registered_users, &log, today);
        if pending_ids.is_empty() {
            log::info!("Everyone has taken their medication for {}", today);
            return Ok(PassOutcome::AllCompliant);
        }

        let pending =
            eligibility::keep_resolved(eligibility::resolve_all(directory, &pending_ids).await);
        if pending.is_empty() {
            log::warn!(
                "{} user(s) pending for {} but none could be resolved, nothing sent",
                pending_ids.len(),
                today
            );
            return Ok(PassOutcome::Unresolved(pending_ids.len()));
        }

        let notice = self.composer.compose(&pending, &log, today).await;
        sink.deliver(&notice).await?;

        log::info!("Sent reminder to {} user(s) for {}", pending.len(), today);
        Ok(PassOutcome::Notified(pending.len()))
    }

    /// What a real notification would contain right now, with a single calendar.
    ///
    /// Falls back to the invoker's calendar when nobody is pending.
    pub async fn preview(
        &self,
        directory: &dyn UserDirectory,
        invoker: &ResolvedUser,
        today: NaiveDate,
    ) -> Notice {
        let log = self.store.snapshot();
        let pending =
            eligibility::resolve_pending(directory, &self.config.registered_users, &log, today)
                .await;

        let mut notice = self.composer.compose(&pending, &log, today).await;
        notice.calendars.truncate(1);
        if notice.calendars.is_empty() {
            notice.calendars.extend(calendar_for(invoker, &log, today));
        }
        notice
    }
}
