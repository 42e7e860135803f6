//! Minute-granularity reminder scheduler.
//!
//! Wakes once per wall-clock minute (one second past the boundary, in JST),
//! tests the current (hour, minute) against the configured trigger set and
//! runs the notification pass on a match. A last-fired marker keeps a
//! repeated tick inside the same minute from firing twice. Minutes that pass
//! while the process is down or busy are not replayed.

use crate::clock;
use crate::notify::{PassOutcome, ReminderEngine};
use crate::platform::{NoticeSink, UserDirectory};
use adherence_types::TriggerTime;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// How far past the minute boundary each tick lands.
const TICK_OFFSET: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Waiting,
    Firing,
}

pub struct Scheduler {
    triggers: BTreeSet<TriggerTime>,
    last_fired: Option<(NaiveDate, TriggerTime)>,
    state: SchedulerState,
}

impl Scheduler {
    /// `None` when there is nothing to schedule.
    pub fn new(triggers: BTreeSet<TriggerTime>) -> Option<Self> {
        if triggers.is_empty() {
            return None;
        }
        Some(Self {
            triggers,
            last_fired: None,
            state: SchedulerState::Idle,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn triggers(&self) -> impl Iterator<Item = &TriggerTime> {
        self.triggers.iter()
    }

    /// Returns `true` (and enters `Firing`) if this tick should fire.
    pub fn begin_tick(&mut self, now: DateTime<FixedOffset>) -> bool {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Waiting;
        }

        let slot = TriggerTime::of(&now);
        if !self.triggers.contains(&slot) {
            return false;
        }

        let marker = (now.date_naive(), slot);
        if self.last_fired == Some(marker) {
            log::debug!("[SCHEDULER] {} {} already fired, ignoring tick", marker.0, slot);
            return false;
        }

        self.last_fired = Some(marker);
        self.state = SchedulerState::Firing;
        true
    }

    pub fn finish_firing(&mut self) {
        self.state = SchedulerState::Waiting;
    }

    /// Tick forever, running a notification pass at each trigger minute.
    pub async fn run<P>(mut self, engine: Arc<ReminderEngine>, platform: Arc<P>)
    where
        P: UserDirectory + NoticeSink + 'static,
    {
        let times: Vec<String> = self.triggers().map(|t| t.to_string()).collect();
        log::info!("[SCHEDULER] Started, notifying at {}", times.join(", "));
        self.state = SchedulerState::Waiting;

        loop {
            tokio::time::sleep(delay_to_next_tick(clock::now())).await;

            let now = clock::now();
            if !self.begin_tick(now) {
                continue;
            }

            log::info!("[SCHEDULER] Firing for {}", now.format("%Y-%m-%d %H:%M"));
            // Detached: the tick cadence never waits on a pass
            tokio::spawn(notification_pass(
                engine.clone(),
                platform.clone(),
                now.date_naive(),
            ));
            self.finish_firing();
        }
    }
}

async fn notification_pass<P>(engine: Arc<ReminderEngine>, platform: Arc<P>, today: NaiveDate)
where
    P: UserDirectory + NoticeSink + 'static,
{
    match engine.run_pass(&*platform, &*platform, today).await {
        Ok(PassOutcome::Notified(count)) => log::info!("[SCHEDULER] Reminded {} user(s)", count),
        Ok(PassOutcome::AllCompliant) => log::info!("[SCHEDULER] Nobody to remind"),
        Ok(PassOutcome::Unresolved(count)) => {
            log::warn!("[SCHEDULER] {} pending user(s) could not be resolved", count)
        }
        Err(e) => log::error!("[SCHEDULER] Notification pass failed: {}", e),
    }
}

/// Time until `TICK_OFFSET` past the next minute boundary.
pub fn delay_to_next_tick(now: DateTime<FixedOffset>) -> Duration {
    let into_minute = Duration::new(
        u64::from(now.second()),
        now.nanosecond().min(999_999_999),
    );
    Duration::from_secs(60).saturating_sub(into_minute) + TICK_OFFSET
}
