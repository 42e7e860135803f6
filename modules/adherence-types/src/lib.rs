//! Shared types for the pillcall adherence log, schedule and calendar views.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =====================================================
// Adherence Log
// =====================================================

/// Format a date the way it is keyed in the persisted log (`YYYY-MM-DD`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Persisted mapping of user id -> ISO date -> completed.
///
/// Only `true` is ever stored. A missing date means "not completed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdherenceLog {
    users: BTreeMap<String, BTreeMap<String, bool>>,
}

impl AdherenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted JSON form, dropping any explicit `false` entries.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut log: AdherenceLog = serde_json::from_str(content)?;
        for days in log.users.values_mut() {
            days.retain(|_, completed| *completed);
        }
        log.users.retain(|_, days| !days.is_empty());
        Ok(log)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_completed(&self, user_id: &str, date: NaiveDate) -> bool {
        self.user_log(user_id).is_completed(date)
    }

    /// Set the completed flag. Returns `false` when it was already set.
    pub fn mark_completed(&mut self, user_id: &str, date: NaiveDate) -> bool {
        let days = self.users.entry(user_id.to_string()).or_default();
        days.insert(date_key(date), true) != Some(true)
    }

    /// Remove the completed flag. Returns `true` only if a flag was removed.
    pub fn unmark(&mut self, user_id: &str, date: NaiveDate) -> bool {
        let Some(days) = self.users.get_mut(user_id) else {
            return false;
        };
        let removed = days.remove(&date_key(date)).is_some();
        if days.is_empty() {
            self.users.remove(user_id);
        }
        removed
    }

    /// Borrow the slice of the log that belongs to one user.
    pub fn user_log(&self, user_id: &str) -> UserLog<'_> {
        UserLog {
            days: self.users.get(user_id),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Read-only view of a single user's entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserLog<'a> {
    days: Option<&'a BTreeMap<String, bool>>,
}

impl UserLog<'_> {
    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.days
            .and_then(|days| days.get(&date_key(date)))
            .copied()
            .unwrap_or(false)
    }

    /// Number of completed days recorded for this user.
    pub fn completed_days(&self) -> usize {
        self.days.map(|days| days.len()).unwrap_or(0)
    }
}

// =====================================================
// Schedule
// =====================================================

/// A wall-clock (hour, minute) in the engine's fixed timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerTime {
    pub hour: u32,
    pub minute: u32,
}

impl TriggerTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Truncate any clock reading to its (hour, minute).
    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }
}

impl FromStr for TriggerTime {
    type Err = String;

    /// Accepts `H:MM` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| format!("'{}' is not in HH:MM form", s))?;

        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(format!("'{}' is not in HH:MM form", s));
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(format!("'{}' contains non-digit characters", s));
        }

        let hour: u32 = hour.parse().map_err(|e| format!("bad hour in '{}': {}", s, e))?;
        let minute: u32 = minute
            .parse()
            .map_err(|e| format!("bad minute in '{}': {}", s, e))?;

        TriggerTime::new(hour, minute).ok_or_else(|| format!("'{}' is out of range", s))
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// =====================================================
// Calendar View
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Completed,
    TodayPending,
    MissedPast,
    Future,
    OutOfMonth,
}

impl DayStatus {
    /// One-glyph marker drawn in front of the day number.
    pub fn symbol(&self) -> char {
        match self {
            DayStatus::Completed => 'o',
            DayStatus::TodayPending => '*',
            DayStatus::MissedPast => 'x',
            DayStatus::Future | DayStatus::OutOfMonth => ' ',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// A month laid out as Sunday-first weeks. Always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarView {
    pub year: i32,
    pub month: u32,
    pub today: NaiveDate,
    pub weeks: Vec<[DayCell; 7]>,
}

impl CalendarView {
    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flat_map(|week| week.iter())
    }

    pub fn title(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
