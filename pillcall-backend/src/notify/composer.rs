//! Builds the reminder text and the per-user calendars that go with it.

use crate::ai::TextGenerator;
use crate::calendar;
use crate::config::Config;
use crate::platform::ResolvedUser;
use adherence_types::AdherenceLog;
use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Used whenever the text provider fails or is not configured.
pub const FALLBACK_LINE: &str =
    "Sorry, I couldn't come up with a cheerful message this time. Please take your medication!";

/// Upper bound on waiting for the decorative line, retries included.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(20);

/// Discord accepts at most ten embeds per message.
pub const MAX_CALENDARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCalendar {
    pub user: ResolvedUser,
    pub title: String,
    pub grid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub calendars: Vec<UserCalendar>,
}

pub struct Composer {
    message: String,
    media_urls: Vec<String>,
    generator: Arc<dyn TextGenerator>,
    generation_timeout: Duration,
}

impl Composer {
    pub fn new(message: String, media_urls: Vec<String>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            message,
            media_urls,
            generator,
            generation_timeout: GENERATION_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn from_config(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(config.message.clone(), config.media_urls.clone(), generator)
    }

    /// The generated line, or `FALLBACK_LINE` if generation fails or times out.
    pub async fn decorative_line(&self) -> String {
        match tokio::time::timeout(self.generation_timeout, self.generator.generate()).await {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                log::warn!("Decorative line unavailable, using fallback: {}", e);
                FALLBACK_LINE.to_string()
            }
            Err(_) => {
                log::warn!(
                    "Decorative line timed out after {:?}, using fallback",
                    self.generation_timeout
                );
                FALLBACK_LINE.to_string()
            }
        }
    }

    /// Uniformly random pick from the media pool, `None` if the pool is empty.
    pub fn pick_media<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.media_urls.choose(rng).map(String::as_str)
    }

    pub async fn compose(
        &self,
        pending: &[ResolvedUser],
        log: &AdherenceLog,
        today: NaiveDate,
    ) -> Notice {
        let line = self.decorative_line().await;
        let media = self.pick_media(&mut rand::thread_rng());
        self.assemble(pending, &line, media, log, today)
    }

    fn assemble(
        &self,
        pending: &[ResolvedUser],
        line: &str,
        media: Option<&str>,
        log: &AdherenceLog,
        today: NaiveDate,
    ) -> Notice {
        let mentions = pending
            .iter()
            .map(ResolvedUser::mention)
            .collect::<Vec<_>>()
            .join(" ");

        let mut text = format!("{} {}\n{}", mentions, self.message, line);
        if let Some(url) = media {
            text.push('\n');
            text.push_str(url);
        }

        let calendars = pending
            .iter()
            .take(MAX_CALENDARS)
            .filter_map(|user| calendar_for(user, log, today))
            .collect();

        Notice {
            text: text.trim().to_string(),
            calendars,
        }
    }
}

/// Current-month calendar for one user.
pub fn calendar_for(
    user: &ResolvedUser,
    log: &AdherenceLog,
    today: NaiveDate,
) -> Option<UserCalendar> {
    match calendar::build_view(today.year(), today.month(), log.user_log(&user.id), today) {
        Ok(view) => Some(UserCalendar {
            user: user.clone(),
            title: view.title(),
            grid: calendar::render_view(&view),
        }),
        Err(e) => {
            log::warn!("Could not render calendar for {}: {}", user.id, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Returns a fixed line, or fails when `line` is `None`.
    pub struct StubGenerator {
        pub line: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self) -> Result<String, ProviderError> {
            self.line
                .clone()
                .ok_or_else(|| ProviderError::Request("HTTP 500: boom".to_string()))
        }
    }

    /// Never answers within any reasonable timeout.
    struct StalledGenerator;

    #[async_trait]
    impl TextGenerator for StalledGenerator {
        async fn generate(&self) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok("too late".to_string())
        }
    }

    pub fn composer(line: Option<&str>, media: &[&str]) -> Composer {
        Composer::new(
            "Time for your meds!".to_string(),
            media.iter().map(|s| s.to_string()).collect(),
            Arc::new(StubGenerator {
                line: line.map(str::to_string),
            }),
        )
    }

    pub fn user(id: &str) -> ResolvedUser {
        ResolvedUser {
            id: id.to_string(),
            display_name: format!("user-{}", id),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_compose_text_layout() {
        let notice = composer(Some("You've got this!"), &[])
            .compose(&[user("1"), user("2")], &AdherenceLog::new(), today())
            .await;

        assert_eq!(notice.text, "<@1> <@2> Time for your meds!\nYou've got this!");
        assert_eq!(notice.calendars.len(), 2);
        assert_eq!(notice.calendars[0].title, "2024-03");
        assert_eq!(notice.calendars[1].user.id, "2");
    }

    #[tokio::test]
    async fn test_provider_failure_uses_fallback() {
        let notice = composer(None, &[])
            .compose(&[user("1")], &AdherenceLog::new(), today())
            .await;
        assert!(notice.text.contains(FALLBACK_LINE));
        assert!(notice.text.starts_with("<@1> Time for your meds!"));
    }

    #[tokio::test]
    async fn test_stalled_provider_uses_fallback() {
        let composer = Composer::new(
            "Time for your meds!".to_string(),
            Vec::new(),
            Arc::new(StalledGenerator),
        )
        .with_generation_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let notice = composer
            .compose(&[user("1")], &AdherenceLog::new(), today())
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(notice.text.contains(FALLBACK_LINE));
        assert!(!notice.text.contains("too late"));
    }

    #[tokio::test]
    async fn test_media_from_pool() {
        let pool = ["https://example.com/a.gif", "https://example.com/b.gif"];
        let notice = composer(Some("Go!"), &pool)
            .compose(&[user("1")], &AdherenceLog::new(), today())
            .await;
        let last_line = notice.text.lines().last().unwrap();
        assert!(pool.contains(&last_line));
    }

    #[test]
    fn test_pick_media() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(composer(None, &[]).pick_media(&mut rng), None);

        let pool = ["a", "b", "c"];
        let c = composer(None, &pool);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(c.pick_media(&mut rng).unwrap().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_calendars_capped() {
        let users: Vec<ResolvedUser> = (1..=12).map(|i| user(&i.to_string())).collect();
        let notice = composer(None, &[]).assemble(&users, "line", None, &AdherenceLog::new(), today());

        assert_eq!(notice.calendars.len(), MAX_CALENDARS);
        assert_eq!(notice.calendars.last().unwrap().user.id, "10");
        // Every user is still mentioned.
        assert!(notice.text.contains("<@12>"));
    }

    #[test]
    fn test_text_is_trimmed_without_mentions() {
        let notice = composer(None, &[]).assemble(&[], "line", None, &AdherenceLog::new(), today());
        assert_eq!(notice.text, "Time for your meds!\nline");
        assert!(notice.calendars.is_empty());
    }

    #[test]
    fn test_calendar_reflects_log() {
        let mut log = AdherenceLog::new();
        log.mark_completed("1", today());
        let calendar = calendar_for(&user("1"), &log, today()).unwrap();
        assert!(calendar.grid.contains("o 1"));
    }
}
