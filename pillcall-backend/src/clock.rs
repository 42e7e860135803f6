//! The engine's single fixed timezone (JST, UTC+09:00, no DST).

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

pub fn zone() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&zone())
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_utc_to_jst_crosses_midnight() {
        let utc = Utc.with_ymd_and_hms(2024, 2, 29, 15, 30, 0).unwrap();
        let local = utc.with_timezone(&zone());
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(local.hour(), 0);
        assert_eq!(local.minute(), 30);
    }
}
