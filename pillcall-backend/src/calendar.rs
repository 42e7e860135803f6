//! Month calendar rendering for one user's adherence history.
//!
//! Pure calendar arithmetic: nothing here reads the clock, "today" is always
//! passed in.

use adherence_types::{CalendarView, DayCell, DayStatus, UserLog};
use chrono::{Datelike, Days, NaiveDate};

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Explains the status symbols. Shown under rendered calendars.
pub const LEGEND: &str = "o taken   * today   x missed";

fn classify(date: NaiveDate, month: u32, user_log: UserLog<'_>, today: NaiveDate) -> DayStatus {
    if date.month() != month {
        DayStatus::OutOfMonth
    } else if user_log.is_completed(date) {
        DayStatus::Completed
    } else if date == today {
        DayStatus::TodayPending
    } else if date < today {
        DayStatus::MissedPast
    } else {
        DayStatus::Future
    }
}

/// Lay out every Sunday-first week that overlaps `year`-`month`.
pub fn build_view(
    year: i32,
    month: u32,
    user_log: UserLog<'_>,
    today: NaiveDate,
) -> Result<CalendarView, String> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| format!("Invalid month {:04}-{:02}", year, month))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| format!("Month {:04}-{:02} is out of range", year, month))?;

    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = 6 - u64::from(last.weekday().num_days_from_sunday());
    let start = first
        .checked_sub_days(Days::new(lead))
        .ok_or_else(|| format!("Month {:04}-{:02} is out of range", year, month))?;
    let end = last
        .checked_add_days(Days::new(trail))
        .ok_or_else(|| format!("Month {:04}-{:02} is out of range", year, month))?;

    let mut cells = Vec::new();
    let mut date = start;
    loop {
        cells.push(DayCell {
            date,
            status: classify(date, month, user_log, today),
        });
        if date >= end {
            break;
        }
        date = date
            .succ_opt()
            .ok_or_else(|| format!("Month {:04}-{:02} is out of range", year, month))?;
    }

    let weeks = cells
        .chunks_exact(7)
        .filter_map(|week| <[DayCell; 7]>::try_from(week).ok())
        .collect();

    Ok(CalendarView {
        year,
        month,
        today,
        weeks,
    })
}

fn render_cell(cell: &DayCell) -> String {
    match cell.status {
        DayStatus::OutOfMonth => "   ".to_string(),
        status => format!("{}{:>2}", status.symbol(), cell.date.day()),
    }
}

/// Header row followed by one line per week.
pub fn render_view(view: &CalendarView) -> String {
    let header = WEEKDAYS
        .iter()
        .map(|d| format!("{:>3}", d))
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = Vec::with_capacity(view.weeks.len() + 1);
    lines.push(header);
    for week in &view.weeks {
        lines.push(week.iter().map(render_cell).collect::<Vec<_>>().join(" "));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use adherence_types::AdherenceLog;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn render(
        year: i32,
        month: u32,
        user_log: UserLog<'_>,
        today: NaiveDate,
    ) -> Result<String, String> {
        build_view(year, month, user_log, today).map(|view| render_view(&view))
    }

    fn statuses(view: &CalendarView) -> Vec<DayStatus> {
        view.cells()
            .filter(|c| c.status != DayStatus::OutOfMonth)
            .map(|c| c.status)
            .collect()
    }

    #[test]
    fn test_non_leap_february_empty_log() {
        let log = AdherenceLog::new();
        let view = build_view(2023, 2, log.user_log("42"), d(2023, 2, 1)).unwrap();

        // 2023-02-01 is a Wednesday; 28 days end on Tuesday the 28th.
        assert_eq!(view.weeks.len(), 5);
        let in_month = statuses(&view);
        assert_eq!(in_month.len(), 28);
        assert_eq!(in_month[0], DayStatus::TodayPending);
        assert!(in_month[1..].iter().all(|s| *s == DayStatus::Future));

        // Leading Sun..Tue and trailing Wed..Sat are padding.
        let first_week = &view.weeks[0];
        assert!(first_week[..3].iter().all(|c| c.status == DayStatus::OutOfMonth));
        let last_week = &view.weeks[4];
        assert!(last_week[3..].iter().all(|c| c.status == DayStatus::OutOfMonth));
    }

    #[test]
    fn test_row_counts() {
        let log = AdherenceLog::new();
        let today = d(2000, 1, 1);
        // February 2015 starts on Sunday and fills exactly four rows.
        assert_eq!(build_view(2015, 2, log.user_log("1"), today).unwrap().weeks.len(), 4);
        // Leap February 2024 starts Thursday, ends Thursday the 29th.
        let leap = build_view(2024, 2, log.user_log("1"), today).unwrap();
        assert_eq!(leap.weeks.len(), 5);
        assert_eq!(statuses(&leap).len(), 29);
        // March 2024 starts Friday and spills into a sixth row.
        assert_eq!(build_view(2024, 3, log.user_log("1"), today).unwrap().weeks.len(), 6);
        // December wraps into the next year.
        assert_eq!(build_view(2024, 12, log.user_log("1"), today).unwrap().weeks.len(), 5);
    }

    #[test]
    fn test_status_priority() {
        let mut log = AdherenceLog::new();
        log.mark_completed("42", d(2024, 3, 1));
        log.mark_completed("42", d(2024, 3, 5));
        // A stray entry for a future day still counts as completed.
        log.mark_completed("42", d(2024, 3, 20));

        let view = build_view(2024, 3, log.user_log("42"), d(2024, 3, 5)).unwrap();
        let in_month = statuses(&view);
        assert_eq!(in_month[0], DayStatus::Completed);
        assert_eq!(in_month[1], DayStatus::MissedPast);
        assert_eq!(in_month[3], DayStatus::MissedPast);
        assert_eq!(in_month[4], DayStatus::Completed);
        assert_eq!(in_month[5], DayStatus::Future);
        assert_eq!(in_month[19], DayStatus::Completed);
    }

    #[test]
    fn test_past_month_all_missed() {
        let log = AdherenceLog::new();
        let view = build_view(2024, 1, log.user_log("42"), d(2024, 3, 5)).unwrap();
        assert!(statuses(&view).iter().all(|s| *s == DayStatus::MissedPast));
    }

    #[test]
    fn test_render_text() {
        let mut log = AdherenceLog::new();
        log.mark_completed("42", d(2015, 2, 2));
        let text = render(2015, 2, log.user_log("42"), d(2015, 2, 3)).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], " Su  Mo  Tu  We  Th  Fr  Sa");
        assert_eq!(lines[1], "x 1 o 2 * 3   4   5   6   7");
        assert_eq!(lines[4], " 22  23  24  25  26  27  28");
        assert!(lines.iter().all(|l| l.chars().count() == 27));
    }

    #[test]
    fn test_render_pads_out_of_month_blank() {
        let log = AdherenceLog::new();
        let text = render(2023, 2, log.user_log("42"), d(2023, 2, 1)).unwrap();
        let first_row = text.lines().nth(1).unwrap();
        assert_eq!(first_row, "            * 1   2   3   4");
    }

    #[test]
    fn test_invalid_month() {
        let log = AdherenceLog::new();
        assert!(render(2024, 13, log.user_log("42"), d(2024, 1, 1)).is_err());
        assert!(render(2024, 0, log.user_log("42"), d(2024, 1, 1)).is_err());
    }
}
