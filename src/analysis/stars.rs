use crate::config::Granularity;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Cumulative star count at the end of one day (or week).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarPoint {
    pub date: NaiveDate,
    pub stars: u64,
}

impl StarPoint {
    pub fn label(&self) -> String {
        self.date.format("%Y/%m/%d").to_string()
    }
}

/// Gap-free, non-decreasing cumulative star history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStarSeries {
    pub granularity: Granularity,
    pub points: Vec<StarPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarSummary {
    pub current: u64,
    pub last_week: u64,
    pub last_month: u64,
    pub weekly_increase: u64,
    pub monthly_increase: u64,
}

impl DailyStarSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn current(&self) -> Option<u64> {
        self.points.last().map(|p| p.stars)
    }

    /// Value `n` entries from the end (1 is the last entry). A series shorter
    /// than `n` answers with its first entry.
    pub fn nth_from_end(&self, n: usize) -> Option<u64> {
        if self.points.is_empty() {
            return None;
        }
        let index = self.points.len().saturating_sub(n.max(1));
        Some(self.points[index].stars)
    }

    pub fn summary(&self) -> Option<StarSummary> {
        let (week_back, month_back) = lookback(self.granularity);
        let current = self.current()?;
        let last_week = self.nth_from_end(week_back)?;
        let last_month = self.nth_from_end(month_back)?;

        Some(StarSummary {
            current,
            last_week,
            last_month,
            weekly_increase: current.saturating_sub(last_week),
            monthly_increase: current.saturating_sub(last_month),
        })
    }
}

/// Entries from the end (as passed to `nth_from_end`) that stand for a week
/// ago and a month ago.
fn lookback(granularity: Granularity) -> (usize, usize) {
    match granularity {
        Granularity::Daily => (7, 30),
        Granularity::Weekly => (2, 5),
    }
}

/// Display names of the two summary increments.
pub fn period_labels(granularity: Granularity) -> (&'static str, &'static str) {
    match granularity {
        Granularity::Daily => ("Last 7 days", "Last 30 days"),
        Granularity::Weekly => ("Since last week", "Last 4 weeks"),
    }
}

/// Calendar day of a stargazer event's `starred_at` timestamp, in UTC.
pub fn star_date(event: &Value) -> Result<NaiveDate> {
    let raw = event
        .get("starred_at")
        .and_then(Value::as_str)
        .context("stargazer event without a `starred_at` timestamp")?;

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }

    // Some mirrors drop the time component entirely
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d")
        .with_context(|| format!("unparseable `starred_at` timestamp '{}'", raw))
}

/// Build the cumulative star series over `start..=today`.
///
/// The full calendar range is merged with the sparse per-day event counts;
/// days without events contribute zero new stars, so they carry the previous
/// cumulative total forward. Events before `start` count towards the first
/// day, events after `today` towards the last.
pub fn star_series(
    events: &[Value],
    start: NaiveDate,
    today: NaiveDate,
    granularity: Granularity,
) -> Result<DailyStarSeries> {
    if start > today {
        bail!("star history start date {} is after today ({})", start, today);
    }

    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in events {
        let day = star_date(event)?.clamp(start, today);
        *per_day.entry(day).or_insert(0) += 1;
    }

    debug!(
        "{} stargazer events over {} distinct days",
        events.len(),
        per_day.len()
    );

    let daily_new: Vec<(NaiveDate, u64)> = start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| (day, per_day.get(&day).copied().unwrap_or(0)))
        .collect();

    let buckets = match granularity {
        Granularity::Daily => daily_new,
        Granularity::Weekly => weekly_buckets(&daily_new),
    };

    let mut total = 0;
    let points = buckets
        .into_iter()
        .map(|(date, new_stars)| {
            total += new_stars;
            StarPoint { date, stars: total }
        })
        .collect();

    Ok(DailyStarSeries {
        granularity,
        points,
    })
}

/// Sum daily counts into weeks ending on Sunday, labelled by that Sunday.
fn weekly_buckets(daily: &[(NaiveDate, u64)]) -> Vec<(NaiveDate, u64)> {
    let mut weeks: Vec<(NaiveDate, u64)> = Vec::new();

    for &(day, count) in daily {
        let days_to_sunday = (7 - day.weekday().num_days_from_sunday()) % 7;
        let week_end = day
            .checked_add_days(Days::new(u64::from(days_to_sunday)))
            .unwrap_or(day);

        match weeks.last_mut() {
            Some((end, total)) if *end == week_end => *total += count,
            _ => weeks.push((week_end, count)),
        }
    }

    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn starred(ts: &str) -> Value {
        json!({ "starred_at": ts, "user": { "login": "someone" } })
    }

    #[test]
    fn carries_totals_across_quiet_days() {
        let events = vec![
            starred("2021-08-01T00:00:00Z"),
            starred("2021-08-03T00:00:00Z"),
        ];

        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 3), Granularity::Daily).unwrap();

        let labelled: Vec<_> = series.points.iter().map(|p| (p.label(), p.stars)).collect();
        assert_eq!(
            labelled,
            vec![
                ("2021/08/01".to_string(), 1),
                ("2021/08/02".to_string(), 1),
                ("2021/08/03".to_string(), 2),
            ]
        );
    }

    #[test]
    fn one_entry_per_day_and_never_decreasing() {
        let events: Vec<_> = [
            "2021-08-05T10:00:00Z",
            "2021-08-05T23:59:59Z",
            "2021-09-17T08:00:00+02:00",
            "2022-01-01T00:00:01Z",
            "2021-08-02T12:00:00Z",
        ]
        .iter()
        .map(|ts| starred(ts))
        .collect();
        let start = date(2021, 8, 1);
        let today = date(2022, 2, 14);

        let series = star_series(&events, start, today, Granularity::Daily).unwrap();

        let expected_days = (today - start).num_days() as usize + 1;
        assert_eq!(series.len(), expected_days);
        for (offset, point) in series.points.iter().enumerate() {
            assert_eq!(point.date, start + Days::new(offset as u64));
        }
        assert!(series.points.windows(2).all(|w| w[0].stars <= w[1].stars));
        assert_eq!(series.current(), Some(5));
    }

    #[test]
    fn rerunning_on_the_same_events_is_identical() {
        let events = vec![starred("2021-08-10T00:00:00Z"), starred("2021-08-11T00:00:00Z")];
        let a = star_series(&events, date(2021, 8, 1), date(2021, 9, 1), Granularity::Daily).unwrap();
        let b = star_series(&events, date(2021, 8, 1), date(2021, 9, 1), Granularity::Daily).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn timestamps_are_bucketed_by_utc_day() {
        // 01:30 at +02:00 is still the previous day in UTC
        let events = vec![starred("2021-08-02T01:30:00+02:00")];
        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 2), Granularity::Daily).unwrap();
        assert_eq!(series.points[0].stars, 1);
    }

    #[test]
    fn events_outside_the_window_are_folded_into_the_edges() {
        let events = vec![
            starred("2020-01-01T00:00:00Z"),
            starred("2021-08-02T00:00:00Z"),
            starred("2030-01-01T00:00:00Z"),
        ];
        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 3), Granularity::Daily).unwrap();

        let counts: Vec<_> = series.points.iter().map(|p| p.stars).collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn missing_timestamp_is_an_error() {
        let events = vec![json!({ "login": "someone" })];
        assert!(star_series(&events, date(2021, 8, 1), date(2021, 8, 3), Granularity::Daily).is_err());
    }

    #[test]
    fn start_after_today_is_an_error() {
        assert!(star_series(&[], date(2021, 8, 3), date(2021, 8, 1), Granularity::Daily).is_err());
    }

    #[test]
    fn no_events_gives_a_flat_zero_series() {
        let series =
            star_series(&[], date(2021, 8, 1), date(2021, 8, 10), Granularity::Daily).unwrap();
        assert_eq!(series.len(), 10);
        assert!(series.points.iter().all(|p| p.stars == 0));
    }

    #[test]
    fn weekly_resampling_sums_then_accumulates() {
        // 2021-08-01 is a Sunday
        let events = vec![
            starred("2021-08-01T00:00:00Z"),
            starred("2021-08-02T00:00:00Z"),
            starred("2021-08-04T00:00:00Z"),
            starred("2021-08-15T00:00:00Z"),
        ];
        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 17), Granularity::Weekly).unwrap();

        let weeks: Vec<_> = series.points.iter().map(|p| (p.date, p.stars)).collect();
        assert_eq!(
            weeks,
            vec![
                (date(2021, 8, 1), 1),
                (date(2021, 8, 8), 3),
                (date(2021, 8, 15), 4),
                (date(2021, 8, 22), 4),
            ]
        );
        assert!(series.points.iter().all(|p| p.date.weekday() == Weekday::Sun));
    }

    #[test]
    fn summary_looks_back_a_week_and_a_month() {
        let events: Vec<_> = (1..=31)
            .map(|d| starred(&format!("2021-08-{:02}T12:00:00Z", d)))
            .collect();
        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 31), Granularity::Daily).unwrap();

        let summary = series.summary().unwrap();
        assert_eq!(summary.current, 31);
        assert_eq!(summary.last_week, 25);
        assert_eq!(summary.last_month, 2);
        assert_eq!(summary.weekly_increase, 6);
        assert_eq!(summary.monthly_increase, 29);
    }

    #[test]
    fn weekly_summary_looks_back_in_weeks() {
        let start = date(2021, 8, 1);
        let today = date(2021, 12, 31);
        let events: Vec<_> = start
            .iter_days()
            .take_while(|d| *d <= today)
            .map(|d| starred(&format!("{}T12:00:00Z", d)))
            .collect();

        let series = star_series(&events, start, today, Granularity::Weekly).unwrap();
        let summary = series.summary().unwrap();

        // last bucket ends Sunday 2022-01-02 and holds Dec 27..=31
        assert_eq!(summary.current, 153);
        assert_eq!(summary.last_week, 148);
        assert_eq!(summary.weekly_increase, 5);
        // four buckets earlier ends 2021-12-05
        assert_eq!(summary.last_month, 127);
        assert_eq!(summary.monthly_increase, 26);
        assert_eq!(period_labels(series.granularity), ("Since last week", "Last 4 weeks"));
    }

    #[test]
    fn summary_of_a_short_series_uses_the_first_entry() {
        let events = vec![starred("2021-08-02T00:00:00Z")];
        let series =
            star_series(&events, date(2021, 8, 1), date(2021, 8, 3), Granularity::Daily).unwrap();

        let summary = series.summary().unwrap();
        assert_eq!(summary.current, 1);
        assert_eq!(summary.last_week, 0);
        assert_eq!(summary.last_month, 0);
    }
}
