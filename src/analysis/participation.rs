use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const WEEKS: usize = 52;
pub const RANKING_WEEKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCommits {
    /// Sunday starting the week.
    pub week: NaiveDate,
    pub commits: u64,
}

/// Weekly commit counts of several repositories over the same 52 weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    pub weeks: Vec<NaiveDate>,
    pub repos: Vec<RepoActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoActivity {
    pub repo: String,
    pub commits: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCommits {
    pub repo: String,
    pub commits: u64,
}

/// The `all` array of a participation response, oldest week first.
pub fn participation_counts(response: &Value) -> Result<Vec<u64>> {
    let all = response
        .get("all")
        .and_then(Value::as_array)
        .context("participation response without an `all` array (statistics may still be computing)")?;

    all.iter()
        .map(|week| {
            week.as_u64()
                .with_context(|| format!("non-numeric weekly commit count {}", week))
        })
        .collect()
}

/// Most recent Sunday on or before `today`.
pub fn last_sunday(today: NaiveDate) -> NaiveDate {
    let back = today.weekday().num_days_from_sunday();
    today
        .checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(today)
}

/// The 52 Sundays ending at `last_sunday(today)`, oldest first.
pub fn week_dates(today: NaiveDate) -> Vec<NaiveDate> {
    let newest = last_sunday(today);
    let mut dates: Vec<NaiveDate> = (0..WEEKS as u64)
        .filter_map(|i| newest.checked_sub_days(Days::new(7 * i)))
        .collect();
    dates.reverse();
    dates
}

/// Exactly 52 counts: the most recent ones are kept, missing older weeks are zero.
pub fn fit_to_weeks(counts: &[u64]) -> Vec<u64> {
    if counts.len() != WEEKS {
        warn!(
            "Participation series has {} weeks instead of {}",
            counts.len(),
            WEEKS
        );
    }

    let recent = &counts[counts.len().saturating_sub(WEEKS)..];
    let mut fitted = vec![0; WEEKS - recent.len()];
    fitted.extend_from_slice(recent);
    fitted
}

pub fn weekly_commits(counts: &[u64], today: NaiveDate) -> Vec<WeekCommits> {
    week_dates(today)
        .into_iter()
        .zip(fit_to_weeks(counts))
        .map(|(week, commits)| WeekCommits { week, commits })
        .collect()
}

impl CommitActivity {
    /// Join several repositories' series on the shared week axis.
    pub fn compare(series: Vec<(String, Vec<u64>)>, today: NaiveDate) -> Self {
        Self {
            weeks: week_dates(today),
            repos: series
                .into_iter()
                .map(|(repo, counts)| RepoActivity {
                    repo,
                    commits: fit_to_weeks(&counts),
                })
                .collect(),
        }
    }

    /// Commits over the last `weeks` weeks per repository, busiest first.
    /// Ties keep the original repository order.
    pub fn ranking(&self, weeks: usize) -> Vec<RepoCommits> {
        let mut ranking: Vec<RepoCommits> = self
            .repos
            .iter()
            .map(|activity| RepoCommits {
                repo: activity.repo.clone(),
                commits: activity
                    .commits
                    .iter()
                    .rev()
                    .take(weeks)
                    .sum(),
            })
            .collect();

        ranking.sort_by(|a, b| b.commits.cmp(&a.commits));
        ranking
    }

    pub fn last_month(&self) -> Vec<RepoCommits> {
        self.ranking(RANKING_WEEKS)
    }

    /// Table rows keyed by week: the week label then one count per repository.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.weeks
            .iter()
            .enumerate()
            .map(|(i, week)| {
                let mut row = vec![week.format("%Y/%m/%d").to_string()];
                row.extend(
                    self.repos
                        .iter()
                        .map(|r| r.commits.get(i).copied().unwrap_or(0).to_string()),
                );
                row
            })
            .collect()
    }
}
