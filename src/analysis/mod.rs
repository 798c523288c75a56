use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod collector;
pub mod contributors;
pub mod health;
pub mod issues;
pub mod participation;
pub mod stars;
pub mod traffic;

pub use collector::StatsCollector;

use contributors::ContributorSummary;
use health::Health;
use issues::IssueCounts;
use participation::{CommitActivity, RepoCommits, WeekCommits};
use stars::{DailyStarSeries, StarSummary};
use traffic::Traffic;

/// Shown in place of a numeric field the API did not return.
pub const ENDPOINT_ERROR: &str = "Endpoint error";

/// One dashboard section: either its data or why it could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Section<T> {
    pub fn from_result(result: anyhow::Result<T>, what: &str) -> Self {
        match result {
            Ok(data) => Section::Available(data),
            Err(e) => {
                tracing::warn!("{} unavailable: {:#}", what, e);
                Section::Unavailable(format!("Error fetching {} data: {}", what, e))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Section::Available(_))
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Section::Available(data) => Some(data),
            Section::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarsOverview {
    pub series: DailyStarSeries,
    pub summary: StarSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorOverview {
    pub activity: CommitActivity,
    pub last_month: Vec<RepoCommits>,
}

/// Everything the presentation layer renders for one dashboard load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub logo_file: Option<String>,
    pub social: Option<String>,
    pub primary_color: String,
    pub health: Section<Health>,
    pub stars: Section<StarsOverview>,
    pub issues: Vec<Section<IssueCounts>>,
    pub contributors: Section<ContributorSummary>,
    pub traffic: Section<Traffic>,
    pub weekly_commits: Section<Vec<WeekCommits>>,
    pub competitors: Option<Section<CompetitorOverview>>,
}

impl Dashboard {
    pub fn sections(&self) -> usize {
        5 + self.issues.len() + usize::from(self.competitors.is_some())
    }

    pub fn unavailable_sections(&self) -> usize {
        let mut missing = [
            self.health.is_available(),
            self.stars.is_available(),
            self.contributors.is_available(),
            self.traffic.is_available(),
            self.weekly_commits.is_available(),
        ]
        .iter()
        .filter(|ok| !**ok)
        .count();

        missing += self.issues.iter().filter(|s| !s.is_available()).count();
        if let Some(competitors) = &self.competitors {
            missing += usize::from(!competitors.is_available());
        }
        missing
    }
}
