use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RECURRENT_THRESHOLD: u64 = 3;
pub const TOP_CONTRIBUTORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub login: String,
    /// `None` when the API omitted the field; shown as "Endpoint error".
    pub contributions: Option<u64>,
}

impl ContributorRecord {
    pub fn from_raw(item: &Value) -> Self {
        Self {
            login: item
                .get("login")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            contributions: item.get("contributions").and_then(Value::as_u64),
        }
    }

    pub fn display_contributions(&self) -> String {
        self.contributions
            .map(|c| c.to_string())
            .unwrap_or_else(|| super::ENDPOINT_ERROR.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSummary {
    /// Every contributor, most contributions first.
    pub contributors: Vec<ContributorRecord>,
    pub total: usize,
    pub recurrent: usize,
}

impl ContributorSummary {
    pub fn top(&self, limit: usize) -> &[ContributorRecord] {
        &self.contributors[..limit.min(self.contributors.len())]
    }

    pub fn recurrent_contributors(&self) -> impl Iterator<Item = &ContributorRecord> {
        self.contributors.iter().filter(|c| is_recurrent(c))
    }
}

fn is_recurrent(contributor: &ContributorRecord) -> bool {
    contributor
        .contributions
        .map(|c| c >= RECURRENT_THRESHOLD)
        .unwrap_or(false)
}

/// Stable sort by contributions, descending; equal counts keep API order.
pub fn sort_contributors(mut contributors: Vec<ContributorRecord>) -> Vec<ContributorRecord> {
    contributors.sort_by(|a, b| b.contributions.unwrap_or(0).cmp(&a.contributions.unwrap_or(0)));
    contributors
}

pub fn summarize(raw: &[Value]) -> ContributorSummary {
    let contributors = sort_contributors(raw.iter().map(ContributorRecord::from_raw).collect());
    let recurrent = contributors.iter().filter(|c| is_recurrent(c)).count();

    ContributorSummary {
        total: contributors.len(),
        recurrent,
        contributors,
    }
}
