use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GOOD_FIRST_ISSUE: &str = "good first issue";
pub const SUPPORT: &str = "support";

/// Open and closed issues that matched a predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueSplit {
    pub open: Vec<Value>,
    pub closed: Vec<Value>,
}

impl IssueSplit {
    pub fn counts(&self, label: &str) -> IssueCounts {
        IssueCounts {
            label: label.to_string(),
            open: self.open.len(),
            closed: self.closed.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub label: String,
    pub open: usize,
    pub closed: usize,
}

/// True when `issue` carries a label object whose `name` is exactly `name`.
///
/// Anything that is not an object with a `labels` array never matches.
pub fn has_label(issue: &Value, name: &str) -> bool {
    issue
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .any(|label| label.get("name").and_then(Value::as_str) == Some(name))
        })
        .unwrap_or(false)
}

/// Predicate matching issues labelled `name`.
pub fn label_predicate(name: &str) -> impl Fn(&Value) -> bool + '_ {
    move |issue| has_label(issue, name)
}

/// Filter the open and closed lists independently with the same predicate.
pub fn split_by<P>(open: Vec<Value>, closed: Vec<Value>, predicate: P) -> IssueSplit
where
    P: Fn(&Value) -> bool,
{
    IssueSplit {
        open: open.into_iter().filter(|issue| predicate(issue)).collect(),
        closed: closed.into_iter().filter(|issue| predicate(issue)).collect(),
    }
}
