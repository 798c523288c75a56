use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique cloners and visitors over the API's fixed 14 day window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub unique_clones: Option<u64>,
    pub unique_views: Option<u64>,
}

impl Traffic {
    pub fn from_responses(clones: &Value, views: &Value) -> Self {
        Self {
            unique_clones: uniques(clones),
            unique_views: uniques(views),
        }
    }
}

/// The `uniques` aggregate of a traffic response.
pub fn uniques(response: &Value) -> Option<u64> {
    response.get("uniques").and_then(Value::as_u64)
}
