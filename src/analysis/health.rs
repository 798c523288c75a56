use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MISSING_DESCRIPTION: &str = "Error fetching description";

/// Community profile figures shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub health_percentage: Option<u64>,
    pub description: String,
}

impl Health {
    pub fn from_profile(profile: &Value) -> Self {
        Self {
            health_percentage: profile.get("health_percentage").and_then(Value::as_u64),
            description: profile
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or(MISSING_DESCRIPTION)
                .to_string(),
        }
    }

    pub fn display_percentage(&self) -> String {
        match self.health_percentage {
            Some(p) => format!("{}%", p),
            None => super::ENDPOINT_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_profile_fields() {
        let health = Health::from_profile(&json!({
            "health_percentage": 85,
            "description": "Widgets for everyone",
            "files": {}
        }));
        assert_eq!(health.display_percentage(), "85%");
        assert_eq!(health.description, "Widgets for everyone");
    }

    #[test]
    fn falls_back_on_missing_fields() {
        let health = Health::from_profile(&json!({"description": null}));
        assert_eq!(health.display_percentage(), "Endpoint error");
        assert_eq!(health.description, MISSING_DESCRIPTION);
    }
}
