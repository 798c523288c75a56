use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::issues::{GOOD_FIRST_ISSUE, SUPPORT};

pub const DEFAULT_START_DATE: &str = "Aug 1 2021";
pub const DEFAULT_PRIMARY_COLOR: &str = "#7147E8";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,
    pub client: ClientConfig,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default)]
    pub stars: StarsConfig,
    #[serde(default = "default_issue_labels")]
    pub issue_labels: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<RepoRef>,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub logo_file: Option<String>,
    #[serde(default)]
    pub social: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    /// Per-request timeout, covering connect and body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarsConfig {
    #[serde(default)]
    pub granularity: Granularity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_secondary_background_color")]
    pub secondary_background_color: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_font")]
    pub font: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            background_color: default_background_color(),
            secondary_background_color: default_secondary_background_color(),
            text_color: default_text_color(),
            font: default_font(),
        }
    }
}

fn default_title() -> String {
    "OpenStats".to_string()
}

fn default_root() -> String {
    "api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_start_date() -> String {
    DEFAULT_START_DATE.to_string()
}

fn default_issue_labels() -> Vec<String> {
    vec![GOOD_FIRST_ISSUE.to_string(), SUPPORT.to_string()]
}

fn default_primary_color() -> String {
    DEFAULT_PRIMARY_COLOR.to_string()
}

fn default_background_color() -> String {
    "#FFFFFF".to_string()
}

fn default_secondary_background_color() -> String {
    "#F0F2F6".to_string()
}

fn default_text_color() -> String {
    "#262730".to_string()
}

fn default_font() -> String {
    "sans serif".to_string()
}

impl Config {
    /// Load the dashboard configuration from a YAML/TOML/JSON file, with
    /// `OPENSTATS_*` environment overrides (`OPENSTATS_CLIENT__REPO`) layered on top.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("OPENSTATS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.client.owner.trim().is_empty() {
            bail!("Missing required configuration field `client.owner`");
        }
        if self.client.repo.trim().is_empty() {
            bail!("Missing required configuration field `client.repo`");
        }
        for competitor in &self.competitors {
            if competitor.owner.trim().is_empty() || competitor.repo.trim().is_empty() {
                bail!("Competitor entries need both `owner` and `repo`");
            }
        }
        self.start_date()?;
        Ok(())
    }

    /// Parsed `start_date`. Accepts "Aug 1 2021" as well as "2021-08-01".
    pub fn start_date(&self) -> Result<NaiveDate> {
        parse_start_date(&self.start_date)
    }

    pub fn primary_repo(&self) -> RepoRef {
        RepoRef::new(&self.client.owner, &self.client.repo)
    }
}

pub fn parse_start_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%b %d %Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .with_context(|| format!("Invalid start_date '{}', expected e.g. 'Aug 1 2021'", value))
}
