use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod export;
pub mod html;
pub mod reporter;
pub mod terminal;
pub mod theme;

pub use reporter::Reporter;

use crate::analysis::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Html,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "html" => OutputFormat::Html,
            _ => OutputFormat::Html,
        }
    }
}

pub fn add_file_extension(path: &str, format: &OutputFormat) -> String {
    let extension = match format {
        OutputFormat::Html => ".html",
        OutputFormat::Json => ".json",
    };

    if path.ends_with(extension) {
        path.to_string()
    } else {
        format!("{}{}", path, extension)
    }
}

pub trait OutputGenerator {
    async fn generate(&mut self, dashboard: &Dashboard) -> Result<String>;
}

pub struct JsonGenerator;

impl OutputGenerator for JsonGenerator {
    async fn generate(&mut self, dashboard: &Dashboard) -> Result<String> {
        Ok(serde_json::to_string_pretty(dashboard)?)
    }
}
