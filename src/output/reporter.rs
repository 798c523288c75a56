use super::*;
use crate::analysis::{Dashboard, Section};
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::html::HtmlGenerator;

pub struct Reporter {
    format: OutputFormat,
    output_path: String,
}

impl Reporter {
    pub fn new(format: &str, output_path: &str) -> Result<Self> {
        let format = OutputFormat::from(format);
        let output_path = super::add_file_extension(output_path, &format);

        Ok(Self {
            format,
            output_path,
        })
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub async fn generate_report(&mut self, dashboard: &Dashboard) -> Result<()> {
        let content = match self.format {
            OutputFormat::Html => {
                let mut generator = HtmlGenerator::new()?;
                generator.generate(dashboard).await?
            }
            OutputFormat::Json => JsonGenerator.generate(dashboard).await?,
        };

        fs::write(&self.output_path, content)?;
        info!("Report saved to {}", self.output_path);
        Ok(())
    }

    /// Export the competitor comparison, if one was collected.
    pub fn export_csv(&self, dashboard: &Dashboard, path: &Path) -> Result<()> {
        match &dashboard.competitors {
            Some(Section::Available(overview)) => export::save_activity(&overview.activity, path),
            Some(Section::Unavailable(reason)) => {
                warn!("Skipping CSV export: {}", reason);
                Ok(())
            }
            None => bail!("No competitors configured; nothing to export to {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_dashboard;

    #[tokio::test]
    async fn writes_report_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("stats");

        let mut reporter = Reporter::new("json", base.to_str().unwrap()).unwrap();
        reporter.generate_report(&sample_dashboard()).await.unwrap();

        assert!(reporter.output_path().ends_with("stats.json"));
        let written = fs::read_to_string(reporter.output_path()).unwrap();
        assert!(written.contains("\"repository\": \"acme/widgets\""));
    }

    #[tokio::test]
    async fn writes_html_report() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("stats");

        let mut reporter = Reporter::new("html", base.to_str().unwrap()).unwrap();
        reporter.generate_report(&sample_dashboard()).await.unwrap();

        let written = fs::read_to_string(reporter.output_path()).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn csv_requires_competitors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        let reporter = Reporter::new("json", "unused").unwrap();

        let mut dashboard = sample_dashboard();
        reporter.export_csv(&dashboard, &path).unwrap();
        assert!(path.exists());

        dashboard.competitors = None;
        assert!(reporter.export_csv(&dashboard, &dir.path().join("none.csv")).is_err());
    }
}
