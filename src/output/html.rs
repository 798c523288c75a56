use super::*;
use crate::analysis::{stars, Dashboard, ENDPOINT_ERROR};
use anyhow::Result;
use rust_embed::RustEmbed;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

#[derive(RustEmbed)]
#[folder = "src/output/templates/"]
#[include = "*.html"]
struct Templates;

#[derive(RustEmbed)]
#[folder = "src/output/assets/"]
#[include = "*.css"]
struct Assets;

pub struct HtmlGenerator {
    tera: Tera,
}

impl HtmlGenerator {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        for file in Templates::iter() {
            let template_name = file.as_ref();
            let template_content = Templates::get(template_name)
                .ok_or_else(|| anyhow::anyhow!("Template {} not found", template_name))?;
            let template_str = std::str::from_utf8(&template_content.data)
                .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in template {}: {}", template_name, e))?;

            tera.add_raw_template(template_name, template_str)
                .map_err(|e| anyhow::anyhow!("Failed to add template {}: {}", template_name, e))?;
        }

        tera.register_filter("or_endpoint_error", Self::or_endpoint_error_filter);
        tera.register_filter("thousands", Self::thousands_filter);

        Ok(Self { tera })
    }

    fn load_asset(&self, filename: &str) -> Result<String> {
        let asset = Assets::get(filename)
            .ok_or_else(|| anyhow::anyhow!("Asset {} not found", filename))?;
        let content = std::str::from_utf8(&asset.data)
            .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in asset {}: {}", filename, e))?;
        Ok(content.to_string())
    }

    /// Null numeric fields render as the endpoint error marker.
    fn or_endpoint_error_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(match value {
            Value::Null => Value::String(ENDPOINT_ERROR.to_string()),
            other => other.clone(),
        })
    }

    fn thousands_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        let Some(n) = value.as_u64() else {
            return Ok(value.clone());
        };
        let digits = n.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        Ok(Value::String(grouped))
    }

    fn prepare_template_context(&self, dashboard: &Dashboard) -> Result<Context> {
        let mut context = Context::new();

        let css_content = self.load_asset("styles.css")?;

        context.insert("css_content", &css_content);
        context.insert("dashboard", dashboard);
        context.insert(
            "generated_date",
            &dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        if let Some(overview) = dashboard.stars.available() {
            let (week_label, month_label) = stars::period_labels(overview.series.granularity);
            context.insert("week_label", week_label);
            context.insert("month_label", month_label);
        }

        let unavailable = dashboard.unavailable_sections();
        context.insert("unavailable_sections", &unavailable);
        context.insert("total_sections", &dashboard.sections());

        Ok(context)
    }
}

impl OutputGenerator for HtmlGenerator {
    async fn generate(&mut self, dashboard: &Dashboard) -> Result<String> {
        let context = self.prepare_template_context(dashboard)?;
        let html = self.tera.render("dashboard.html", &context)?;
        Ok(html)
    }
}
