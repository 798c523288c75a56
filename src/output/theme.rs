use crate::config::StyleConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const THEME_FILE: &str = "config.toml";

#[derive(Debug, Serialize)]
struct ThemeFile<'a> {
    theme: Theme<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Theme<'a> {
    primary_color: &'a str,
    background_color: &'a str,
    secondary_background_color: &'a str,
    text_color: &'a str,
    font: &'a str,
}

pub fn render_theme(style: &StyleConfig) -> Result<String> {
    let file = ThemeFile {
        theme: Theme {
            primary_color: &style.primary_color,
            background_color: &style.background_color,
            secondary_background_color: &style.secondary_background_color,
            text_color: &style.text_color,
            font: &style.font,
        },
    };
    toml::to_string(&file).context("Failed to serialize theme")
}

/// Write `<dir>/config.toml`, creating `dir` when needed.
pub fn write_theme(style: &StyleConfig, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(THEME_FILE);
    fs::write(&path, render_theme(style)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Theme written to {}", path.display());
    Ok(path)
}
