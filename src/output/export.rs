use crate::analysis::participation::CommitActivity;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the weekly commit comparison as CSV: one row per week, one column
/// per repository.
pub fn write_activity<W: Write>(activity: &CommitActivity, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["week".to_string()];
    header.extend(activity.repos.iter().map(|r| r.repo.clone()));
    csv.write_record(&header)?;

    for row in activity.rows() {
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn save_activity(activity: &CommitActivity, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_activity(activity, file)?;
    info!("Commit activity exported to {}", path.display());
    Ok(())
}
