use crate::analysis::contributors::TOP_CONTRIBUTORS;
use crate::analysis::{stars, Dashboard, Section};
use colored::*;
use std::fmt::Write;

fn unavailable(reason: &str) -> String {
    format!("  {} {}", "✗".red(), reason.yellow())
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.bright_blue().bold());
}

/// Plain-terminal rendition of the dashboard.
pub fn render_summary(dashboard: &Dashboard) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        dashboard.title.bright_cyan().bold(),
        format!("({})", dashboard.repository).dimmed()
    );
    if let Some(social) = &dashboard.social {
        let _ = writeln!(out, "{}", social.underline());
    }

    heading(&mut out, "Health");
    match &dashboard.health {
        Section::Available(health) => {
            let _ = writeln!(out, "  {}", health.description);
            let _ = writeln!(
                out,
                "  Community health: {}",
                health.display_percentage().green()
            );
        }
        Section::Unavailable(reason) => {
            let _ = writeln!(out, "{}", unavailable(reason));
        }
    }

    heading(&mut out, "Stars");
    match &dashboard.stars {
        Section::Available(overview) => {
            let s = &overview.summary;
            let (week_label, month_label) = stars::period_labels(overview.series.granularity);
            let _ = writeln!(out, "  Total: {}", s.current.to_string().green().bold());
            let _ = writeln!(out, "  {}: +{}", week_label, s.weekly_increase);
            let _ = writeln!(out, "  {}: +{}", month_label, s.monthly_increase);
        }
        Section::Unavailable(reason) => {
            let _ = writeln!(out, "{}", unavailable(reason));
        }
    }

    heading(&mut out, "Issues");
    for section in &dashboard.issues {
        match section {
            Section::Available(counts) => {
                let _ = writeln!(
                    out,
                    "  {:<20} open {:>4}  closed {:>4}",
                    counts.label, counts.open, counts.closed
                );
            }
            Section::Unavailable(reason) => {
                let _ = writeln!(out, "{}", unavailable(reason));
            }
        }
    }

    heading(&mut out, "Contributors");
    match &dashboard.contributors {
        Section::Available(summary) => {
            let _ = writeln!(
                out,
                "  {} contributors, {} recurrent",
                summary.total, summary.recurrent
            );
            let recurrent: Vec<&str> = summary
                .recurrent_contributors()
                .map(|c| c.login.as_str())
                .collect();
            if !recurrent.is_empty() {
                let _ = writeln!(out, "  Recurrent: {}", recurrent.join(", ").dimmed());
            }
            for contributor in summary.top(TOP_CONTRIBUTORS) {
                let _ = writeln!(
                    out,
                    "  {:<24} {}",
                    contributor.login,
                    contributor.display_contributions()
                );
            }
        }
        Section::Unavailable(reason) => {
            let _ = writeln!(out, "{}", unavailable(reason));
        }
    }

    heading(&mut out, "Traffic (last 14 days)");
    match &dashboard.traffic {
        Section::Available(traffic) => {
            let show = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(out, "  Unique clones: {}", show(traffic.unique_clones));
            let _ = writeln!(out, "  Unique views:  {}", show(traffic.unique_views));
        }
        Section::Unavailable(reason) => {
            let _ = writeln!(out, "{}", unavailable(reason));
        }
    }

    heading(&mut out, "Weekly commits");
    match &dashboard.weekly_commits {
        Section::Available(weeks) => {
            for week in weeks.iter().rev().take(4) {
                let _ = writeln!(out, "  {}  {}", week.week.format("%Y/%m/%d"), week.commits);
            }
        }
        Section::Unavailable(reason) => {
            let _ = writeln!(out, "{}", unavailable(reason));
        }
    }

    if let Some(competitors) = &dashboard.competitors {
        heading(&mut out, "Commits over the last 4 weeks");
        match competitors {
            Section::Available(overview) => {
                for (rank, entry) in overview.last_month.iter().enumerate() {
                    let name = if entry.repo == dashboard.repository {
                        entry.repo.bold().to_string()
                    } else {
                        entry.repo.clone()
                    };
                    let _ = writeln!(out, "  {}. {:<32} {}", rank + 1, name, entry.commits);
                }
            }
            Section::Unavailable(reason) => {
                let _ = writeln!(out, "{}", unavailable(reason));
            }
        }
    }

    out
}

pub fn print_summary(dashboard: &Dashboard) {
    print!("{}", render_summary(dashboard));

    let missing = dashboard.unavailable_sections();
    if missing > 0 {
        println!(
            "\n{}",
            format!("{} of {} sections unavailable", missing, dashboard.sections()).yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::{sample_dashboard, with_stars};

    #[test]
    fn shows_every_section_and_the_failures() {
        let text = render_summary(&sample_dashboard());

        assert!(text.contains("Community health:"));
        assert!(text.contains("71%"));
        assert!(text.contains("Error fetching Star data"));
        assert!(text.contains("HTTP 403"));
        assert!(text.contains("alice"));
        assert!(text.contains("Endpoint error"));
        assert!(text.contains("n/a"));
        assert!(text.contains("2024/03/10"));
        assert!(text.contains("other/gadgets"));
    }

    #[test]
    fn star_totals_when_available() {
        let text = render_summary(&with_stars(sample_dashboard()));
        assert!(!text.contains("Error fetching Star data"));
        assert!(text.contains("Last 7 days: +1"));
    }

    #[test]
    fn weekly_series_is_labelled_in_weeks() {
        let mut dashboard = with_stars(sample_dashboard());
        if let Section::Available(overview) = &mut dashboard.stars {
            overview.series.granularity = crate::config::Granularity::Weekly;
        }

        let text = render_summary(&dashboard);
        assert!(text.contains("Since last week: +"));
        assert!(text.contains("Last 4 weeks: +"));
        assert!(!text.contains("Last 7 days"));
    }
}
