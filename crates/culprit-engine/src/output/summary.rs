//! Terminal rendering of a culprit.

use crate::model::Culprit;
use colored::*;

/// Render a human-readable summary of a culprit for the terminal
pub fn render_terminal_summary(culprit: &Culprit) -> String {
    let mut out = String::new();

    out.push_str(&render_header(culprit));
    out.push_str(&render_classification(culprit));
    out.push_str(&render_suspects(culprit));
    out.push_str(&render_status(culprit));

    out
}

fn render_header(culprit: &Culprit) -> String {
    let mut out = String::new();
    out.push_str("\n🔎 ");
    out.push_str(&"Culprit Analysis Summary".bold().to_string());
    out.push_str("\n---------------------------------------------------\n");
    match &culprit.regression_range {
        Some((good, bad)) => out.push_str(&format!("Regression range: {} .. {}\n", good, bad)),
        None => out.push_str("Regression range: unknown\n"),
    }
    out.push_str(&format!("Algorithm:        {}\n", culprit.algorithm));
    out.push_str("---------------------------------------------------\n\n");
    out
}

fn render_classification(culprit: &Culprit) -> String {
    let project = if culprit.project.is_empty() {
        "-".dimmed().to_string()
    } else {
        culprit.project.cyan().to_string()
    };
    let components = if culprit.components.is_empty() {
        "-".dimmed().to_string()
    } else {
        culprit.components.join(", ").cyan().to_string()
    };

    format!("Project:    {}\nComponents: {}\n", project, components)
}

fn render_suspects(culprit: &Culprit) -> String {
    let mut out = String::new();
    if culprit.suspected_cls.is_empty() {
        return out;
    }

    out.push_str("\nSuspected changelists:\n");
    for (rank, suspect) in culprit.suspected_cls.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} {} ({:.2}) by {}\n",
            rank + 1,
            suspect.revision().bold(),
            suspect.dep_path,
            suspect.confidence,
            suspect.changelog.author.email
        ));
        for reason in &suspect.reasons {
            for line in reason.lines() {
                out.push_str(&format!("       {}\n", line));
            }
        }
        for changed_file in &suspect.changed_files {
            out.push_str(&format!(
                "       {} {}\n",
                "↳".dimmed(),
                changed_file.blame_url.as_deref().unwrap_or(&changed_file.name)
            ));
        }
    }
    out
}

fn render_status(culprit: &Culprit) -> String {
    let status = if !culprit.suspected_cls.is_empty() {
        "✅ STATUS: SUSPECTS FOUND".green().bold()
    } else if culprit.found() {
        "⚠️  STATUS: CLASSIFIED, NO SUSPECT".yellow().bold()
    } else {
        "❌ STATUS: NOTHING FOUND".red().bold()
    };
    format!("\n{}\n", status)
}
