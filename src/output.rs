//! Output and color utilities for consistent terminal formatting
//!
//! Renders ingest reports, search hits and workspace stats as text or JSON.
//! Colors respect the NO_COLOR environment variable.

use colored::Colorize;
use serde::Serialize;

use crate::ranking::SearchResult;
use crate::retrieval::{IngestReport, WorkspaceStats};

/// Maximum characters of chunk text shown per hit in text mode.
const SNIPPET_CHARS: usize = 160;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Colorize item id (cyan)
pub fn colorize_item(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize score (yellow)
pub fn colorize_score(score: f32, use_color: bool) -> String {
    let rendered = format!("{:.4}", score);
    if use_color {
        rendered.yellow().to_string()
    } else {
        rendered
    }
}

/// Colorize failure text (red bold)
pub fn colorize_error(text: &str, use_color: bool) -> String {
    if use_color {
        text.red().bold().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize secondary text (dimmed)
pub fn colorize_context(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Serializes any report as JSON, pretty unless `compact`.
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

pub fn render_ingest(report: &IngestReport, use_color: bool) -> String {
    let mut out = format!(
        "{}: {} of {} chunks embedded in workspace {}",
        colorize_item(&report.item_id, use_color),
        report.created,
        report.chunks,
        report.workspace_id
    );
    for failure in &report.failures {
        out.push('\n');
        out.push_str(&colorize_error(
            &format!("  chunk {} failed: {}", failure.chunk_index, failure.message),
            use_color,
        ));
    }
    out
}

pub fn render_results(results: &[SearchResult], use_color: bool) -> String {
    if results.is_empty() {
        return colorize_context("No matches.", use_color);
    }

    results
        .iter()
        .enumerate()
        .map(|(rank, hit)| {
            format!(
                "{:>2}. {} {} {}\n    {}",
                rank + 1,
                colorize_score(hit.score, use_color),
                colorize_item(&hit.item_id, use_color),
                colorize_context(&format!("#{}", hit.chunk_index), use_color),
                snippet(&hit.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: &WorkspaceStats, use_color: bool) -> String {
    let mut out = format!(
        "workspace {}: {} records in {} items",
        stats.workspace_id,
        stats.records,
        stats.items.len()
    );
    for item in &stats.items {
        out.push_str(&format!(
            "\n  {} {} records {}",
            colorize_item(&item.item_id, use_color),
            item.records,
            colorize_context(&format!("({}, {} dims)", item.model, item.dimensions), use_color)
        ));
    }
    out
}

fn snippet(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= SNIPPET_CHARS {
        return single_line;
    }
    let cut: String = single_line.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut)
}
