use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::ranking::projection::{RANK_COLUMN, SCORE_COLUMN};
use crate::ranking::{NormalizationMethod, RankedMetric};
use crate::table::{RecordTable, Value};

/// Narrowest a truncated text column may get
const MIN_TEXT_WIDTH: usize = 10;
const SEPARATOR: &str = "  ";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Format a score with fixed precision ("0.734", "-1.250")
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.3}", score);
    // "-0.000" for tiny negatives reads as a sign error
    if formatted.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        formatted.trim_start_matches('-').to_string()
    } else {
        formatted
    }
}

/// Format a cell for display: whole numbers without decimals, other
/// numbers to 3 places, text as-is.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
        Value::Number(n) => format_score(*n),
        other => other.to_string(),
    }
}

/// Format a cell of the given column. Scores always keep their 3 decimals.
fn format_cell(column: &str, value: &Value) -> String {
    match value.as_f64() {
        Some(score) if column == SCORE_COLUMN => format_score(score),
        _ => format_value(value),
    }
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a projected table with a header row and aligned columns.
/// Numeric columns are right-aligned, text columns left-aligned. When the
/// terminal is too narrow, the first text column is truncated.
pub fn format_ranked_table(table: &RecordTable, use_colors: bool) -> String {
    format_table_with_width(table, use_colors, get_terminal_width())
}

fn format_table_with_width(table: &RecordTable, use_colors: bool, term_width: Option<usize>) -> String {
    if table.is_empty() {
        return "No players match the current filters.".to_string();
    }

    let ncols = table.columns.len();
    let cells: Vec<Vec<String>> = (0..table.len())
        .map(|r| {
            (0..ncols)
                .map(|c| format_cell(&table.columns[c], table.cell(r, c)))
                .collect()
        })
        .collect();

    let numeric: Vec<bool> = (0..ncols)
        .map(|c| (0..table.len()).all(|r| !matches!(table.cell(r, c), Value::Text(_))))
        .collect();

    let mut widths: Vec<usize> = (0..ncols)
        .map(|c| {
            cells
                .iter()
                .map(|row| row[c].chars().count())
                .chain(std::iter::once(table.columns[c].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    if let (Some(term), Some(text_col)) = (term_width, numeric.iter().position(|n| !n)) {
        let total: usize = widths.iter().sum::<usize>() + SEPARATOR.len() * ncols.saturating_sub(1);
        if total > term {
            let others = total - widths[text_col];
            widths[text_col] = term.saturating_sub(others).max(MIN_TEXT_WIDTH).min(widths[text_col]);
        }
    }

    let render_row = |row: &[String]| -> Vec<String> {
        row.iter()
            .enumerate()
            .map(|(c, text)| {
                let text = truncate_text(text, widths[c]);
                if numeric[c] {
                    format!("{:>width$}", text, width = widths[c])
                } else {
                    format!("{:<width$}", text, width = widths[c])
                }
            })
            .collect()
    };

    let header = render_row(&table.columns[..]);
    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(if use_colors {
        header
            .iter()
            .map(|h| h.bold().to_string())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    } else {
        header.join(SEPARATOR)
    });

    for row in &cells {
        let rendered = render_row(&row[..]);
        if use_colors {
            lines.push(
                rendered
                    .iter()
                    .zip(&table.columns)
                    .map(|(text, column)| match column.as_str() {
                        SCORE_COLUMN => text.bold().to_string(),
                        RANK_COLUMN => text.dimmed().to_string(),
                        _ => text.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(SEPARATOR),
            );
        } else {
            lines.push(rendered.join(SEPARATOR));
        }
    }

    lines
        .iter()
        .map(|l| l.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a table as tab-separated values for scripting (header row, no colors)
pub fn format_tsv(table: &RecordTable) -> String {
    let mut lines = vec![table.columns.join("\t")];
    for r in 0..table.len() {
        lines.push(
            (0..table.columns.len())
                .map(|c| table.cell(r, c).to_string())
                .collect::<Vec<_>>()
                .join("\t"),
        );
    }
    lines.join("\n")
}

/// Format a table as a JSON array of objects keyed by column name
pub fn format_json(table: &RecordTable) -> serde_json::Result<String> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = (0..table.len())
        .map(|r| {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(c, name)| {
                    let value = serde_json::to_value(table.cell(r, c)).unwrap_or(serde_json::Value::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

/// Describe how scores are built: method plus each metric's share.
pub fn format_weights(metrics: &[RankedMetric], method: NormalizationMethod, use_colors: bool) -> String {
    let name_width = metrics
        .iter()
        .map(|m| format!("{} ({})", m.name, m.column).chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("Normalization: {}", method)];
    for metric in metrics {
        let label = format!("{} ({})", metric.name, metric.column);
        let share = format!("{:>6.1}%", metric.weight * 100.0);
        let direction = if metric.reverse {
            "lower is better"
        } else {
            "higher is better"
        };
        if use_colors {
            lines.push(format!(
                "  {:<width$}  {}  {}",
                label,
                share.bold(),
                direction.dimmed(),
                width = name_width
            ));
        } else {
            lines.push(format!(
                "  {:<width$}  {}  {}",
                label,
                share,
                direction,
                width = name_width
            ));
        }
    }
    lines.push("Score = sum of normalized metric x weight; rank 1 = highest score.".to_string());
    lines.join("\n")
}
