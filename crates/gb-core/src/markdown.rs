//! Pipe-delimited markdown tables

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A parsed markdown table: header plus rows keyed by header cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Rows as field-name -> value maps
    pub fn records(&self) -> Vec<BTreeMap<&str, &str>> {
        self.rows
            .iter()
            .map(|row| {
                self.header
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.as_str(), v.as_str()))
                    .collect()
            })
            .collect()
    }
}

fn split_cells(line: &str) -> Result<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return Err(Error::MalformedTableLine {
            line: line.to_string(),
        });
    }
    Ok(trimmed[1..trimmed.len() - 1]
        .split('|')
        .map(|c| c.trim().to_string())
        .collect())
}

/// Check a separator line: only `|`, `:`, `-` and spaces are allowed
pub fn is_separator(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | ':' | '-' | ' '))
}

/// Parse table lines. The first line is the header, the second the
/// separator; every line must be delimited by `|`.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Result<MarkdownTable> {
    let mut table = MarkdownTable::default();

    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let cells = split_cells(line)?;
        match i {
            0 => table.header = cells,
            1 => {
                if !is_separator(line.trim()) {
                    return Err(Error::BadSeparator {
                        line: line.to_string(),
                    });
                }
            }
            _ => {
                let mut row = cells;
                row.resize(table.header.len().max(row.len()), String::new());
                table.rows.push(row);
            }
        }
    }

    Ok(table)
}

/// Render a pipe table with padded, left-aligned columns
pub fn render_table<H: AsRef<str>>(header: &[H], rows: &[Vec<String>]) -> String {
    let columns = header.len();
    let mut widths: Vec<usize> = header.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render_row = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).copied().unwrap_or("");
                format!(" {}{} ", cell, " ".repeat(w - cell.chars().count()))
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(header.iter().map(|h| h.as_ref()).collect()));
    let separator: Vec<String> = widths
        .iter()
        .map(|w| format!(":{}", "-".repeat(w + 1)))
        .collect();
    lines.push(format!("|{}|", separator.join("|")));
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}
