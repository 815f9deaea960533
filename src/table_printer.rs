/// Table Printer Module for superquery
///
/// Renders result envelopes for the console: a bordered text table for rows,
/// a status line for updates, and CSV/JSON/Markdown exports.

use crate::core::db::{CellValue, ResultEnvelope, RowSet};
use crate::core::{Result, SuperQueryError};
use serde::Deserialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Rows printed before the output is cut off
pub const DEFAULT_MAX_ROWS: usize = 10;
/// Characters shown per cell before truncation
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 80;

const MIN_COLUMN_WIDTH: usize = 4;
const ELLIPSIS: &str = "...";

/// How an envelope is written to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = SuperQueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(SuperQueryError::Output(format!(
                "Unsupported output format: '{}'. Supported formats: table, csv, json, markdown",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

/// Console renderer for row sets and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablePrinter {
    pub max_rows: usize,
    pub max_column_width: usize,
}

impl Default for TablePrinter {
    fn default() -> Self {
        TablePrinter {
            max_rows: DEFAULT_MAX_ROWS,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

impl TablePrinter {
    pub fn new(max_rows: usize, max_column_width: usize) -> Self {
        TablePrinter {
            max_rows,
            max_column_width: max_column_width.max(MIN_COLUMN_WIDTH),
        }
    }

    /// Renders rows as a bordered table followed by a row-count footer.
    pub fn render_rows(&self, rows: &RowSet) -> String {
        let shown = &rows.rows[..rows.row_count().min(self.max_rows)];

        let headers: Vec<String> = rows.columns.iter().map(|c| single_line(c)).collect();
        let texts: Vec<Vec<String>> = shown
            .iter()
            .map(|row| row.iter().map(|cell| single_line(&cell.to_string())).collect())
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|c| c.chars().count()).collect();
        for row in &texts {
            for (width, text) in widths.iter_mut().zip(row) {
                *width = (*width).max(text.chars().count());
            }
        }
        for width in widths.iter_mut() {
            *width = (*width).min(self.max_column_width);
        }

        let separator = format!(
            "+{}+\n",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );

        let mut output = String::new();
        output.push_str(&separator);
        let header: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!(" {:<w$} ", truncate(c, w), w = w))
            .collect();
        output.push_str(&format!("|{}|\n", header.join("|")));
        output.push_str(&separator);

        for (row, row_texts) in shown.iter().zip(&texts) {
            let cells: Vec<String> = row
                .iter()
                .zip(row_texts)
                .zip(&widths)
                .map(|((cell, text), &w)| {
                    let text = truncate(text, w);
                    if cell.is_numeric() {
                        format!(" {:>w$} ", text, w = w)
                    } else {
                        format!(" {:<w$} ", text, w = w)
                    }
                })
                .collect();
            output.push_str(&format!("|{}|\n", cells.join("|")));
        }
        if !shown.is_empty() {
            output.push_str(&separator);
        }

        if shown.len() < rows.row_count() {
            output.push_str(&format!(
                "(showing {} of {} rows)\n",
                shown.len(),
                rows.row_count()
            ));
        } else {
            output.push_str(&format!("({})\n", plural(rows.row_count(), "row")));
        }
        output
    }

    /// Renders an envelope: a status line, then the table when rows are present.
    pub fn render_envelope(&self, envelope: &ResultEnvelope) -> String {
        let mut output = status_line(envelope);
        output.push('\n');
        if let Some(rows) = envelope.rows() {
            output.push_str(&self.render_rows(rows));
        }
        output
    }

    /// Renders an envelope in the requested format.
    ///
    /// Envelopes without rows print their status line in every format except
    /// JSON, which serializes the whole envelope.
    pub fn render_envelope_as(&self, envelope: &ResultEnvelope, format: OutputFormat) -> Result<String> {
        match (format, envelope.rows()) {
            (OutputFormat::Table, _) => Ok(self.render_envelope(envelope)),
            (OutputFormat::Json, None) => Ok(format!("{}\n", serde_json::to_string(envelope)?)),
            (_, None) => Ok(format!("{}\n", status_line(envelope))),
            (format, Some(rows)) => export(rows, format),
        }
    }

    /// Writes an envelope in the requested format to `out`.
    pub fn write_envelope<W: Write>(
        &self,
        out: &mut W,
        envelope: &ResultEnvelope,
        format: OutputFormat,
    ) -> Result<()> {
        out.write_all(self.render_envelope_as(envelope, format)?.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Writes an envelope in the requested format to standard output.
    pub fn print_envelope(&self, envelope: &ResultEnvelope, format: OutputFormat) -> Result<()> {
        self.write_envelope(&mut io::stdout().lock(), envelope, format)
    }
}

/// One-line summary of an envelope: `[code] message` plus affected rows for updates.
pub fn status_line(envelope: &ResultEnvelope) -> String {
    if envelope.kind.is_update() {
        format!(
            "[{}] {}: {} affected",
            envelope.code,
            envelope.message,
            plural(envelope.affected_rows.max(0) as usize, "row")
        )
    } else {
        format!("[{}] {}", envelope.code, envelope.message)
    }
}

/// Exports rows to a text format.
///
/// `Table` is accepted and renders with the default printer.
pub fn export(rows: &RowSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(TablePrinter::default().render_rows(rows)),
        OutputFormat::Csv => Ok(export_to_csv(rows)),
        OutputFormat::Json => export_to_json(rows),
        OutputFormat::Markdown => Ok(export_to_markdown(rows)),
    }
}

fn export_to_csv(rows: &RowSet) -> String {
    let mut output = String::new();
    let header: Vec<String> = rows.columns.iter().map(|c| csv_field(c)).collect();
    output.push_str(&header.join(","));
    output.push('\n');
    for row in &rows.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                CellValue::Null => String::new(),
                other => csv_field(&other.to_string()),
            })
            .collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }
    output
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn export_to_json(rows: &RowSet) -> Result<String> {
    let mut objects = Vec::with_capacity(rows.row_count());
    for row in &rows.rows {
        let mut object = serde_json::Map::new();
        for (column, cell) in rows.columns.iter().zip(row) {
            object.insert(column.clone(), serde_json::to_value(cell)?);
        }
        objects.push(serde_json::Value::Object(object));
    }
    Ok(format!("{}\n", serde_json::to_string(&objects)?))
}

fn export_to_markdown(rows: &RowSet) -> String {
    let mut output = String::new();
    let header: Vec<String> = rows.columns.iter().map(|c| markdown_cell(c)).collect();
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    let underline: Vec<String> = rows
        .columns
        .iter()
        .map(|c| "-".repeat(c.chars().count().max(3)))
        .collect();
    output.push_str(&format!("| {} |\n", underline.join(" | ")));
    for row in &rows.rows {
        let cells: Vec<String> = row.iter().map(|cell| markdown_cell(&cell.to_string())).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    output
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Escapes control characters so a cell occupies exactly one table line.
fn single_line(text: &str) -> String {
    if !text.chars().any(char::is_control) {
        return text.to_string();
    }
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
