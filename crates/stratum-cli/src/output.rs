//! Table and JSON rendering of inspection results.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde_json::json;
use std::path::Path;

use stratum_core::{Catalog, ColumnDefinition, FileHeader, Value};

use crate::inspect::{DumpedRow, VerifyReport};

/// Output format of every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum Format {
    /// Box-drawn tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Cell> {
    names
        .into_iter()
        .map(|c| Cell::new(c).fg(Color::Cyan))
        .collect()
}

/// JSON form of a decoded value.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => json!(v),
        Value::Long(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Null => serde_json::Value::Null,
    }
}

/// Renders a file header.
pub fn render_file_header(path: &Path, header: &FileHeader, format: Format) -> String {
    let ranges: Vec<_> = (0..header.chunk_count())
        .filter_map(|slot| header.chunk_file_range(slot))
        .collect();
    match format {
        Format::Json => {
            let chunks: Vec<_> = header
                .chunk_ids()
                .iter()
                .zip(&ranges)
                .map(|(id, range)| {
                    json!({ "chunk_id": id, "start": range.start, "end": range.end })
                })
                .collect();
            json!({
                "file": path.display().to_string(),
                "format_version": header.version(),
                "chunk_count": header.chunk_count(),
                "file_len": header.file_len(),
                "chunks": chunks,
            })
            .to_string()
        }
        Format::Table => {
            let mut table = new_table();
            table.set_header(header_cells(["slot", "chunk id", "start", "end", "bytes"]));
            for (slot, (id, range)) in header.chunk_ids().iter().zip(&ranges).enumerate() {
                table.add_row(vec![
                    Cell::new(slot),
                    Cell::new(id),
                    Cell::new(range.start),
                    Cell::new(range.end),
                    Cell::new(range.len()),
                ]);
            }
            format!(
                concat!(
                    "{} {}\n",
                    "  format version: {}\n",
                    "  chunks:         {}\n",
                    "  length:         {} bytes\n",
                    "{}"
                ),
                "File".bold(),
                path.display(),
                header.version(),
                header.chunk_count(),
                header.file_len(),
                table
            )
        }
    }
}

/// Renders the catalog.
pub fn render_tables(catalog: &Catalog, format: Format) -> String {
    match format {
        Format::Json => serde_json::to_string_pretty(catalog).unwrap_or_default(),
        Format::Table => {
            if catalog.is_empty() {
                return "No tables.".dimmed().to_string();
            }
            let mut table = new_table();
            table.set_header(header_cells(["table", "files", "chunks", "current file", "columns"]));
            for (name, entry) in catalog.iter() {
                let columns: Vec<String> = entry.columns.iter().map(ToString::to_string).collect();
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(entry.file_count),
                    Cell::new(entry.chunk_count),
                    Cell::new(&entry.file_name),
                    Cell::new(columns.join("\n")),
                ]);
            }
            table.to_string()
        }
    }
}

/// Renders decoded rows under their column names.
pub fn render_rows(columns: &[ColumnDefinition], rows: &[DumpedRow], format: Format) -> String {
    match format {
        Format::Json => {
            let rows: Vec<_> = rows
                .iter()
                .map(|row| {
                    let values: serde_json::Map<_, _> = columns
                        .iter()
                        .zip(&row.values)
                        .map(|(c, v)| (c.name.clone(), value_to_json(v)))
                        .collect();
                    json!({ "chunk_id": row.chunk_id, "row": row.row, "values": values })
                })
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_default()
        }
        Format::Table => {
            if rows.is_empty() {
                return "No rows.".dimmed().to_string();
            }
            let mut table = new_table();
            let names = ["chunk", "row"]
                .into_iter()
                .chain(columns.iter().map(|c| c.name.as_str()));
            table.set_header(header_cells(names));
            for row in rows {
                let mut cells = vec![Cell::new(row.chunk_id), Cell::new(row.row)];
                cells.extend(row.values.iter().map(|v| match v {
                    Value::Null => Cell::new("NULL").fg(Color::DarkGrey),
                    other => Cell::new(other),
                }));
                table.add_row(cells);
            }
            table.to_string()
        }
    }
}

/// Renders a verification report.
pub fn render_verify(table: &str, report: &VerifyReport, format: Format) -> String {
    match format {
        Format::Json => json!({
            "table": table,
            "ok": report.is_ok(),
            "files": report.files,
            "chunks": report.chunks,
            "rows": report.rows,
            "problems": report.problems,
        })
        .to_string(),
        Format::Table => {
            let status = if report.is_ok() {
                "OK".green().bold()
            } else {
                "FAILED".red().bold()
            };
            let mut out = format!(
                "{status} {table}: {} files, {} chunks, {} rows",
                report.files, report.chunks, report.rows
            );
            for problem in &report.problems {
                out.push_str(&format!("\n  - {problem}"));
            }
            out
        }
    }
}
