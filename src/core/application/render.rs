//! Table, CSV and JSON output of a [`RowSet`].

use crate::core::{
    application::config::{OutputFormat, RenderOptions},
    domain::{
        error::{InventoryError, InventoryResult},
        value_object::{humanize_bytes, to_mebibytes},
    },
};
use serde_json::{Map, Number, Value};

const GUTTER: &str = "  ";

/// A single output value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(u64),
    /// A byte count, printed in MiB or human units.
    Size(u64),
    Percent(f64),
    Flag(bool),
}

impl Cell {
    /// Text cell for an optional value, empty when absent.
    pub fn optional(value: Option<&str>) -> Self {
        Cell::Text(value.unwrap_or_default().to_string())
    }

    fn to_text(&self, human: bool) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Integer(value) => value.to_string(),
            Cell::Size(bytes) if human => humanize_bytes(*bytes),
            Cell::Size(bytes) => to_mebibytes(*bytes).to_string(),
            Cell::Percent(value) => format!("{:.2}", value),
            Cell::Flag(value) => value.to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Text(text) => Value::String(text.clone()),
            Cell::Integer(value) => Value::from(*value),
            Cell::Size(bytes) => Value::from(to_mebibytes(*bytes)),
            Cell::Percent(value) => Number::from_f64((value * 100.0).round() / 100.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Flag(value) => Value::Bool(*value),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

/// Rows of one view with a fixed column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl RowSet {
    pub fn new(columns: &[&'static str]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let index = self.columns.iter().position(|column| *column == name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }
}

/// Renders `rows` in the requested format. The result ends with a newline
/// unless it is empty.
///
/// # Errors
/// `InventoryError::Output` if encoding fails, `InventoryError::Argument` for
/// a CSV delimiter outside ASCII.
pub fn render(rows: &RowSet, options: &RenderOptions) -> InventoryResult<String> {
    match options.format {
        OutputFormat::Table => Ok(render_table(rows, options)),
        OutputFormat::Csv => render_csv(rows, options),
        OutputFormat::Json => render_json(rows),
    }
}

fn render_table(rows: &RowSet, options: &RenderOptions) -> String {
    let cells: Vec<Vec<String>> = rows
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_text(options.human)).collect())
        .collect();

    let mut widths: Vec<usize> = rows.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |values: Vec<&str>| {
        let line = values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = width))
            .collect::<Vec<_>>()
            .join(GUTTER);
        format!("{}\n", line.trim_end())
    };

    let mut out = String::new();
    if !options.no_header {
        out.push_str(&format_line(rows.columns.clone()));
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        out.push_str(&format_line(rule.iter().map(String::as_str).collect()));
    }
    for row in &cells {
        out.push_str(&format_line(row.iter().map(String::as_str).collect()));
    }
    out
}

fn render_csv(rows: &RowSet, options: &RenderOptions) -> InventoryResult<String> {
    if !options.delimiter.is_ascii() {
        return Err(InventoryError::Argument(format!(
            "CSV delimiter must be a single ASCII character, got {:?}",
            options.delimiter
        )));
    }
    let csv_error = |e: csv::Error| InventoryError::Output(format!("cannot write CSV: {}", e));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter as u8)
        .from_writer(Vec::new());
    if !options.no_header {
        writer.write_record(&rows.columns).map_err(csv_error)?;
    }
    for row in &rows.rows {
        writer
            .write_record(row.iter().map(|cell| cell.to_text(false)))
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| InventoryError::Output(format!("cannot flush CSV: {}", e.error())))?;
    String::from_utf8(bytes).map_err(|e| InventoryError::Output(e.to_string()))
}

fn render_json(rows: &RowSet) -> InventoryResult<String> {
    let objects: Vec<Value> = rows
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = rows
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.to_string(), cell.to_json()))
                .collect();
            Value::Object(object)
        })
        .collect();

    let mut out = serde_json::to_string_pretty(&Value::Array(objects))
        .map_err(|e| InventoryError::Output(e.to_string()))?;
    out.push('\n');
    Ok(out)
}
