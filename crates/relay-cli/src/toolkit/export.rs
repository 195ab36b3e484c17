//! Tabular exporters.

use async_trait::async_trait;
use relay_runtime::{ToolContext, ToolHandler};
use relay_types::{Outcome, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input shared by the table exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableArgs {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl TableArgs {
    fn check_widths(&self) -> Result<(), String> {
        let width = self.headers.len();
        match self.rows.iter().position(|row| row.len() != width) {
            Some(index) => Err(format!(
                "row {index} has {} cells, expected {width}",
                self.rows[index].len()
            )),
            None => Ok(()),
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub(crate) fn render_csv(table: &TableArgs) -> String {
    let mut out = String::new();
    let header: Vec<String> = table.headers.iter().map(|h| csv_field(h)).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| csv_field(&cell_text(c))).collect();
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }
    out
}

fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn render_latex(table: &TableArgs) -> String {
    let columns = "l".repeat(table.headers.len().max(1));
    let mut out = format!("\\begin{{tabular}}{{{columns}}}\n\\hline\n");
    let header: Vec<String> = table.headers.iter().map(|h| latex_escape(h)).collect();
    out.push_str(&format!("{} \\\\\n\\hline\n", header.join(" & ")));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| latex_escape(&cell_text(c))).collect();
        out.push_str(&format!("{} \\\\\n", cells.join(" & ")));
    }
    out.push_str("\\hline\n\\end{tabular}\n");
    out
}

/// Renders a table as CSV. Ragged rows produce a failed outcome.
pub struct CsvExport;

#[async_trait]
impl ToolHandler for CsvExport {
    async fn call(&self, args: Value, _ctx: ToolContext) -> Result<Outcome, ToolError> {
        let table: TableArgs =
            serde_json::from_value(args).map_err(|e| ToolError::new(e.to_string()))?;
        if let Err(message) = table.check_widths() {
            return Ok(Outcome::failure(message));
        }
        Ok(Outcome::ok(render_csv(&table)))
    }
}

/// Renders a table as a LaTeX `tabular` environment.
pub struct LatexTable;

#[async_trait]
impl ToolHandler for LatexTable {
    async fn call(&self, args: Value, _ctx: ToolContext) -> Result<Outcome, ToolError> {
        let table: TableArgs =
            serde_json::from_value(args).map_err(|e| ToolError::new(e.to_string()))?;
        if let Err(message) = table.check_widths() {
            return Ok(Outcome::failure(message));
        }
        Ok(Outcome::ok(render_latex(&table)))
    }
}
