use comfy_table::{Cell, Table};
use common::{Document, ID_FIELD};
use query::QueryOutput;
use serde_json::Value;

const MAX_DISPLAY_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn format_output(output: &QueryOutput, format: OutputFormat) -> String {
    match output {
        QueryOutput::Documents(documents) => match format {
            OutputFormat::Table => format_table(documents),
            OutputFormat::Json => format_json(output, documents.len()),
        },
        other => other.to_json().to_string(),
    }
}

pub fn print_output(output: &QueryOutput, format: OutputFormat) {
    println!("{}", format_output(output, format));
}

/// Column order: `_id` when any document has one, then every other field in
/// order of first appearance.
fn columns(documents: &[Document]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    if documents.iter().any(|document| document.contains_key(ID_FIELD)) {
        columns.push(ID_FIELD.to_string());
    }
    for document in documents {
        for field in document.keys() {
            if !columns.contains(field) {
                columns.push(field.clone());
            }
        }
    }
    columns
}

fn format_table(documents: &[Document]) -> String {
    let total = documents.len();
    let shown = &documents[..total.min(MAX_DISPLAY_ROWS)];
    let columns = columns(shown);

    let mut table = Table::new();
    table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
    for document in shown {
        let cells = columns
            .iter()
            .map(|column| Cell::new(format_cell(document.get(column))))
            .collect::<Vec<_>>();
        table.add_row(cells);
    }

    let mut output = if columns.is_empty() {
        String::new()
    } else {
        let mut rendered = table.to_string();
        rendered.push('\n');
        rendered
    };
    output.push_str(&documents_footer(total));

    let hidden = total.saturating_sub(MAX_DISPLAY_ROWS);
    if hidden > 0 {
        output.push('\n');
        output.push_str(&format!("... ({} documents hidden)", hidden));
    }
    output
}

fn format_json(output: &QueryOutput, count: usize) -> String {
    let body = serde_json::to_string_pretty(&output.to_json())
        .unwrap_or_else(|_| output.to_json().to_string());
    format!("{}\n{}", body, documents_footer(count))
}

fn documents_footer(count: usize) -> String {
    format!("({} documents)", count)
}

/// Missing fields render empty, null as `NULL`, strings raw, everything else
/// as compact JSON.
fn format_cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
