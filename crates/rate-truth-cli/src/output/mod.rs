pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into `parent.child` rows. Arrays of strings
/// (iteration logs, rationale) are left to the caller as separate sections.
pub(crate) fn flatten_rows(value: &Value) -> (Vec<(String, String)>, Vec<(String, Vec<String>)>) {
    let mut rows = Vec::new();
    let mut sections = Vec::new();
    flatten_into("", value, &mut rows, &mut sections);
    (rows, sections)
}

fn flatten_into(
    prefix: &str,
    value: &Value,
    rows: &mut Vec<(String, String)>,
    sections: &mut Vec<(String, Vec<String>)>,
) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, val, rows, sections);
            }
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
            let lines = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            sections.push((prefix.to_string(), lines));
        }
        other => rows.push((prefix.to_string(), scalar(other))),
    }
}

/// Render a leaf value without JSON quoting.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
