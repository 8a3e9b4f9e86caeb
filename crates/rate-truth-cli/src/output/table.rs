use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::flatten_rows;

/// Format the result as a field/value table, followed by the multi-line
/// parts (explanation, iteration log, warnings) printed as plain text.
pub fn print_table(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    let (rows, sections) = flatten_rows(result);

    let (text, rows): (Vec<_>, Vec<_>) = rows.into_iter().partition(|(_, v)| v.contains('\n'));

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));

    for (name, body) in text {
        println!("\n{}:\n{}", name, body);
    }

    for (name, lines) in sections {
        println!("\n{}:", name);
        for line in lines {
            println!("  {}", line);
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
