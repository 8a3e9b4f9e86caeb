use serde_json::Value;
use std::io;

use super::flatten_rows;

/// Write the result as two-column `field,value` CSV to stdout. String lists
/// such as the iteration log become one row per line, numbered.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    let (rows, sections) = flatten_rows(result);

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in &rows {
        let _ = wtr.write_record([key.as_str(), val.as_str()]);
    }
    for (name, lines) in &sections {
        for (i, line) in lines.iter().enumerate() {
            let _ = wtr.write_record([format!("{name}[{i}]").as_str(), line.as_str()]);
        }
    }
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for (i, w) in warnings.iter().enumerate() {
            if let Some(s) = w.as_str() {
                let _ = wtr.write_record([format!("warnings[{i}]").as_str(), s]);
            }
        }
    }

    let _ = wtr.flush();
}
