use serde_json::Value;

use super::scalar;

/// Headline figure per command, in priority order.
const PRIORITY: [&str; 5] = [
    "/final_apr",
    "/apr",
    "/periodic_rate",
    "/annualized/value",
    "/net_disbursement",
];

/// Print just the headline number: the final APR for an analysis, the rate
/// for a solve, the yearly figure for an annualization.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);

    let headline = PRIORITY
        .iter()
        .filter_map(|pointer| result.pointer(pointer))
        .find(|v| !v.is_null());

    match headline {
        Some(v) => println!("{}", scalar(v)),
        None => println!("{}", scalar(result)),
    }
}
