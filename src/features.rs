use std::collections::BTreeMap;

use serde_json::Value;

use crate::stats::BattingRow;

/// Columns that travel with a batting row but are training targets, never inputs.
pub const TARGET_COLUMNS: [&str; 1] = ["Real_OPS"];

pub fn coerce_numeric(value: &Value) -> f64 {
    let v = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if v.is_finite() { v } else { 0.0 }
}

pub fn align_features(row: &BTreeMap<String, Value>, order: &[String]) -> Vec<f64> {
    order
        .iter()
        .map(|name| {
            if TARGET_COLUMNS.contains(&name.as_str()) {
                return 0.0;
            }
            row.get(name).map(coerce_numeric).unwrap_or(0.0)
        })
        .collect()
}

impl BattingRow {
    pub fn aligned(&self, order: &[String]) -> Vec<f64> {
        align_features(&self.columns, order)
    }
}
