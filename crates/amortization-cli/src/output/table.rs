use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_cell, headers, split_rows};

/// Format output as tables using the tabled crate: one Field/Value table for
/// the summary figures and one table per row set (e.g. the schedule).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_object(result);
                print_envelope_notes(map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_object(map: &Map<String, Value>) {
    let (scalars, row_sets) = split_rows(map);

    if !scalars.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in scalars {
            builder.push_record([key.to_string(), format_cell(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (name, rows) in row_sets {
        println!("\n{}:", name);
        print_rows(rows);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let cols = headers(rows);
    if cols.is_empty() {
        for item in rows {
            println!("{}", format_cell(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(cols.iter().cloned());
    for item in rows {
        if let Value::Object(row) = item {
            builder.push_record(
                cols.iter()
                    .map(|h| row.get(h.as_str()).map(format_cell).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
