use serde_json::{Map, Value};
use std::io;

use super::{format_cell, headers, split_rows};

/// Write output as CSV to stdout.
///
/// A result carrying a schedule is written one row per month; anything else
/// becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_object(&mut wtr, body);
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_cell(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_object<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let (scalars, row_sets) = split_rows(map);

    // CSV holds one table; the first row set wins
    if let Some((_, rows)) = row_sets.first() {
        write_rows(wtr, rows);
        return;
    }

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in scalars {
        let _ = wtr.write_record([key, format_cell(val).as_str()]);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let cols = headers(rows);
    if cols.is_empty() {
        for item in rows {
            let _ = wtr.write_record([&format_cell(item)]);
        }
        return;
    }

    let _ = wtr.write_record(&cols);
    for item in rows {
        if let Value::Object(row) = item {
            let record: Vec<String> = cols
                .iter()
                .map(|h| row.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}
