use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, scalar};

/// Format an envelope as tables: scalar result fields first, then one table
/// per list of records (proposals, placements, holdings), then warnings and
/// methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_result(result);
                print_footer(map);
            }
            _ => print_fields(flatten(value)),
        },
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>) {
    let mut fields = Vec::new();
    let mut lists = Vec::new();
    for (key, val) in result {
        match val {
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => lists.push((key, arr)),
            _ => {
                for (path, v) in flatten(val) {
                    let field = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{key}.{path}")
                    };
                    fields.push((field, v));
                }
            }
        }
    }
    print_fields(fields);

    for (title, records) in lists {
        println!("\n{title}:");
        print_records(records);
    }
}

fn print_fields(fields: Vec<(String, String)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, val) in fields {
        builder.push_record([field, val]);
    }
    println!("{}", Table::from(builder));
}

/// One row per record, columns from the first record's flattened keys.
fn print_records(records: &[Value]) {
    if records.is_empty() {
        println!("(empty)");
        return;
    }
    let rows: Vec<Vec<(String, String)>> = records.iter().map(flatten).collect();
    let headers: Vec<String> = rows[0].iter().map(|(k, _)| k.clone()).collect();

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                println!("  - {}", scalar(w));
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
