//! Conversion of dynamically-shaped result sets into JSON maps.
//!
//! Stored procedures own their result shapes, so the API cannot bind rows to
//! static structs; instead each column is probed against the common Postgres
//! types and relayed as a `serde_json` value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row};
use uuid::Uuid;

/// Convert a batch of rows into JSON objects keyed by column name
pub fn rows_to_json(rows: &[PgRow]) -> Vec<Map<String, Value>> {
    rows.iter().map(row_to_json).collect()
}

/// Convert a single row into a JSON object keyed by column name
pub fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for i in 0..row.len() {
        let column_name = row.column(i).name();
        map.insert(column_name.to_string(), column_to_json(row, i));
    }
    map
}

fn column_to_json(row: &PgRow, i: usize) -> Value {
    // Native JSON columns come through as-is
    if let Ok(v) = row.try_get::<Option<Value>, _>(i) {
        return v.unwrap_or(Value::Null);
    }

    // Probe the scalar types the plant procedures actually return
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(i) {
        return v
            .map(|d| {
                // Keep NUMERIC precision by serializing through the decimal's
                // own string form, falling back to f64 when not representable
                serde_json::from_str::<Number>(&d.to_string())
                    .map(Value::Number)
                    .unwrap_or_else(|_| Value::String(d.to_string()))
            })
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Uuid>, _>(i) {
        return v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(i) {
        return v.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(i) {
        return v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(i) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }

    Value::Null
}
