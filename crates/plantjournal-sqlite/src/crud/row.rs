//! Parameter binding and row decoding

use crate::error::StoreResult;
use crate::registry::Decode;
use plantjournal_query::{RenderedQuery, SqlParam};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Number, Value};

/// Attribute alias to JSON value
pub type Row = Map<String, Value>;

pub(crate) fn to_sql(params: &[SqlParam]) -> Vec<SqlValue> {
    params
        .iter()
        .map(|p| match p {
            SqlParam::Null => SqlValue::Null,
            SqlParam::Integer(i) => SqlValue::Integer(*i),
            SqlParam::Real(f) => SqlValue::Real(*f),
            SqlParam::Text(s) => SqlValue::Text(s.clone()),
        })
        .collect()
}

/// Run a rendered query and decode every column with its decoder
pub(crate) fn query_rows(
    conn: &Connection,
    query: &RenderedQuery,
    decoders: &[Decode],
) -> StoreResult<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let mut rows = stmt.query(params_from_iter(to_sql(&query.params)))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(decoders.len());
        for (i, decode) in decoders.iter().enumerate() {
            values.push(decode_value(row.get_ref(i)?, *decode));
        }
        out.push(values);
    }
    Ok(out)
}

/// Single integer column, e.g. ids
pub(crate) fn query_ids(conn: &Connection, query: &RenderedQuery) -> StoreResult<Vec<i64>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let ids = stmt
        .query_map(params_from_iter(to_sql(&query.params)), |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

pub(crate) fn decode_value(value: ValueRef<'_>, decode: Decode) -> Value {
    match decode {
        Decode::Plain => plain(value),
        Decode::Json => match value {
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
            }
            other => plain(other),
        },
        Decode::IdList => match value {
            ValueRef::Text(bytes) => {
                let mut ids: Vec<i64> = String::from_utf8_lossy(bytes)
                    .split(',')
                    .filter_map(|id| id.trim().parse().ok())
                    .collect();
                ids.sort_unstable();
                Value::from(ids)
            }
            ValueRef::Integer(id) => Value::from(vec![id]),
            _ => Value::Array(Vec::new()),
        },
    }
}

fn plain(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
