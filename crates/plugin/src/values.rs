//! Conversion between Nushell values and the JSON values sent to and
//! received from the agent.

use jmx_client::{MBeanValue, Params};
use nu_protocol::{Record, Span, Value};
use serde_json::{Map, Number};

/// Nushell → JSON.  Types without a JSON counterpart (dates, file sizes,
/// durations, ranges…) are sent as their display string.
pub fn to_json(value: &Value) -> MBeanValue {
    match value {
        Value::Nothing { .. } => MBeanValue::Null,
        Value::Bool { val, .. } => MBeanValue::Bool(*val),
        Value::Int { val, .. } => MBeanValue::Number((*val).into()),
        Value::Float { val, .. } => Number::from_f64(*val)
            .map(MBeanValue::Number)
            .unwrap_or(MBeanValue::Null),
        Value::String { val, .. } => MBeanValue::String(val.clone()),
        Value::List { vals, .. } => MBeanValue::Array(vals.iter().map(to_json).collect()),
        Value::Record { val, .. } => MBeanValue::Object(
            val.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        other => MBeanValue::String(other.to_expanded_string(", ", &nu_protocol::Config::default())),
    }
}

/// `--params`: a Nushell list becomes positional arguments, anything else
/// a single argument.
pub fn to_params(value: &Value) -> Params {
    match value {
        Value::List { vals, .. } => Params::List(vals.iter().map(to_json).collect()),
        other => Params::Single(to_json(other)),
    }
}

/// JSON → Nushell.  Integers that do not fit an `i64` become floats.
pub fn from_json(value: &MBeanValue, span: Span) -> Value {
    match value {
        MBeanValue::Null => Value::nothing(span),
        MBeanValue::Bool(b) => Value::bool(*b, span),
        MBeanValue::Number(n) => match n.as_i64() {
            Some(i) => Value::int(i, span),
            None => Value::float(n.as_f64().unwrap_or(f64::NAN), span),
        },
        MBeanValue::String(s) => Value::string(s, span),
        MBeanValue::Array(items) => {
            Value::list(items.iter().map(|v| from_json(v, span)).collect(), span)
        }
        MBeanValue::Object(map) => {
            let mut record = Record::new();
            for (k, v) in map {
                record.push(k, from_json(v, span));
            }
            Value::record(record, span)
        }
    }
}
