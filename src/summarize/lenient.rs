//! Number fields as models actually write them: sometimes quoted,
//! sometimes with a trailing `.0`.

use serde::{Deserialize, Deserializer, de::Error};
use serde_json::Value;

fn parse_f64(value: &Value) -> Option<Option<f64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => n.as_f64().map(Some),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => s.trim().parse().ok().map(Some),
        _ => None,
    }
}

fn parse_i64(value: &Value) -> Option<Option<i64>> {
    if let Some(i) = value.as_i64() {
        return Some(Some(i));
    }
    if let Value::String(s) = value
        && let Ok(i) = s.trim().parse::<i64>()
    {
        return Some(Some(i));
    }
    // Integral floats only, 1.5 is not a count
    match parse_f64(value)? {
        None => Some(None),
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Some(Some(f as i64))
        }
        Some(_) => None,
    }
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_f64(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_i64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", value)))
}
