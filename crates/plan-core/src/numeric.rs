//! Lenient numeric coercion for scenario inputs.
//!
//! Values arrive from hand-edited files and table editors, so a field may be a
//! JSON number, a numeric string, a blank string or `null`. Anything that does
//! not parse as a finite number becomes zero instead of failing the load.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// Coerce an arbitrary JSON value into a decimal, defaulting to zero.
pub fn coerce_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Decimal::from(i);
            }
            if let Some(u) = n.as_u64() {
                return Decimal::from(u);
            }
            n.as_f64().map(decimal_from_f64).unwrap_or(Decimal::ZERO)
        }
        Value::String(s) => parse_decimal(s),
        Value::Null => Decimal::ZERO,
        other => {
            warn!(value = %other, "non-numeric input coerced to 0");
            Decimal::ZERO
        }
    }
}

/// Parse a user supplied string. Blank, `NaN`, infinite or garbage input yields zero.
pub fn parse_decimal(raw: &str) -> Decimal {
    let s = raw.trim();
    if s.is_empty() {
        return Decimal::ZERO;
    }
    if let Ok(d) = Decimal::from_str(s) {
        return d;
    }
    match s.parse::<f64>() {
        Ok(f) => decimal_from_f64(f),
        Err(_) => {
            warn!(input = s, "unparseable number coerced to 0");
            Decimal::ZERO
        }
    }
}

/// Convert a float, mapping NaN, infinities and out-of-range values to zero.
pub fn decimal_from_f64(f: f64) -> Decimal {
    if !f.is_finite() {
        warn!(value = f, "non-finite number coerced to 0");
        return Decimal::ZERO;
    }
    Decimal::from_f64(f).unwrap_or(Decimal::ZERO)
}

/// Serde adapter for decimal fields.
pub fn lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_decimal(&value))
}

/// Serde adapter for whole-number fields (years, months). Negative values clamp to 0,
/// fractions are truncated.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let d = coerce_decimal(&value).trunc();
    if d <= Decimal::ZERO {
        return Ok(0);
    }
    Ok(d.to_u32().unwrap_or(u32::MAX))
}
