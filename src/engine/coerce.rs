// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Coercion engine: legacy-compatible comparison and conversion rules
//!
//! Pure functions over pairs of values. The rules reproduce the loosely-typed
//! comparison behavior of the legacy tabular-data filter engine:
//!
//! - equality is case-insensitive for strings, bit-exact f64 for numerics,
//!   and falls back to case-insensitive string-form comparison for mixed kinds
//! - `are_not_equal` is defined independently as `compare_values != 0`, NOT
//!   as the negation of `are_equal`; the two disagree on some mixed-kind edge
//!   cases and that asymmetry is intentional
//! - NULL sorts strictly before any non-NULL value
//! - relational ordering is undefined for boolean pairs

use std::cmp::Ordering;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::core::{default_of, parse_date, DataType, Error, Result, Value};

/// Case-insensitive ordinal comparison of two strings
fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}

/// Compare two f64 values with NaN sorting below everything
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ordering) => ordering,
        None => {
            if a.is_nan() && b.is_nan() {
                Ordering::Equal
            } else if a.is_nan() {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

/// Test two values for equality
///
/// Both NULL is equal; one NULL is not. Strings compare case-insensitively,
/// numerics compare as 64-bit floats with no epsilon tolerance, and any other
/// kind pairing falls back to case-insensitive string-form comparison.
pub fn are_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() && b.is_null() {
        return true;
    }
    if a.is_null() || b.is_null() {
        return false;
    }

    if let (Some(s1), Some(s2)) = (a.as_str(), b.as_str()) {
        return cmp_ignore_case(s1, s2) == Ordering::Equal;
    }

    if a.is_numeric() && b.is_numeric() {
        let d1 = a.as_f64().unwrap_or(f64::NAN);
        let d2 = b.as_f64().unwrap_or(f64::NAN);
        return d1 == d2;
    }

    let s1 = a.as_string().unwrap_or_default();
    let s2 = b.as_string().unwrap_or_default();
    cmp_ignore_case(&s1, &s2) == Ordering::Equal
}

/// Test two values for inequality
///
/// Defined as `compare_values != Equal`, independent of [`are_equal`].
pub fn are_not_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) != Ordering::Equal
}

/// Ordering comparison of two values
///
/// NULL sorts strictly before non-NULL (and equal to NULL). Numerics compare
/// as 64-bit floats, dates chronologically, everything else by
/// case-insensitive string form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if a.is_null() {
        return if b.is_null() {
            Ordering::Equal
        } else {
            Ordering::Less
        };
    }
    if b.is_null() {
        return Ordering::Greater;
    }

    if a.is_numeric() && b.is_numeric() {
        let d1 = a.as_f64().unwrap_or(f64::NAN);
        let d2 = b.as_f64().unwrap_or(f64::NAN);
        return cmp_f64(d1, d2);
    }

    if let (Value::Date(d1), Value::Date(d2)) = (a, b) {
        return d1.cmp(d2);
    }

    let s1 = a.as_string().unwrap_or_default();
    let s2 = b.as_string().unwrap_or_default();
    cmp_ignore_case(&s1, &s2)
}

/// Reject boolean operands for ordering comparisons
fn reject_boolean_pair(operator: &str, a: &Value, b: &Value) -> Result<()> {
    if matches!(a, Value::Boolean(_)) && matches!(b, Value::Boolean(_)) {
        return Err(Error::unsupported_operator(operator, "boolean"));
    }
    Ok(())
}

/// a < b, failing for boolean pairs
pub fn is_less_than(a: &Value, b: &Value) -> Result<bool> {
    reject_boolean_pair("<", a, b)?;
    Ok(compare_values(a, b) == Ordering::Less)
}

/// a > b, failing for boolean pairs
pub fn is_greater_than(a: &Value, b: &Value) -> Result<bool> {
    reject_boolean_pair(">", a, b)?;
    Ok(compare_values(a, b) == Ordering::Greater)
}

/// a <= b, failing for boolean pairs
pub fn is_less_or_equal(a: &Value, b: &Value) -> Result<bool> {
    reject_boolean_pair("<=", a, b)?;
    Ok(compare_values(a, b) != Ordering::Greater)
}

/// a >= b, failing for boolean pairs
pub fn is_greater_or_equal(a: &Value, b: &Value) -> Result<bool> {
    reject_boolean_pair(">=", a, b)?;
    Ok(compare_values(a, b) != Ordering::Less)
}

/// Convert a value to the target kind
///
/// - NULL converts to the target's default (zero, false, the minimum date);
///   reference kinds (text, list) stay NULL
/// - a value already of the target kind passes through
/// - strings parse strictly; unparsable text is a conversion error
/// - numerics cast between numeric kinds (truncating toward zero)
/// - anything else is a conversion error naming the value and target
pub fn convert_to_best_type(value: &Value, target: DataType) -> Result<Value> {
    if value.is_null() {
        return Ok(default_of(target));
    }

    if value.data_type() == target || target == DataType::Null {
        return Ok(value.clone());
    }

    if let Value::Text(s) = value {
        return parse_text(s, target);
    }

    match target {
        DataType::Integer => value
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::conversion(value.to_string(), target)),
        DataType::Float => value
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| Error::conversion(value.to_string(), target)),
        DataType::Decimal => match value {
            Value::Integer(v) => Ok(Value::Decimal(Decimal::from(*v))),
            Value::Float(v) => Decimal::from_f64(*v)
                .map(Value::Decimal)
                .ok_or_else(|| Error::conversion(value.to_string(), target)),
            _ => Err(Error::conversion(value.to_string(), target)),
        },
        _ => Err(Error::conversion(value.to_string(), target)),
    }
}

/// Strict string-to-kind parsing used by conversions
fn parse_text(s: &str, target: DataType) -> Result<Value> {
    let trimmed = s.trim();
    match target {
        DataType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| Error::conversion(s, target)),
        DataType::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::conversion(s, target)),
        DataType::Decimal => trimmed
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| Error::conversion(s, target)),
        DataType::Boolean => {
            let lower = trimmed.to_lowercase();
            if lower == "true" || lower == "1" {
                Ok(Value::Boolean(true))
            } else if lower == "false" || lower == "0" {
                Ok(Value::Boolean(false))
            } else {
                Err(Error::conversion(s, target))
            }
        }
        DataType::Date => parse_date(trimmed).map(Value::Date),
        _ => Err(Error::conversion(s, target)),
    }
}

/// General-purpose conversion backing the CONVERT function
///
/// More permissive than [`convert_to_best_type`]: any kind converts to its
/// string form, booleans convert to 0/1, and numerics round to integers.
/// NULL still yields the target's default, and unparsable text or a
/// kind pairing with no sensible conversion (a date to a number) is still a
/// conversion error.
pub fn change_type(value: &Value, target: DataType) -> Result<Value> {
    if value.is_null() {
        return Ok(default_of(target));
    }

    if value.data_type() == target || target == DataType::Null {
        return Ok(value.clone());
    }

    if target == DataType::Text {
        return value
            .as_string()
            .map(Value::text)
            .ok_or_else(|| Error::conversion(value.to_string(), target));
    }

    if let Value::Text(s) = value {
        return parse_text(s, target);
    }

    match (value, target) {
        (Value::Boolean(b), DataType::Integer) => Ok(Value::Integer(i64::from(*b))),
        (Value::Boolean(b), DataType::Float) => Ok(Value::Float(f64::from(u8::from(*b)))),
        (Value::Boolean(b), DataType::Decimal) => {
            Ok(Value::Decimal(Decimal::from(i64::from(*b))))
        }
        (Value::Integer(v), DataType::Boolean) => Ok(Value::Boolean(*v != 0)),
        (Value::Float(v), DataType::Boolean) => Ok(Value::Boolean(*v != 0.0)),
        (Value::Decimal(d), DataType::Boolean) => Ok(Value::Boolean(!d.is_zero())),
        (Value::Float(v), DataType::Integer) => Ok(Value::Integer(v.round() as i64)),
        (Value::Decimal(d), DataType::Integer) => d
            .round()
            .to_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::conversion(value.to_string(), target)),
        _ => convert_to_best_type(value, target),
    }
}

/// Coerce a value to boolean: booleans unwrap, numerics are true when
/// non-zero, everything else fails
pub fn to_truthy(value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(v) => Ok(*v != 0),
        Value::Float(v) => Ok(*v != 0.0),
        Value::Decimal(d) => Ok(!d.is_zero()),
        Value::Null(_) => Err(Error::Type(
            "cannot convert NULL to boolean".to_string(),
        )),
        other => Err(Error::Type(format!(
            "cannot convert value of type '{}' to boolean",
            other.data_type()
        ))),
    }
}

/// Numeric promotion to f64 for arithmetic; NULL promotes to zero
pub fn to_arith_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Null(_) => Ok(0.0),
        Value::Integer(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        Value::Decimal(d) => Ok(d.to_f64().unwrap_or(f64::NAN)),
        other => Err(Error::conversion(other.to_string(), DataType::Float)),
    }
}

/// Numeric promotion to Decimal for arithmetic; NULL promotes to zero
pub fn to_arith_decimal(value: &Value) -> Result<Decimal> {
    match value {
        Value::Null(_) => Ok(Decimal::ZERO),
        Value::Integer(v) => Ok(Decimal::from(*v)),
        Value::Float(v) => Decimal::from_f64(*v)
            .ok_or_else(|| Error::conversion(v.to_string(), DataType::Decimal)),
        Value::Decimal(d) => Ok(*d),
        other => Err(Error::conversion(other.to_string(), DataType::Decimal)),
    }
}
