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

//! Value type for Rowsift - runtime values with type information
//!
//! This module provides a unified Value enum that represents expression
//! values with full type information and conversion capabilities.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::{Error, Result};
use super::types::DataType;

/// Date formats supported for parsing
/// Order matters - more specific formats first
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f", // ISO with fractional seconds
    "%Y-%m-%dT%H:%M:%S",    // ISO without timezone
    "%Y-%m-%d %H:%M:%S%.f", // SQL-style with fractional seconds
    "%Y-%m-%d %H:%M:%S",    // SQL-style
    "%m/%d/%Y %H:%M:%S",    // US format with time
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // ISO date only
    "%Y/%m/%d", // Alternative with slashes
    "%m/%d/%Y", // US format
];

/// A runtime value with type information
///
/// Each variant carries its data directly. Text uses Arc<str> for cheap
/// cloning during row filtering, where values are cloned frequently.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value with optional type hint
    Null(DataType),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// Exact decimal
    Decimal(Decimal),

    /// UTF-8 text string (Arc for cheap cloning)
    Text(Arc<str>),

    /// Boolean value
    Boolean(bool),

    /// Calendar date and time
    Date(NaiveDateTime),

    /// List of values (Arc for cheap cloning)
    List(Arc<[Value]>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a NULL value with a type hint
    pub fn null(data_type: DataType) -> Self {
        Value::Null(data_type)
    }

    /// Create a NULL value with unknown type
    pub fn null_unknown() -> Self {
        Value::Null(DataType::Null)
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    /// Create a float value
    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    /// Create a decimal value
    pub fn decimal(value: Decimal) -> Self {
        Value::Decimal(value)
    }

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create a text value from Arc<str> (zero-copy)
    pub fn text_arc(value: Arc<str>) -> Self {
        Value::Text(value)
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a date value
    pub fn date(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }

    /// Create a list value
    pub fn list(values: impl Into<Arc<[Value]>>) -> Self {
        Value::List(values.into())
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// Returns the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null(dt) => *dt,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Decimal(_) => DataType::Decimal,
            Value::Text(_) => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
            Value::Date(_) => DataType::Date,
            Value::List(_) => DataType::List,
        }
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Returns true if this value is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    // =========================================================================
    // Value extractors
    // =========================================================================

    /// Extract as f64 (numeric kinds only)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Extract as i64 with truncation (numeric kinds only)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Decimal(d) => d.trunc().to_i64(),
            _ => None,
        }
    }

    /// Extract as string reference (avoids clone for Text)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as String, with string-form coercion
    ///
    /// Returns None only for NULL and lists.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null(_) => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Decimal(d) => Some(d.to_string()),
            Value::Text(s) => Some(s.to_string()),
            Value::Boolean(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Value::Date(d) => Some(d.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::List(_) => None,
        }
    }

    /// Extract as NaiveDateTime
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "NULL"),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            other => write!(f, "{}", other.as_string().unwrap_or_default()),
        }
    }
}

/// The default value of a data type, used when NULL is converted to a value
/// kind: zero for numerics, false for booleans, the minimum date for dates.
/// Reference kinds (text, list) stay NULL.
pub fn default_of(data_type: DataType) -> Value {
    match data_type {
        DataType::Integer => Value::Integer(0),
        DataType::Float => Value::Float(0.0),
        DataType::Decimal => Value::Decimal(Decimal::ZERO),
        DataType::Boolean => Value::Boolean(false),
        DataType::Date => Value::Date(min_date()),
        DataType::Text | DataType::List | DataType::Null => Value::Null(data_type),
    }
}

/// The minimum representable calendar date, 0001-01-01 00:00:00
fn min_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

/// Parse a date or datetime string using the supported format list
pub fn parse_date(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(Error::conversion(text, DataType::Date))
}
