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

//! Fixed scalar function library
//!
//! The runtime half of the function library: LEN, TRIM, SUBSTRING, and
//! ISNULL evaluate here. IIF and CONVERT compile to dedicated instruction
//! sequences, and aggregate names are rejected at build time, so neither
//! appears in this enum.
//!
//! Runtime rule: data-shape surprises with a defined null fallback return
//! NULL instead of failing the evaluation. SUBSTRING with out-of-range
//! bounds and TRIM of NULL both yield NULL.

use crate::core::{DataType, Result, Value};

/// A scalar function resolvable at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// LEN(x): string length of the string form; NULL yields 0
    Len,
    /// TRIM(x): string form with surrounding whitespace removed
    Trim,
    /// SUBSTRING(x, start, length): 1-based substring, NULL on bad bounds
    Substring,
    /// ISNULL(x, replacement): string form of x, or replacement when NULL
    IsNull,
}

impl Function {
    /// Resolve an (upper-cased) function name
    pub fn resolve(name: &str) -> Option<Function> {
        match name {
            "LEN" => Some(Function::Len),
            "TRIM" => Some(Function::Trim),
            "SUBSTRING" => Some(Function::Substring),
            "ISNULL" => Some(Function::IsNull),
            _ => None,
        }
    }

    /// The function's name, for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Function::Len => "LEN",
            Function::Trim => "TRIM",
            Function::Substring => "SUBSTRING",
            Function::IsNull => "ISNULL",
        }
    }

    /// Required argument count
    pub fn arity(&self) -> usize {
        match self {
            Function::Len | Function::Trim => 1,
            Function::IsNull => 2,
            Function::Substring => 3,
        }
    }

    /// The function's statically known result kind
    pub fn result_kind(&self) -> DataType {
        match self {
            Function::Len => DataType::Integer,
            Function::Trim | Function::Substring | Function::IsNull => DataType::Text,
        }
    }

    /// Evaluate the function over its arguments
    pub fn eval(&self, args: &[Value]) -> Result<Value> {
        match self {
            Function::Len => Ok(eval_len(&args[0])),
            Function::Trim => Ok(eval_trim(&args[0])),
            Function::Substring => Ok(eval_substring(&args[0], &args[1], &args[2])),
            Function::IsNull => Ok(eval_isnull(&args[0], &args[1])),
        }
    }
}

fn eval_len(value: &Value) -> Value {
    match value.as_string() {
        Some(s) => Value::integer(s.chars().count() as i64),
        None => Value::integer(0),
    }
}

fn eval_trim(value: &Value) -> Value {
    match value.as_string() {
        Some(s) => Value::text(s.trim()),
        None => Value::null(DataType::Text),
    }
}

fn eval_substring(value: &Value, start: &Value, length: &Value) -> Value {
    let Some(s) = value.as_string() else {
        return Value::null(DataType::Text);
    };

    // 1-based start converted to 0-based; a NULL bound behaves as zero
    let start = start.as_i64().map(|v| v - 1).unwrap_or(0);
    let length = length.as_i64().unwrap_or(0);

    let chars: Vec<char> = s.chars().collect();
    let str_len = chars.len() as i64;

    if start < 0 || length < 0 || start > str_len || start + length > str_len {
        return Value::null(DataType::Text);
    }

    let taken: String = chars[start as usize..(start + length) as usize]
        .iter()
        .collect();
    Value::text(taken)
}

fn eval_isnull(value: &Value, replacement: &Value) -> Value {
    let result = if value.is_null() {
        replacement.as_string()
    } else {
        value.as_string()
    };
    match result {
        Some(s) => Value::text(s),
        None => Value::null(DataType::Text),
    }
}

/// Aggregate function names, recognized and always rejected: this engine is
/// strictly per-row
pub fn is_aggregate(name: &str) -> bool {
    matches!(
        name,
        "SUM" | "AVG" | "MIN" | "MAX" | "COUNT" | "STDEV" | "VAR"
    )
}

/// Map a CONVERT type-name literal to a value kind
///
/// Accepts both the platform-style names the legacy engine used
/// (`System.Int32`) and plain names (`int`, `string`, ...).
pub fn convert_target(type_name: &str) -> Option<DataType> {
    match type_name.to_lowercase().as_str() {
        "system.int16" | "system.int32" | "system.int64" | "short" | "int" | "integer"
        | "long" => Some(DataType::Integer),
        "system.single" | "system.double" | "float" | "double" => Some(DataType::Float),
        "system.decimal" | "decimal" => Some(DataType::Decimal),
        "system.string" | "string" | "text" => Some(DataType::Text),
        "system.boolean" | "bool" | "boolean" => Some(DataType::Boolean),
        "system.datetime" | "datetime" | "date" => Some(DataType::Date),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(eval_len(&Value::text("Alice")), Value::integer(5));
        assert_eq!(eval_len(&Value::integer(1234)), Value::integer(4));
        assert_eq!(eval_len(&Value::null_unknown()), Value::integer(0));
        assert_eq!(eval_len(&Value::text("")), Value::integer(0));
    }

    #[test]
    fn test_trim() {
        assert_eq!(eval_trim(&Value::text("  ab  ")), Value::text("ab"));
        assert_eq!(eval_trim(&Value::integer(5)), Value::text("5"));
        assert!(eval_trim(&Value::null_unknown()).is_null());
    }

    #[test]
    fn test_substring_basic() {
        assert_eq!(
            eval_substring(
                &Value::text("abcdef"),
                &Value::integer(2),
                &Value::integer(3)
            ),
            Value::text("bcd")
        );
        assert_eq!(
            eval_substring(
                &Value::text("abc"),
                &Value::integer(1),
                &Value::integer(3)
            ),
            Value::text("abc")
        );
    }

    #[test]
    fn test_substring_bad_bounds_yield_null() {
        // start beyond string end
        assert!(eval_substring(
            &Value::text("abc"),
            &Value::integer(10),
            &Value::integer(1)
        )
        .is_null());
        // start + length beyond string end
        assert!(eval_substring(
            &Value::text("abc"),
            &Value::integer(2),
            &Value::integer(5)
        )
        .is_null());
        // zero start (adjusted to -1)
        assert!(eval_substring(
            &Value::text("abc"),
            &Value::integer(0),
            &Value::integer(1)
        )
        .is_null());
        // negative length
        assert!(eval_substring(
            &Value::text("abc"),
            &Value::integer(1),
            &Value::integer(-1)
        )
        .is_null());
        // null input
        assert!(eval_substring(
            &Value::null_unknown(),
            &Value::integer(1),
            &Value::integer(1)
        )
        .is_null());
    }

    #[test]
    fn test_substring_null_bounds_behave_as_zero() {
        assert_eq!(
            eval_substring(
                &Value::text("abc"),
                &Value::null_unknown(),
                &Value::integer(2)
            ),
            Value::text("ab")
        );
        assert_eq!(
            eval_substring(
                &Value::text("abc"),
                &Value::integer(2),
                &Value::null_unknown()
            ),
            Value::text("")
        );
    }

    #[test]
    fn test_isnull() {
        assert_eq!(
            eval_isnull(&Value::text("x"), &Value::text("y")),
            Value::text("x")
        );
        assert_eq!(
            eval_isnull(&Value::null_unknown(), &Value::text("y")),
            Value::text("y")
        );
        // non-string values come back in string form
        assert_eq!(
            eval_isnull(&Value::integer(5), &Value::text("y")),
            Value::text("5")
        );
        assert!(eval_isnull(&Value::null_unknown(), &Value::null_unknown()).is_null());
    }

    #[test]
    fn test_resolve_and_arity() {
        assert_eq!(Function::resolve("LEN"), Some(Function::Len));
        assert_eq!(Function::resolve("SUBSTRING"), Some(Function::Substring));
        assert_eq!(Function::resolve("NOPE"), None);
        assert_eq!(Function::Substring.arity(), 3);
        assert_eq!(Function::IsNull.arity(), 2);
    }

    #[test]
    fn test_aggregates_recognized() {
        for name in ["SUM", "AVG", "MIN", "MAX", "COUNT", "STDEV", "VAR"] {
            assert!(is_aggregate(name));
        }
        assert!(!is_aggregate("LEN"));
    }

    #[test]
    fn test_convert_target_names() {
        assert_eq!(convert_target("System.Int32"), Some(DataType::Integer));
        assert_eq!(convert_target("int"), Some(DataType::Integer));
        assert_eq!(convert_target("System.Double"), Some(DataType::Float));
        assert_eq!(convert_target("decimal"), Some(DataType::Decimal));
        assert_eq!(convert_target("System.String"), Some(DataType::Text));
        assert_eq!(convert_target("bool"), Some(DataType::Boolean));
        assert_eq!(convert_target("System.DateTime"), Some(DataType::Date));
        assert_eq!(convert_target("System.Guid"), None);
    }
}
