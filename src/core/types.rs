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

//! Data types for Rowsift values
//!
//! Defines the value kinds the engine works with and the numeric widening
//! order used for arithmetic promotion and IIF branch unification.

use std::fmt;

/// The kind of a runtime value
///
/// `Null` doubles as the "untyped" kind: a column whose sample values are all
/// NULL (or absent) infers as `Null` and no narrowing is applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// NULL / unknown type
    Null,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Exact decimal
    Decimal,
    /// UTF-8 text string
    Text,
    /// Boolean value
    Boolean,
    /// Calendar date and time (no timezone)
    Date,
    /// List of values (IN lists)
    List,
}

impl DataType {
    /// Returns true if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float | DataType::Decimal)
    }

    /// The wider of two numeric types: Decimal > Float > Integer
    ///
    /// Callers must ensure both types are numeric.
    pub fn wider(self, other: DataType) -> DataType {
        if self == DataType::Decimal || other == DataType::Decimal {
            DataType::Decimal
        } else if self == DataType::Float || other == DataType::Float {
            DataType::Float
        } else {
            DataType::Integer
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "null",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Text => "string",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::List => "list",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(DataType::Integer.is_numeric());
        assert!(DataType::Float.is_numeric());
        assert!(DataType::Decimal.is_numeric());
        assert!(!DataType::Text.is_numeric());
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::Null.is_numeric());
    }

    #[test]
    fn test_widening_order() {
        assert_eq!(
            DataType::Integer.wider(DataType::Float),
            DataType::Float
        );
        assert_eq!(
            DataType::Float.wider(DataType::Decimal),
            DataType::Decimal
        );
        assert_eq!(
            DataType::Integer.wider(DataType::Integer),
            DataType::Integer
        );
        assert_eq!(
            DataType::Decimal.wider(DataType::Integer),
            DataType::Decimal
        );
    }
}
