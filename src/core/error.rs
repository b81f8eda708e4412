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

//! Error types for Rowsift
//!
//! This module defines all error types used throughout the engine.

use thiserror::Error;

use super::types::DataType;

/// Result type alias for Rowsift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for expression compilation and evaluation
///
/// Covers the whole taxonomy: syntax errors from the front end, semantic
/// errors raised during compilation, conversion errors from literal coercion,
/// and runtime lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Syntax errors
    // =========================================================================
    /// Malformed expression text, reported by the front end
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    // =========================================================================
    // Semantic errors
    // =========================================================================
    /// Column not found in the row or declared record type
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Operator cannot be applied to operands of this kind
    #[error("operator '{operator}' not supported for type '{type_name}'")]
    UnsupportedOperator {
        operator: String,
        type_name: String,
    },

    /// Function called with the wrong number of arguments
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    /// Operation not supported (aggregates, non-constant IN lists, ...)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Type error (truthiness failures, incompatible IIF branches, ...)
    #[error("type error: {0}")]
    Type(String),

    // =========================================================================
    // Conversion errors
    // =========================================================================
    /// Value cannot be coerced to the required kind
    #[error("cannot convert '{value}' to {target}")]
    Conversion { value: String, target: DataType },

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Internal error for unexpected conditions
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create a new Syntax error
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a new UnsupportedOperator error
    pub fn unsupported_operator(
        operator: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Error::UnsupportedOperator {
            operator: operator.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a new Conversion error
    pub fn conversion(value: impl Into<String>, target: DataType) -> Self {
        Error::Conversion {
            value: value.into(),
            target,
        }
    }

    /// Create a new Arity error
    pub fn arity(function: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::Arity {
            function: function.into(),
            expected,
            got,
        }
    }

    /// Create a new NotSupported error
    pub fn not_supported(message: impl Into<String>) -> Self {
        Error::NotSupported(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Check if this is a syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    /// Check if this is a semantic error (bad column, operator, or arity)
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            Error::ColumnNotFound(_)
                | Error::UnsupportedOperator { .. }
                | Error::Arity { .. }
                | Error::NotSupported(_)
                | Error::Type(_)
        )
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::syntax("unexpected token ')'", 1, 12).to_string(),
            "syntax error at line 1, column 12: unexpected token ')'"
        );
        assert_eq!(
            Error::ColumnNotFound("Age".to_string()).to_string(),
            "column 'Age' not found"
        );
        assert_eq!(
            Error::unsupported_operator("<", "boolean").to_string(),
            "operator '<' not supported for type 'boolean'"
        );
        assert_eq!(
            Error::conversion("abc", DataType::Integer).to_string(),
            "cannot convert 'abc' to integer"
        );
        assert_eq!(
            Error::arity("SUBSTRING", 3, 2).to_string(),
            "SUBSTRING expects 3 argument(s), got 2"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::syntax("m", 1, 1).is_syntax());
        assert!(Error::ColumnNotFound("c".to_string()).is_semantic());
        assert!(Error::unsupported_operator("<", "boolean").is_semantic());
        assert!(Error::arity("LEN", 1, 2).is_semantic());
        assert!(Error::conversion("x", DataType::Float).is_conversion());
        assert!(!Error::conversion("x", DataType::Float).is_semantic());
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            Error::ColumnNotFound("c".to_string()),
            Error::ColumnNotFound("c".to_string())
        );
        assert_ne!(
            Error::ColumnNotFound("c".to_string()),
            Error::ColumnNotFound("d".to_string())
        );
    }
}
