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

//! # Rowsift - filter expressions compiled into reusable row predicates
//!
//! Rowsift compiles a small SQL/DataTable-style filter-expression language
//! (comparisons, boolean logic, arithmetic, `LIKE`, `IN`, `IS [NOT] NULL`,
//! and a fixed function library) into executable predicates over row-shaped
//! records, reproducing the loosely-typed coercion semantics of the legacy
//! tabular-data filter engines. An expression is compiled at most once per
//! row shape and reused across evaluations via a concurrent predicate cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use rowsift::{EvalOptions, Evaluator, MapRow, Value};
//!
//! let rows: Vec<MapRow> = vec![
//!     vec![("Age", Value::integer(30)), ("Name", Value::text("Alice"))]
//!         .into_iter()
//!         .collect(),
//!     vec![("Age", Value::integer(25)), ("Name", Value::text("Bob"))]
//!         .into_iter()
//!         .collect(),
//! ];
//!
//! let evaluator = Evaluator::new();
//! let matching = evaluator
//!     .evaluate("Age > 25 AND Name LIKE 'A*'", &rows, EvalOptions::default())
//!     .unwrap();
//!
//! assert_eq!(matching.len(), 1);
//! assert_eq!(matching[0].get("Name"), Some(&Value::text("Alice")));
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Value`], [`DataType`], [`MapRow`], [`Record`], [`Error`])
//! - [`parser`] - Expression front end (lexer, parser, AST)
//! - [`engine`] - Coercion rules, codegen, VM, predicate cache, trimmer

pub mod core;
pub mod engine;
pub mod parser;

// Re-export main types for convenience
pub use core::{ColumnSlot, DataType, Error, FieldAccess, MapRow, Record, Result, RowHandle, Value};

// Re-export engine types
pub use engine::{
    CacheKey, CacheStats, CacheTrimmer, CompiledPredicate, EvalOptions, Evaluator,
    LikePattern, PatternCache, PredicateCache,
};

// Re-export the front-end entry point
pub use parser::parse;
