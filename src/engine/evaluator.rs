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

//! Evaluator: the public build/evaluate surface
//!
//! An [`Evaluator`] owns (or shares) a [`PredicateCache`] and turns
//! expression text into [`CompiledPredicate`]s, compiling each
//! (row-shape, expression, options) key at most once. `evaluate` filters a
//! row slice down to the matching subsequence.
//!
//! The cache is injected rather than process-global so construction and
//! teardown stay deterministic in tests; `Evaluator::new` builds a private
//! default-sized cache for the common case.

use std::sync::Arc;

use crate::core::{MapRow, Record, Result, RowHandle, Value};
use crate::parser::parse;

use super::cache::{CacheKey, EvalOptions, PredicateCache};
use super::compiler::{CompileContext, Compiler};
use super::program::Program;
use super::vm::ExprVm;

/// An immutable, reusable `Row -> bool` predicate
///
/// Cheap to clone (the program is shared) and safe to invoke from many
/// threads at once: each invocation runs on its own evaluation stack.
#[derive(Clone, Debug)]
pub struct CompiledPredicate {
    program: Arc<Program>,
}

impl CompiledPredicate {
    pub(crate) fn from_program(program: Program) -> Self {
        Self {
            program: Arc::new(program),
        }
    }

    /// Apply the predicate to a map row
    ///
    /// Build-time type errors never occur here; runtime failures are limited
    /// to data-shape surprises with no defined fallback (an absent map
    /// column, an unconvertible cell value).
    pub fn matches(&self, row: &MapRow) -> Result<bool> {
        self.matches_handle(RowHandle::Map(row))
    }

    /// Apply the predicate to a typed row
    pub fn matches_record<T: Record>(&self, row: &T) -> Result<bool> {
        self.matches_handle(RowHandle::Typed(row))
    }

    fn matches_handle(&self, row: RowHandle<'_>) -> Result<bool> {
        let mut vm = ExprVm::with_capacity(self.program.max_stack_depth());
        match vm.execute(&self.program, row)? {
            Value::Boolean(b) => Ok(b),
            Value::Null(_) => Ok(false),
            other => super::coerce::to_truthy(&other),
        }
    }
}

/// Compiles filter expressions into cached predicates and applies them
pub struct Evaluator {
    cache: Arc<PredicateCache>,
}

impl Evaluator {
    /// Create an evaluator with a private default-sized cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(PredicateCache::default_sized()),
        }
    }

    /// Create an evaluator sharing the given cache
    pub fn with_cache(cache: Arc<PredicateCache>) -> Self {
        Self { cache }
    }

    /// The evaluator's predicate cache
    pub fn cache(&self) -> &Arc<PredicateCache> {
        &self.cache
    }

    /// Build (or fetch from cache) a predicate over map rows
    ///
    /// The sample is used only to infer column kinds; it is not part of the
    /// cache key, so the first build for an expression fixes the predicate
    /// the cache serves.
    pub fn build(
        &self,
        expression: &str,
        sample: &[MapRow],
        options: EvalOptions,
    ) -> Result<CompiledPredicate> {
        let key = CacheKey::for_map(expression, options);
        self.cache.get_or_compile(key, || {
            let ast = parse(expression)?;
            let ctx = CompileContext::for_map(sample, options);
            let program = Compiler::new(&ctx).compile(&ast)?;
            Ok(CompiledPredicate::from_program(program))
        })
    }

    /// Build (or fetch from cache) a predicate over a declared record type
    pub fn build_typed<T: Record>(
        &self,
        expression: &str,
        options: EvalOptions,
    ) -> Result<CompiledPredicate> {
        let key = CacheKey::for_typed::<T>(expression, options);
        self.cache.get_or_compile(key, || {
            let ast = parse(expression)?;
            let ctx = CompileContext::for_typed::<T>(options);
            let program = Compiler::new(&ctx).compile(&ast)?;
            Ok(CompiledPredicate::from_program(program))
        })
    }

    /// Filter map rows down to the matching subsequence
    pub fn evaluate<'a>(
        &self,
        expression: &str,
        rows: &'a [MapRow],
        options: EvalOptions,
    ) -> Result<Vec<&'a MapRow>> {
        let predicate = self.build(expression, rows, options)?;
        let mut matching = Vec::new();
        for row in rows {
            if predicate.matches(row)? {
                matching.push(row);
            }
        }
        Ok(matching)
    }

    /// Filter typed rows down to the matching subsequence
    pub fn evaluate_typed<'a, T: Record>(
        &self,
        expression: &str,
        rows: &'a [T],
        options: EvalOptions,
    ) -> Result<Vec<&'a T>> {
        let predicate = self.build_typed::<T>(expression, options)?;
        let mut matching = Vec::new();
        for row in rows {
            if predicate.matches_record(row)? {
                matching.push(row);
            }
        }
        Ok(matching)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
