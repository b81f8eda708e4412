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

//! Expression compiler
//!
//! Transforms AST expressions into compiled Programs. Everything resolvable
//! up front is resolved here: typed-row field indices, LIKE patterns, IN
//! lists, literal coercions to inferred column kinds, and IIF branch-kind
//! unification. Short-circuit evaluation compiles to jumps.
//!
//! One compiler serves both backends; only column materialization differs.
//! The map backend emits name slots resolved per evaluation (a missing key
//! is a runtime unknown-column error); the typed backend resolves names
//! against the declared field list at compile time and emits index slots.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{ColumnSlot, DataType, Error, MapRow, Record, Result};
use crate::parser::{CmpOp, Expr, UnaryOp};

use super::cache::EvalOptions;
use super::coerce::convert_to_best_type;
use super::functions::{convert_target, is_aggregate, Function};
use super::ops::Op;
use super::pattern::{global_pattern_cache, LikePattern};
use super::program::{Program, ProgramBuilder};

/// Which row representation column references compile against
enum Backend {
    /// Keyed lookup with per-build kind inference from a row sample
    Map {
        column_kinds: FxHashMap<String, DataType>,
    },
    /// Build-time field resolution against a declared record type
    Typed {
        fields: &'static [(&'static str, DataType)],
    },
}

/// Compilation context: backend, inferred column kinds, and options
pub struct CompileContext {
    backend: Backend,
    options: EvalOptions,
}

impl CompileContext {
    /// Context for the map backend
    ///
    /// Column kinds are inferred once per build: a column's kind is the kind
    /// of the first non-null value found for it across the sample. Columns
    /// that are always null or absent stay untyped and get no narrowing.
    pub fn for_map(sample: &[MapRow], options: EvalOptions) -> Self {
        let mut column_kinds = FxHashMap::default();
        for row in sample {
            for (name, value) in row.iter() {
                if !value.is_null() && !column_kinds.contains_key(name) {
                    column_kinds.insert(name.to_string(), value.data_type());
                }
            }
        }
        Self {
            backend: Backend::Map { column_kinds },
            options,
        }
    }

    /// Context for the typed backend
    pub fn for_typed<T: Record>(options: EvalOptions) -> Self {
        Self {
            backend: Backend::Typed { fields: T::FIELDS },
            options,
        }
    }

    /// Column name as actually looked up, with the underscore option applied
    fn effective_name(&self, name: &str) -> String {
        if self.options.normalize_underscores {
            name.replace('_', " ")
        } else {
            name.to_string()
        }
    }

    /// Statically known kind of a column, if any
    fn column_kind(&self, name: &str) -> Option<DataType> {
        match &self.backend {
            Backend::Map { column_kinds } => {
                column_kinds.get(&self.effective_name(name)).copied()
            }
            Backend::Typed { .. } => self.resolve_field(name).map(|(_, kind)| kind),
        }
    }

    /// Resolve a column name against the declared field list (typed backend)
    fn resolve_field(&self, name: &str) -> Option<(u16, DataType)> {
        let Backend::Typed { fields } = &self.backend else {
            return None;
        };
        let effective = self.effective_name(name);
        fields
            .iter()
            .enumerate()
            .find(|(_, (field, _))| {
                field.eq_ignore_ascii_case(name) || field.eq_ignore_ascii_case(&effective)
            })
            .map(|(idx, (_, kind))| (idx as u16, *kind))
    }
}

/// Expression compiler
pub struct Compiler<'a> {
    ctx: &'a CompileContext,
}

impl<'a> Compiler<'a> {
    pub fn new(ctx: &'a CompileContext) -> Self {
        Self { ctx }
    }

    /// Compile an expression into a Program
    ///
    /// The expression must statically evaluate to a boolean; anything else
    /// cannot become a predicate and fails the build.
    pub fn compile(&self, expr: &Expr) -> Result<Program> {
        let mut builder = ProgramBuilder::new();
        self.compile_expr(expr, &mut builder)?;
        if self.static_kind(expr) != Some(DataType::Boolean) {
            return Err(Error::Type(
                "expression does not evaluate to a boolean".to_string(),
            ));
        }
        Ok(builder.build())
    }

    // =========================================================================
    // Static kind analysis
    // =========================================================================

    /// Statically known result kind of an expression, None when untyped
    fn static_kind(&self, expr: &Expr) -> Option<DataType> {
        match expr {
            Expr::Literal(v) => {
                if v.is_null() {
                    None
                } else {
                    Some(v.data_type())
                }
            }
            Expr::Column(name) => self.ctx.column_kind(name),
            Expr::FunctionCall { name, args } => {
                let upper = name.to_uppercase();
                if let Some(function) = Function::resolve(&upper) {
                    return Some(function.result_kind());
                }
                match upper.as_str() {
                    "IIF" if args.len() == 3 => {
                        self.unify_branch_kinds(&args[1], &args[2]).ok().flatten()
                    }
                    "CONVERT" if args.len() == 2 => args[1]
                        .as_literal()
                        .and_then(|v| v.as_str())
                        .and_then(convert_target),
                    _ => None,
                }
            }
            Expr::Unary { operand, .. } => match self.static_kind(operand) {
                Some(DataType::Decimal) => Some(DataType::Decimal),
                _ => Some(DataType::Float),
            },
            Expr::Arithmetic { left, right, .. } => {
                if self.static_kind(left) == Some(DataType::Decimal)
                    || self.static_kind(right) == Some(DataType::Decimal)
                {
                    Some(DataType::Decimal)
                } else {
                    Some(DataType::Float)
                }
            }
            Expr::Comparison { .. }
            | Expr::Like { .. }
            | Expr::In { .. }
            | Expr::IsNull { .. }
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Not(_) => Some(DataType::Boolean),
        }
    }

    /// Unify the kinds of the two IIF branches
    ///
    /// Matching kinds unify as-is; two numeric kinds unify to the wider one;
    /// an untyped branch unifies with anything; any other known pairing is an
    /// incompatible-branch error.
    fn unify_branch_kinds(&self, a: &Expr, b: &Expr) -> Result<Option<DataType>> {
        match (self.static_kind(a), self.static_kind(b)) {
            (Some(ka), Some(kb)) if ka == kb => Ok(Some(ka)),
            (Some(ka), Some(kb)) if ka.is_numeric() && kb.is_numeric() => {
                Ok(Some(ka.wider(kb)))
            }
            (Some(_), Some(_)) => Err(Error::Type(
                "IIF true and false parts must have compatible types".to_string(),
            )),
            _ => Ok(None),
        }
    }

    /// The coercion target of a comparison: the inferred kind of whichever
    /// side is a column reference, left side first
    fn comparison_target(&self, left: &Expr, right: &Expr) -> Option<DataType> {
        if let Expr::Column(name) = left {
            if let Some(kind) = self.ctx.column_kind(name) {
                return Some(kind);
            }
        }
        if let Expr::Column(name) = right {
            if let Some(kind) = self.ctx.column_kind(name) {
                return Some(kind);
            }
        }
        None
    }

    // =========================================================================
    // Code generation
    // =========================================================================

    fn compile_expr(&self, expr: &Expr, builder: &mut ProgramBuilder) -> Result<()> {
        match expr {
            Expr::Literal(value) => {
                builder.emit(Op::LoadConst(value.clone()));
                Ok(())
            }

            Expr::Column(name) => self.compile_column(name, builder),

            Expr::Unary { op, operand } => {
                self.compile_expr(operand, builder)?;
                builder.emit(match op {
                    UnaryOp::Minus => Op::Negate,
                    UnaryOp::Plus => Op::Promote,
                });
                Ok(())
            }

            Expr::Arithmetic { op, left, right } => {
                self.compile_expr(left, builder)?;
                self.compile_expr(right, builder)?;
                builder.emit(Op::Arith(*op));
                Ok(())
            }

            Expr::Comparison { op, left, right } => {
                self.compile_comparison(*op, left, right, builder)
            }

            Expr::Like {
                left,
                pattern,
                negated,
            } => self.compile_like(left, pattern, *negated, builder),

            Expr::In {
                left,
                values,
                negated,
            } => self.compile_in(left, values, *negated, builder),

            Expr::IsNull { operand, negated } => {
                self.compile_expr(operand, builder)?;
                builder.emit(Op::IsNull { negated: *negated });
                Ok(())
            }

            Expr::And(operands) => {
                let mut jumps = Vec::with_capacity(operands.len() - 1);
                for (i, operand) in operands.iter().enumerate() {
                    self.compile_expr(operand, builder)?;
                    if i + 1 < operands.len() {
                        jumps.push(builder.emit(Op::AndJump(0)));
                    } else {
                        builder.emit(Op::ToBool);
                    }
                }
                for jump in jumps {
                    builder.patch_jump(jump);
                }
                Ok(())
            }

            Expr::Or(operands) => {
                let mut jumps = Vec::with_capacity(operands.len() - 1);
                for (i, operand) in operands.iter().enumerate() {
                    self.compile_expr(operand, builder)?;
                    if i + 1 < operands.len() {
                        jumps.push(builder.emit(Op::OrJump(0)));
                    } else {
                        builder.emit(Op::ToBool);
                    }
                }
                for jump in jumps {
                    builder.patch_jump(jump);
                }
                Ok(())
            }

            Expr::Not(operand) => {
                self.compile_expr(operand, builder)?;
                builder.emit(Op::Not);
                Ok(())
            }

            Expr::FunctionCall { name, args } => self.compile_function(name, args, builder),
        }
    }

    fn compile_column(&self, name: &str, builder: &mut ProgramBuilder) -> Result<()> {
        let slot = match &self.ctx.backend {
            Backend::Map { .. } => {
                ColumnSlot::Name(Arc::from(self.ctx.effective_name(name).as_str()))
            }
            Backend::Typed { .. } => {
                let (index, _) = self
                    .ctx
                    .resolve_field(name)
                    .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
                ColumnSlot::Field(index)
            }
        };
        builder.emit(Op::LoadColumn(slot));
        Ok(())
    }

    fn compile_comparison(
        &self,
        op: CmpOp,
        left: &Expr,
        right: &Expr,
        builder: &mut ProgramBuilder,
    ) -> Result<()> {
        let target = self.comparison_target(left, right);

        if op.is_relational() {
            if target == Some(DataType::Text) {
                return Err(Error::unsupported_operator(op.to_string(), "string"));
            }
            if target == Some(DataType::Boolean)
                || (self.static_kind(left) == Some(DataType::Boolean)
                    && self.static_kind(right) == Some(DataType::Boolean))
            {
                return Err(Error::unsupported_operator(op.to_string(), "boolean"));
            }
        }

        self.compile_comparison_operand(left, target, builder)?;
        self.compile_comparison_operand(right, target, builder)?;
        builder.emit(Op::Compare(op));
        Ok(())
    }

    /// Compile one side of a comparison, coercing it toward the inferred
    /// column kind: literals convert at build time (a mismatch aborts the
    /// build), everything else gets a runtime coercion with NULL passthrough
    fn compile_comparison_operand(
        &self,
        expr: &Expr,
        target: Option<DataType>,
        builder: &mut ProgramBuilder,
    ) -> Result<()> {
        match (expr, target) {
            (Expr::Literal(value), Some(kind)) if !value.is_null() => {
                let converted = convert_to_best_type(value, kind)?;
                builder.emit(Op::LoadConst(converted));
                Ok(())
            }
            (Expr::Literal(value), _) => {
                builder.emit(Op::LoadConst(value.clone()));
                Ok(())
            }
            (_, Some(kind)) => {
                self.compile_expr(expr, builder)?;
                builder.emit(Op::Coerce(kind));
                Ok(())
            }
            (_, None) => self.compile_expr(expr, builder),
        }
    }

    fn compile_like(
        &self,
        left: &Expr,
        pattern: &Expr,
        negated: bool,
        builder: &mut ProgramBuilder,
    ) -> Result<()> {
        self.compile_expr(left, builder)?;

        if let Expr::Literal(value) = pattern {
            let compiled = match value.as_string() {
                Some(text) => global_pattern_cache().get_or_compile(&text),
                None => Arc::new(LikePattern::Never),
            };
            builder.emit(Op::Like {
                pattern: compiled,
                negated,
            });
            return Ok(());
        }

        self.compile_expr(pattern, builder)?;
        builder.emit(Op::LikeDynamic { negated });
        Ok(())
    }

    fn compile_in(
        &self,
        left: &Expr,
        values: &[Expr],
        negated: bool,
        builder: &mut ProgramBuilder,
    ) -> Result<()> {
        let mut list = Vec::with_capacity(values.len());
        for value in values {
            match value.as_literal() {
                Some(v) => list.push(v.clone()),
                None => {
                    return Err(Error::not_supported(
                        "IN operator values must be constant expressions",
                    ))
                }
            }
        }

        self.compile_expr(left, builder)?;
        builder.emit(Op::InList {
            values: Arc::from(list),
            negated,
        });
        Ok(())
    }

    fn compile_function(
        &self,
        name: &str,
        args: &[Expr],
        builder: &mut ProgramBuilder,
    ) -> Result<()> {
        let upper = name.to_uppercase();

        if is_aggregate(&upper) {
            return Err(Error::not_supported(format!(
                "aggregate function '{}' is not supported for per-row evaluation",
                upper
            )));
        }

        if let Some(function) = Function::resolve(&upper) {
            if args.len() != function.arity() {
                return Err(Error::arity(function.name(), function.arity(), args.len()));
            }
            for arg in args {
                self.compile_expr(arg, builder)?;
            }
            builder.emit(Op::Call {
                function,
                argc: args.len(),
            });
            return Ok(());
        }

        match upper.as_str() {
            "IIF" => self.compile_iif(args, builder),
            "CONVERT" => self.compile_convert(args, builder),
            _ => Err(Error::not_supported(format!(
                "function '{}' is not supported",
                name
            ))),
        }
    }

    /// IIF compiles to a conditional jump: only the taken branch evaluates.
    /// Both branches coerce to the unified kind when one is needed.
    fn compile_iif(&self, args: &[Expr], builder: &mut ProgramBuilder) -> Result<()> {
        if args.len() != 3 {
            return Err(Error::arity("IIF", 3, args.len()));
        }

        if let Some(kind) = self.static_kind(&args[0]) {
            if kind != DataType::Boolean && !kind.is_numeric() {
                return Err(Error::Type(
                    "IIF condition must be boolean or numeric".to_string(),
                ));
            }
        }

        let unified = self.unify_branch_kinds(&args[1], &args[2])?;

        self.compile_expr(&args[0], builder)?;
        let jump_else = builder.emit(Op::JumpIfFalse(0));

        self.compile_expr(&args[1], builder)?;
        if let Some(kind) = unified {
            if self.static_kind(&args[1]) != Some(kind) {
                builder.emit(Op::Coerce(kind));
            }
        }
        let jump_end = builder.emit(Op::Jump(0));

        builder.patch_jump(jump_else);
        self.compile_expr(&args[2], builder)?;
        if let Some(kind) = unified {
            if self.static_kind(&args[2]) != Some(kind) {
                builder.emit(Op::Coerce(kind));
            }
        }
        builder.patch_jump(jump_end);
        Ok(())
    }

    /// CONVERT requires a literal type name and compiles to a defaulting
    /// conversion: NULL input yields the target kind's default value
    fn compile_convert(&self, args: &[Expr], builder: &mut ProgramBuilder) -> Result<()> {
        if args.len() != 2 {
            return Err(Error::arity("CONVERT", 2, args.len()));
        }

        let type_name = args[1]
            .as_literal()
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::not_supported("second argument to CONVERT must be a string literal type name")
            })?;

        let target = convert_target(type_name).ok_or_else(|| {
            Error::not_supported(format!(
                "CONVERT target type '{}' is not supported",
                type_name
            ))
        })?;

        self.compile_expr(&args[0], builder)?;
        builder.emit(Op::ConvertDefaulting(target));
        Ok(())
    }
}
