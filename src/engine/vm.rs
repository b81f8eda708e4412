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

//! Expression virtual machine
//!
//! Executes compiled Programs against row data: linear instruction dispatch
//! over a value stack, no recursion. A VM instance is cheap to create and
//! holds no state between executions, so predicate invocation needs no lock.

use smallvec::SmallVec;

use crate::core::{Error, Result, RowHandle, Value};
use crate::parser::{ArithOp, CmpOp};

use super::coerce::{
    are_equal, are_not_equal, change_type, convert_to_best_type, is_greater_or_equal,
    is_greater_than, is_less_or_equal, is_less_than, to_arith_decimal, to_arith_f64, to_truthy,
};
use super::ops::Op;
use super::pattern::like;
use super::program::Program;

/// Stack capacity for inline storage; most predicates need 4-8 slots
const STACK_INLINE_CAPACITY: usize = 16;

/// Expression virtual machine
pub struct ExprVm {
    /// Evaluation stack (reused between executions)
    stack: SmallVec<[Value; STACK_INLINE_CAPACITY]>,
}

impl ExprVm {
    /// Create a new VM
    pub fn new() -> Self {
        Self {
            stack: SmallVec::new(),
        }
    }

    /// Create a VM pre-sized for a known stack depth
    pub fn with_capacity(depth: usize) -> Self {
        Self {
            stack: SmallVec::with_capacity(depth),
        }
    }

    /// Execute a program against a row, producing the result value
    pub fn execute(&mut self, program: &Program, row: RowHandle<'_>) -> Result<Value> {
        self.stack.clear();
        let ops = program.ops();
        let mut pc = 0;

        while pc < ops.len() {
            match &ops[pc] {
                Op::LoadConst(value) => self.stack.push(value.clone()),

                Op::LoadColumn(slot) => self.stack.push(row.read(slot)?),

                Op::Coerce(kind) => {
                    let value = self.pop()?;
                    let coerced = if value.is_null() {
                        Value::null(*kind)
                    } else {
                        convert_to_best_type(&value, *kind)?
                    };
                    self.stack.push(coerced);
                }

                Op::ConvertDefaulting(kind) => {
                    let value = self.pop()?;
                    self.stack.push(change_type(&value, *kind)?);
                }

                Op::ToBool => {
                    let value = self.pop()?;
                    self.stack.push(Value::boolean(to_truthy(&value)?));
                }

                Op::Not => {
                    let value = self.pop()?;
                    self.stack.push(Value::boolean(!to_truthy(&value)?));
                }

                Op::AndJump(target) => {
                    let value = self.pop()?;
                    if !to_truthy(&value)? {
                        self.stack.push(Value::boolean(false));
                        pc = *target;
                        continue;
                    }
                }

                Op::OrJump(target) => {
                    let value = self.pop()?;
                    if to_truthy(&value)? {
                        self.stack.push(Value::boolean(true));
                        pc = *target;
                        continue;
                    }
                }

                Op::Jump(target) => {
                    pc = *target;
                    continue;
                }

                Op::JumpIfFalse(target) => {
                    let value = self.pop()?;
                    if !to_truthy(&value)? {
                        pc = *target;
                        continue;
                    }
                }

                Op::Compare(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.stack
                        .push(Value::boolean(compare(*op, &left, &right)?));
                }

                Op::Arith(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.stack.push(arith(*op, &left, &right)?);
                }

                Op::Negate => {
                    let value = self.pop()?;
                    let negated = match &value {
                        Value::Decimal(d) => Value::decimal(-*d),
                        other => Value::float(-to_arith_f64(other)?),
                    };
                    self.stack.push(negated);
                }

                Op::Promote => {
                    let value = self.pop()?;
                    let promoted = match &value {
                        Value::Decimal(_) => value,
                        other => Value::float(to_arith_f64(other)?),
                    };
                    self.stack.push(promoted);
                }

                Op::Like { pattern, negated } => {
                    let value = self.pop()?;
                    let matched = value
                        .as_string()
                        .map(|s| pattern.matches(&s))
                        .unwrap_or(false);
                    self.stack.push(Value::boolean(matched != *negated));
                }

                Op::LikeDynamic { negated } => {
                    let pattern = self.pop()?;
                    let value = self.pop()?;
                    let matched = like(
                        value.as_string().as_deref(),
                        pattern.as_string().as_deref(),
                    );
                    self.stack.push(Value::boolean(matched != *negated));
                }

                Op::InList { values, negated } => {
                    let value = self.pop()?;
                    let matched = values.iter().any(|item| are_equal(&value, item));
                    self.stack.push(Value::boolean(matched != *negated));
                }

                Op::IsNull { negated } => {
                    let value = self.pop()?;
                    self.stack
                        .push(Value::boolean(value.is_null() != *negated));
                }

                Op::Call { function, argc } => {
                    let split = self
                        .stack
                        .len()
                        .checked_sub(*argc)
                        .ok_or_else(|| Error::internal("stack underflow in function call"))?;
                    let args: SmallVec<[Value; 4]> = self.stack.drain(split..).collect();
                    self.stack.push(function.eval(&args)?);
                }

                Op::Return => break,
            }
            pc += 1;
        }

        self.pop()
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::internal("evaluation stack underflow"))
    }
}

impl Default for ExprVm {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a comparison operator; either operand NULL yields false
fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool> {
    if left.is_null() || right.is_null() {
        return Ok(false);
    }
    match op {
        CmpOp::Eq => Ok(are_equal(left, right)),
        CmpOp::Ne => Ok(are_not_equal(left, right)),
        CmpOp::Lt => is_less_than(left, right),
        CmpOp::Le => is_less_or_equal(left, right),
        CmpOp::Gt => is_greater_than(left, right),
        CmpOp::Ge => is_greater_or_equal(left, right),
    }
}

/// Apply an arithmetic operator with numeric promotion
///
/// Decimal wins when either operand is decimal-kinded; otherwise both
/// promote to f64. Float division and modulo follow native semantics
/// (zero divisors produce infinity or NaN); decimal operations that
/// cannot represent their result fall back to the float domain.
fn arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value> {
    if matches!(left, Value::Decimal(_)) || matches!(right, Value::Decimal(_)) {
        let a = to_arith_decimal(left)?;
        let b = to_arith_decimal(right)?;
        let result = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => a.checked_div(b),
            ArithOp::Mod => a.checked_rem(b),
        };
        if let Some(d) = result {
            return Ok(Value::decimal(d));
        }
    }

    let a = to_arith_f64(left)?;
    let b = to_arith_f64(right)?;
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
    };
    Ok(Value::float(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnSlot, MapRow};
    use std::sync::Arc;

    fn row(pairs: Vec<(&str, Value)>) -> MapRow {
        pairs.into_iter().collect()
    }

    #[test]
    fn test_load_and_compare() {
        let program = Program::new(vec![
            Op::LoadColumn(ColumnSlot::Name(Arc::from("Age"))),
            Op::LoadConst(Value::integer(25)),
            Op::Compare(CmpOp::Gt),
            Op::Return,
        ]);

        let mut vm = ExprVm::new();
        let r = row(vec![("Age", Value::integer(30))]);
        assert_eq!(
            vm.execute(&program, RowHandle::Map(&r)).unwrap(),
            Value::boolean(true)
        );

        let r = row(vec![("Age", Value::integer(20))]);
        assert_eq!(
            vm.execute(&program, RowHandle::Map(&r)).unwrap(),
            Value::boolean(false)
        );
    }

    #[test]
    fn test_missing_column_fails() {
        let program = Program::new(vec![
            Op::LoadColumn(ColumnSlot::Name(Arc::from("Missing"))),
            Op::Return,
        ]);
        let mut vm = ExprVm::new();
        let r = row(vec![("Age", Value::integer(30))]);
        assert_eq!(
            vm.execute(&program, RowHandle::Map(&r)),
            Err(Error::ColumnNotFound("Missing".to_string()))
        );
    }

    #[test]
    fn test_null_comparison_is_false() {
        for op in [CmpOp::Eq, CmpOp::Ne, CmpOp::Lt, CmpOp::Gt] {
            assert_eq!(
                compare(op, &Value::null_unknown(), &Value::integer(1)).unwrap(),
                false
            );
            assert_eq!(
                compare(op, &Value::null_unknown(), &Value::null_unknown()).unwrap(),
                false
            );
        }
    }

    #[test]
    fn test_arith_float_promotion() {
        let v = arith(ArithOp::Add, &Value::integer(1), &Value::integer(2)).unwrap();
        assert_eq!(v, Value::float(3.0));

        let v = arith(ArithOp::Div, &Value::integer(1), &Value::integer(0)).unwrap();
        assert_eq!(v, Value::float(f64::INFINITY));

        let v = arith(ArithOp::Mod, &Value::integer(7), &Value::integer(4)).unwrap();
        assert_eq!(v, Value::float(3.0));
    }

    #[test]
    fn test_arith_decimal_promotion() {
        use rust_decimal::Decimal;
        let v = arith(
            ArithOp::Add,
            &Value::decimal(Decimal::new(15, 1)),
            &Value::integer(1),
        )
        .unwrap();
        assert_eq!(v, Value::decimal(Decimal::new(25, 1)));

        // decimal division by zero falls back to float semantics
        let v = arith(
            ArithOp::Div,
            &Value::decimal(Decimal::ONE),
            &Value::integer(0),
        )
        .unwrap();
        assert_eq!(v, Value::float(f64::INFINITY));
    }

    #[test]
    fn test_arith_null_is_zero() {
        let v = arith(ArithOp::Add, &Value::null_unknown(), &Value::integer(2)).unwrap();
        assert_eq!(v, Value::float(2.0));
    }

    #[test]
    fn test_arith_non_numeric_fails() {
        assert!(arith(ArithOp::Add, &Value::text("a"), &Value::integer(1)).is_err());
        assert!(arith(ArithOp::Add, &Value::boolean(true), &Value::integer(1)).is_err());
    }

    #[test]
    fn test_and_jump_short_circuit() {
        // false AND <missing column> must not read the column
        let program = Program::new(vec![
            Op::LoadConst(Value::boolean(false)),
            Op::AndJump(5),
            Op::LoadColumn(ColumnSlot::Name(Arc::from("Missing"))),
            Op::ToBool,
            Op::Return,
            Op::Return,
        ]);
        let mut vm = ExprVm::new();
        let r = row(vec![]);
        assert_eq!(
            vm.execute(&program, RowHandle::Map(&r)).unwrap(),
            Value::boolean(false)
        );
    }
}
