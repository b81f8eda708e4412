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

//! Compiled expression operations
//!
//! These operations form the instruction set for the expression VM. Each
//! operation is self-contained: patterns are pre-compiled, IN lists are
//! pre-collected, and column slots are pre-resolved, so execution does no
//! per-row analysis.

use std::sync::Arc;

use crate::core::{ColumnSlot, DataType, Value};
use crate::parser::{ArithOp, CmpOp};

use super::functions::Function;
use super::pattern::LikePattern;

/// A single VM instruction
#[derive(Debug, Clone)]
pub enum Op {
    /// Push a constant value
    LoadConst(Value),

    /// Push a column value read from the row
    LoadColumn(ColumnSlot),

    /// Convert the top of stack to the given kind; NULL passes through
    Coerce(DataType),

    /// Convert the top of stack to the given kind; NULL becomes the
    /// target's default value (CONVERT semantics)
    ConvertDefaulting(DataType),

    /// Coerce the top of stack to a boolean
    ToBool,

    /// Coerce the top of stack to a boolean and negate it
    Not,

    /// Pop a value; if falsy, push false and jump to the target
    AndJump(usize),

    /// Pop a value; if truthy, push true and jump to the target
    OrJump(usize),

    /// Unconditional jump to the target
    Jump(usize),

    /// Pop a value; if falsy, jump to the target
    JumpIfFalse(usize),

    /// Pop two values and compare; either operand NULL yields false
    Compare(CmpOp),

    /// Pop two values, numerically promote, apply the operator
    Arith(ArithOp),

    /// Numerically promote the top of stack and negate it
    Negate,

    /// Numerically promote the top of stack (unary plus)
    Promote,

    /// Match the top of stack against a pre-compiled pattern
    Like {
        pattern: Arc<LikePattern>,
        negated: bool,
    },

    /// Pop pattern and value, compile the pattern via the global cache, match
    LikeDynamic { negated: bool },

    /// Test the top of stack for membership in a constant list
    InList {
        values: Arc<[Value]>,
        negated: bool,
    },

    /// Test the top of stack for NULL
    IsNull { negated: bool },

    /// Call a scalar function with argc arguments from the stack
    Call { function: Function, argc: usize },

    /// End execution; the top of stack is the result
    Return,
}

impl Op {
    /// Net stack effect of this operation, used to pre-size the stack.
    /// Jump-on-condition ops are counted at their largest effect.
    pub fn stack_effect(&self) -> isize {
        match self {
            Op::LoadConst(_) | Op::LoadColumn(_) => 1,
            Op::Coerce(_)
            | Op::ConvertDefaulting(_)
            | Op::ToBool
            | Op::Not
            | Op::Negate
            | Op::Promote
            | Op::Like { .. }
            | Op::InList { .. }
            | Op::IsNull { .. }
            | Op::Jump(_)
            | Op::AndJump(_)
            | Op::OrJump(_)
            | Op::Return => 0,
            Op::Compare(_) | Op::Arith(_) | Op::LikeDynamic { .. } | Op::JumpIfFalse(_) => -1,
            Op::Call { argc, .. } => 1 - (*argc as isize),
        }
    }
}
