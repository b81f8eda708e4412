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

//! Filter-expression front end: lexer, parser, and AST

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{ArithOp, CmpOp, Expr, UnaryOp};
pub use lexer::Lexer;
pub use parser::parse;
pub use token::{Position, Token, TokenType};
