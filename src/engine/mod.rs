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

//! Semantic analysis and codegen engine
//!
//! The AST from the front end compiles into a linear [`program::Program`]
//! executed by a stack VM. One compiler serves two backends that differ only
//! in how column references materialize: keyed lookups for map rows, field
//! indices resolved at build time for declared record types.
//!
//! ```text
//!   text --parse--> AST --Compiler--> Program --ExprVm--> bool
//!                                        |
//!                                  PredicateCache
//! ```

pub mod cache;
pub mod coerce;
pub mod compiler;
pub mod evaluator;
pub mod functions;
pub mod ops;
pub mod pattern;
pub mod program;
pub mod trim;
pub mod vm;

pub use cache::{CacheKey, CacheStats, EvalOptions, PredicateCache, DEFAULT_CACHE_SIZE};
pub use compiler::{CompileContext, Compiler};
pub use evaluator::{CompiledPredicate, Evaluator};
pub use functions::Function;
pub use ops::Op;
pub use pattern::{global_pattern_cache, like, LikePattern, PatternCache};
pub use program::{Program, ProgramBuilder};
pub use trim::CacheTrimmer;
pub use vm::ExprVm;
