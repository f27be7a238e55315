//! # Introduction
//!
//! cstep parses a teaching subset of C, checks it against a curriculum
//! whitelist, and executes it under a tree-walking interpreter that records
//! an event log. The log groups events into numbered steps; replaying steps
//! against a [`snapshot::Snapshot`] reconstructs the runtime state at any
//! point, forward or backward, without re-executing the program. That is
//! the contract a step-by-step visualizer builds on.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → CST (tree-sitter) → Lowerer → AST → Validator → Interpreter
//!                                                              │
//!                                                   Events → Steps → Snapshot
//! ```
//!
//! 1. [`lower`] — lowers the concrete tree into a typed AST through a
//!    minimal parser-agnostic adapter.
//! 2. [`validate`] — enforces the curriculum's types and operator
//!    whitelists; pure, first-error-wins.
//! 3. [`interpreter`] — walks the AST against the [`runtime`] model,
//!    emitting [`events`] as it goes.
//! 4. [`snapshot`] — groups events into steps and rebuilds runtime state
//!    from them for navigation.
//! 5. [`pipeline`] — chains the stages with strict ordering.
//!
//! ## Supported C subset
//!
//! Types: `int`, `void` (return only), arrays up to rank 2.
//! Control flow: `if`/`else if`/`else`, `while`, `do-while`, `for`,
//! `break`, `continue`, `return`; `goto` and labels parse and validate but
//! do not execute.
//! Expressions: arithmetic, comparison, short-circuit logic,
//! prefix/postfix increment and decrement, assignment and compound
//! assignment, function calls, 1-D and 2-D subscripts, braced initializers.

pub mod ast;
pub mod events;
pub mod interpreter;
pub mod lower;
pub mod pipeline;
pub mod runtime;
pub mod snapshot;
pub mod validate;

pub use pipeline::{run_source, Execution, PipelineError};
