//! Tree-walking execution engine.
//!
//! The interpreter walks the validated AST against the runtime model and
//! emits events describing every observable change:
//! - [`engine`]: the interpreter itself, program entry, and function calls
//! - [`statements`]: statement execution and the non-local control protocol
//! - [`expressions`]: expression evaluation with lvalue/rvalue distinction
//!
//! Break, continue, and return travel as [`ExecResult`] values returned up
//! the walk, never as unwinding. Every scope and frame entered is exited on
//! all paths, including errors.

pub mod engine;

mod expressions;
mod statements;

pub use engine::{ExecResult, Function, Interpreter};
