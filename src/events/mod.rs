//! Event vocabulary for the visualization pipeline.
//!
//! The interpreter emits events describing every observable change to the
//! runtime model; the dispatcher groups them into numbered steps. Events are
//! plain data: applying them to a snapshot reconstructs the runtime state
//! without re-executing the program.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    /// Push an inner scope on the current frame.
    EnterScope,
    /// Pop a scope; popping a frame's global root is an error.
    ExitScope,
    DeclareVar {
        name: String,
        value: Option<i64>,
        is_global: bool,
    },
    DeclareArray {
        name: String,
        size: usize,
        values: Option<Vec<i64>>,
        is_global: bool,
    },
    DeclareArray2D {
        name: String,
        rows: usize,
        cols: usize,
        values: Option<Vec<Vec<i64>>>,
        is_global: bool,
    },
    VarChanged {
        name: String,
        value: i64,
    },
    ArrayElementChanged {
        name: String,
        index: usize,
        value: i64,
    },
    Array2DElementChanged {
        name: String,
        row: usize,
        col: usize,
        value: i64,
    },
    /// Push a new frame sharing the global scope.
    FunctionCall {
        name: String,
    },
    /// Record the return value on the top frame, then pop it.
    FunctionReturn {
        name: String,
        value: Option<i64>,
    },
    LineChanged {
        line: u32,
    },
}

/// A committed group of events, numbered consecutively from zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub number: usize,
    pub events: Vec<Event>,
}
