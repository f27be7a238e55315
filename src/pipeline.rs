//! End-to-end pipeline: lower, validate, interpret.
//!
//! Stages are strictly ordered — the validator never sees a program the
//! lowerer rejected, and the interpreter never sees a program the validator
//! rejected. A failed pipeline yields exactly one error describing the
//! first problem encountered.

use std::fmt;

use crate::ast::Program;
use crate::interpreter::Interpreter;
use crate::lower::cst::CParser;
use crate::lower::errors::LowerError;
use crate::runtime::errors::RuntimeError;
use crate::snapshot::EventDispatcher;
use crate::validate::{SemanticError, SemanticValidator};

/// The first error any stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Lower(LowerError),
    Semantic(SemanticError),
    Runtime(RuntimeError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Lower(_) => "lowering",
            PipelineError::Semantic(_) => "validation",
            PipelineError::Runtime(_) => "execution",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Lower(err) => write!(f, "{err}"),
            PipelineError::Semantic(err) => write!(f, "{err}"),
            PipelineError::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LowerError> for PipelineError {
    fn from(err: LowerError) -> Self {
        PipelineError::Lower(err)
    }
}

impl From<SemanticError> for PipelineError {
    fn from(err: SemanticError) -> Self {
        PipelineError::Semantic(err)
    }
}

impl From<RuntimeError> for PipelineError {
    fn from(err: RuntimeError) -> Self {
        PipelineError::Runtime(err)
    }
}

/// Result of a successful run: `main`'s value (absent when it fell through)
/// and the dispatcher holding the recorded steps and the final snapshot.
#[derive(Debug)]
pub struct Execution {
    pub result: Option<i64>,
    pub dispatcher: EventDispatcher,
}

/// Parse and lower C source without validating or executing it.
pub fn parse_source(source: &str) -> Result<Program, LowerError> {
    CParser::new()?.parse_to_ast(source)
}

/// Run the whole pipeline over a source buffer.
pub fn run_source(source: &str) -> Result<Execution, PipelineError> {
    let program = parse_source(source)?;
    SemanticValidator::new().validate_program(&program)?;

    let mut interpreter = Interpreter::new();
    let result = interpreter.execute_program(&program)?;

    Ok(Execution {
        result,
        dispatcher: interpreter.into_dispatcher(),
    })
}
