//! Runtime error types.
//!
//! Execution failures fall into three classes: undefined behavior the
//! curriculum teaches about (uninitialized reads, out-of-bounds indexing),
//! plain runtime errors (division and modulo by zero), and internal errors
//! that a validated AST should never trigger (unknown names, arity
//! mismatches, control-flow signals escaping their handlers).
//!
//! All runtime errors are fatal; execution halts at the first one.

use std::fmt;

use serde::Serialize;

use crate::ast::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum RuntimeError {
    /// Undefined behavior: reading unset cells, indexing out of bounds.
    UndefinedBehavior {
        message: String,
        location: Option<Location>,
    },

    /// Arithmetic failures a correct program can still hit.
    Runtime {
        message: String,
        location: Option<Location>,
    },

    /// States a validated AST should never reach.
    Internal {
        message: String,
        location: Option<Location>,
    },
}

impl RuntimeError {
    pub fn undefined_behavior(message: impl Into<String>) -> Self {
        RuntimeError::UndefinedBehavior {
            message: message.into(),
            location: None,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        RuntimeError::Runtime {
            message: message.into(),
            location: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source span if none is recorded yet.
    pub fn with_location(mut self, loc: Location) -> Self {
        let slot = match &mut self {
            RuntimeError::UndefinedBehavior { location, .. } => location,
            RuntimeError::Runtime { location, .. } => location,
            RuntimeError::Internal { location, .. } => location,
        };
        if slot.is_none() {
            *slot = Some(loc);
        }
        self
    }

    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedBehavior { .. } => "UndefinedBehavior",
            RuntimeError::Runtime { .. } => "Runtime",
            RuntimeError::Internal { .. } => "UnexpectedInternalError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RuntimeError::UndefinedBehavior { message, .. } => message,
            RuntimeError::Runtime { message, .. } => message,
            RuntimeError::Internal { message, .. } => message,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            RuntimeError::UndefinedBehavior { location, .. } => location.as_ref(),
            RuntimeError::Runtime { location, .. } => location.as_ref(),
            RuntimeError::Internal { location, .. } => location.as_ref(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedBehavior { message, location } => {
                write!(f, "undefined behavior: {message}")?;
                if let Some(loc) = location {
                    write!(f, " at line {}", loc.line)?;
                }
                Ok(())
            }
            RuntimeError::Runtime { message, location } => {
                write!(f, "runtime error: {message}")?;
                if let Some(loc) = location {
                    write!(f, " at line {}", loc.line)?;
                }
                Ok(())
            }
            RuntimeError::Internal { message, location } => {
                write!(f, "unexpected internal error: {message}")?;
                if let Some(loc) = location {
                    write!(f, " at line {}", loc.line)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
