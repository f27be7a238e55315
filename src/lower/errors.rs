//! Structured lowering errors.
//!
//! Every failure during CST-to-AST lowering carries a stable code, a message,
//! and — when a concrete node is responsible — its kind and source span.

use std::fmt;

use serde::Serialize;

use crate::ast::Location;
use crate::lower::cst::CstNode;
use crate::lower::node_location;

/// Classification of a lowering failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LowerErrorCode {
    ParseFailed,
    TreeSitterError,
    StmtUnsupported,
    ExprUnsupported,
    EmptyParenthesizedExpr,
    InvalidDeclaration,
    InitializerConversion,
    EmptyExpressionStatement,
    InvalidExpressionStatement,
    InvalidReturnStatement,
    InvalidAssignmentExpression,
    InvalidCallExpression,
    EmptyArrayInitializer,
    InvalidPostfixOperator,
    InvalidIdentifier,
    UnsupportedOperator,
    RequiresLValue,
    IntLiteralParse,
    StmtConversion,
}

impl LowerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LowerErrorCode::ParseFailed => "ParseFailed",
            LowerErrorCode::TreeSitterError => "TreeSitterError",
            LowerErrorCode::StmtUnsupported => "StmtUnsupported",
            LowerErrorCode::ExprUnsupported => "ExprUnsupported",
            LowerErrorCode::EmptyParenthesizedExpr => "EmptyParenthesizedExpr",
            LowerErrorCode::InvalidDeclaration => "InvalidDeclaration",
            LowerErrorCode::InitializerConversion => "InitializerConversion",
            LowerErrorCode::EmptyExpressionStatement => "EmptyExpressionStatement",
            LowerErrorCode::InvalidExpressionStatement => "InvalidExpressionStatement",
            LowerErrorCode::InvalidReturnStatement => "InvalidReturnStatement",
            LowerErrorCode::InvalidAssignmentExpression => "InvalidAssignmentExpression",
            LowerErrorCode::InvalidCallExpression => "InvalidCallExpression",
            LowerErrorCode::EmptyArrayInitializer => "EmptyArrayInitializer",
            LowerErrorCode::InvalidPostfixOperator => "InvalidPostfixOperator",
            LowerErrorCode::InvalidIdentifier => "InvalidIdentifier",
            LowerErrorCode::UnsupportedOperator => "UnsupportedOperator",
            LowerErrorCode::RequiresLValue => "RequiresLValue",
            LowerErrorCode::IntLiteralParse => "IntLiteralParse",
            LowerErrorCode::StmtConversion => "StmtConversion",
        }
    }
}

/// A lowering failure with full diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowerError {
    pub code: LowerErrorCode,
    pub message: String,
    pub node_kind: Option<String>,
    pub location: Option<Location>,
}

impl LowerError {
    /// Error not tied to any concrete node.
    pub fn bare(code: LowerErrorCode, message: impl Into<String>) -> Self {
        LowerError {
            code,
            message: message.into(),
            node_kind: None,
            location: None,
        }
    }

    /// Error pointing at a concrete node.
    pub fn at<N: CstNode>(code: LowerErrorCode, message: impl Into<String>, node: &N) -> Self {
        LowerError {
            code,
            message: message.into(),
            node_kind: Some(node.kind().to_string()),
            location: Some(node_location(node)),
        }
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        LowerError::bare(LowerErrorCode::ParseFailed, message)
    }

    pub fn code(&self) -> LowerErrorCode {
        self.code
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " (line {}, column {})", loc.line, loc.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for LowerError {}
