//! Curriculum validator.
//!
//! A pure AST pass that enforces the teaching subset: permitted base types,
//! array rank and pointer ceilings, and the curriculum operator whitelists.
//! It reports the first violation in left-to-right depth-first order and
//! never mutates the tree it inspects.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::ast::{CType, Expr, Location, Program, Stmt};

/// Classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemanticErrorCode {
    InvalidType,
    UnsupportedAssignOp,
    UnsupportedUnaryOp,
    UnsupportedBinaryOp,
}

impl SemanticErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticErrorCode::InvalidType => "InvalidType",
            SemanticErrorCode::UnsupportedAssignOp => "UnsupportedAssignOp",
            SemanticErrorCode::UnsupportedUnaryOp => "UnsupportedUnaryOp",
            SemanticErrorCode::UnsupportedBinaryOp => "UnsupportedBinaryOp",
        }
    }
}

/// A validation failure with full diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticError {
    pub code: SemanticErrorCode,
    pub message: String,
    pub location: Location,
    pub node_kind: String,
    pub details: String,
}

impl SemanticError {
    fn new(
        code: SemanticErrorCode,
        message: impl Into<String>,
        location: Location,
        node_kind: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        SemanticError {
            code,
            message: message.into(),
            location,
            node_kind: node_kind.into(),
            details: details.into(),
        }
    }

    pub fn code(&self) -> SemanticErrorCode {
        self.code
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at line {}, column {}: {}",
            self.code.as_str(),
            self.message,
            self.location.line,
            self.location.column,
            self.details
        )
    }
}

impl std::error::Error for SemanticError {}

/// Ceilings the curriculum imposes on declared types.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorLimits {
    pub max_pointer_depth: usize,
    pub max_array_rank: usize,
}

impl Default for ValidatorLimits {
    fn default() -> Self {
        ValidatorLimits {
            max_pointer_depth: 0,
            max_array_rank: 2,
        }
    }
}

/// Validates lowered programs against the curriculum whitelists.
pub struct SemanticValidator {
    allowed_assign_ops: FxHashSet<&'static str>,
    allowed_unary_ops: FxHashSet<&'static str>,
    allowed_binary_ops: FxHashSet<&'static str>,
    allowed_types: FxHashSet<&'static str>,
    allowed_return_types: FxHashSet<&'static str>,
    limits: ValidatorLimits,
}

impl Default for SemanticValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticValidator {
    pub fn new() -> Self {
        Self::with_limits(ValidatorLimits::default())
    }

    pub fn with_limits(limits: ValidatorLimits) -> Self {
        SemanticValidator {
            allowed_assign_ops: ["=", "+=", "-=", "*=", "/=", "%="].into_iter().collect(),
            allowed_unary_ops: ["-", "+", "!", "++", "--"].into_iter().collect(),
            allowed_binary_ops: [
                "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||",
            ]
            .into_iter()
            .collect(),
            allowed_types: ["int"].into_iter().collect(),
            allowed_return_types: ["int", "void"].into_iter().collect(),
            limits,
        }
    }

    /// Validate every top-level declaration. Returns the first violation.
    pub fn validate_program(&self, program: &Program) -> Result<(), SemanticError> {
        for decl in &program.declarations {
            self.validate_stmt(decl)?;
        }
        Ok(())
    }

    fn validate_stmt(&self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::VariableDecl {
                ty, name, init, loc, ..
            } => {
                self.validate_type(ty, "variable", name, loc)?;
                if let Some(init) = init {
                    self.validate_expr(init)?;
                }
                Ok(())
            }
            Stmt::FunctionDecl {
                name,
                return_type,
                params,
                body,
                loc,
            } => {
                self.validate_type(return_type, "return", name, loc)?;
                for param in params {
                    self.validate_type(&param.ty, "parameter", &param.name, &param.loc)?;
                }
                self.validate_stmt(body)
            }
            Stmt::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                self.validate_expr(condition)?;
                self.validate_stmt(then_branch)?;
                for clause in else_ifs {
                    self.validate_expr(&clause.condition)?;
                    self.validate_stmt(&clause.body)?;
                }
                if let Some(else_branch) = else_branch {
                    self.validate_stmt(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { condition, body, .. } => {
                self.validate_expr(condition)?;
                self.validate_stmt(body)
            }
            Stmt::DoWhile { body, condition, .. } => {
                self.validate_stmt(body)?;
                self.validate_expr(condition)
            }
            Stmt::For {
                init,
                condition,
                post,
                body,
                ..
            } => {
                for stmt in init {
                    self.validate_stmt(stmt)?;
                }
                if let Some(condition) = condition {
                    self.validate_expr(condition)?;
                }
                if let Some(post) = post {
                    self.validate_stmt(post)?;
                }
                self.validate_stmt(body)
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => self.validate_expr(value),
                None => Ok(()),
            },
            Stmt::Block { statements, .. } => {
                for stmt in statements {
                    self.validate_stmt(stmt)?;
                }
                Ok(())
            }
            Stmt::ExprStmt { expr, .. } => self.validate_expr(expr),
            Stmt::Label { statement, .. } => self.validate_stmt(statement),
            Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Goto { .. } => Ok(()),
        }
    }

    fn validate_expr(&self, expr: &Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
                loc,
            } => {
                if !self.allowed_binary_ops.contains(operator.as_str()) {
                    return Err(SemanticError::new(
                        SemanticErrorCode::UnsupportedBinaryOp,
                        format!("unsupported binary operator: {operator}"),
                        *loc,
                        "BinaryExpr",
                        format!("binary operator '{operator}' is not supported"),
                    ));
                }
                self.validate_expr(left)?;
                self.validate_expr(right)
            }
            Expr::Unary {
                operator,
                operand,
                loc,
                ..
            } => {
                if !self.allowed_unary_ops.contains(operator.as_str()) {
                    return Err(SemanticError::new(
                        SemanticErrorCode::UnsupportedUnaryOp,
                        format!("unsupported unary operator: {operator}"),
                        *loc,
                        "UnaryExpr",
                        format!("unary operator '{operator}' is not supported"),
                    ));
                }
                self.validate_expr(operand)
            }
            Expr::Assignment {
                left,
                operator,
                right,
                loc,
            } => {
                if !self.allowed_assign_ops.contains(operator.as_str()) {
                    return Err(SemanticError::new(
                        SemanticErrorCode::UnsupportedAssignOp,
                        format!("unsupported assignment operator: {operator}"),
                        *loc,
                        "AssignmentExpr",
                        format!("assignment operator '{operator}' is not supported"),
                    ));
                }
                self.validate_expr(left)?;
                self.validate_expr(right)
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    self.validate_expr(arg)?;
                }
                Ok(())
            }
            Expr::ArrayAccess { array, index, .. } => {
                self.validate_expr(array)?;
                self.validate_expr(index)
            }
            Expr::ArrayInit { elements, .. } => {
                for element in elements {
                    self.validate_expr(element)?;
                }
                Ok(())
            }
            Expr::IntLiteral { .. } | Expr::Variable { .. } => Ok(()),
        }
    }

    fn validate_type(
        &self,
        ty: &CType,
        context: &str,
        name: &str,
        loc: &Location,
    ) -> Result<(), SemanticError> {
        if ty.pointer_depth > self.limits.max_pointer_depth {
            return Err(SemanticError::new(
                SemanticErrorCode::InvalidType,
                format!(
                    "unsupported pointer type: {} (pointer depth {})",
                    ty.base, ty.pointer_depth
                ),
                *loc,
                context,
                format!(
                    "{} '{}' has pointer depth {}, when the maximum pointer depth is {}",
                    context, name, ty.pointer_depth, self.limits.max_pointer_depth
                ),
            ));
        }

        if ty.array_dims.len() > self.limits.max_array_rank {
            return Err(SemanticError::new(
                SemanticErrorCode::InvalidType,
                format!(
                    "unsupported array rank: {} (rank {})",
                    ty.base,
                    ty.array_dims.len()
                ),
                *loc,
                context,
                format!(
                    "{} '{}' has array rank {}, when the maximum array rank is {}",
                    context,
                    name,
                    ty.array_dims.len(),
                    self.limits.max_array_rank
                ),
            ));
        }

        if matches!(context, "return" | "parameter") && !ty.array_dims.is_empty() {
            return Err(SemanticError::new(
                SemanticErrorCode::InvalidType,
                "arrays are not supported as return values or parameters",
                *loc,
                context,
                format!("{context} '{name}' is an array, although arrays are not supported here"),
            ));
        }

        let allowed = if context == "return" {
            &self.allowed_return_types
        } else {
            &self.allowed_types
        };
        if !allowed.contains(ty.base.as_str()) {
            let mut names: Vec<&str> = allowed.iter().copied().collect();
            names.sort_unstable();
            return Err(SemanticError::new(
                SemanticErrorCode::InvalidType,
                format!("invalid {} type: {}", context, ty.base),
                *loc,
                context,
                format!(
                    "only '{}' types are supported for {} '{}', got '{}'",
                    names.join(", "),
                    context,
                    name,
                    ty.base
                ),
            ));
        }

        Ok(())
    }
}
