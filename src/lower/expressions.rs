//! Expression lowering and syntactic operator/identifier validation.
//!
//! The whitelists here are syntactic: they admit every token the C subset's
//! grammar can produce for the construct. The narrower curriculum
//! restrictions live in the validator.

use crate::ast::Expr;
use crate::lower::cst::CstNode;
use crate::lower::errors::{LowerError, LowerErrorCode};
use crate::lower::{node_location, Lowerer};

const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "&&", "||", "&", "|", "^", "<<",
    ">>",
];

const UNARY_OPERATORS: &[&str] = &["!", "-", "+", "~", "&", "*", "++", "--"];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=",
];

impl<'s> Lowerer<'s> {
    pub fn lower_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        if let Some(err) = self.tree_error(&node) {
            return Err(err);
        }

        match node.kind() {
            "identifier" => self.lower_identifier(node),
            "number_literal" => self.lower_int_literal(node),
            "binary_expression" => self.lower_binary_expression(node),
            "unary_expression" | "update_expression" | "pointer_expression" => {
                self.lower_unary_expression(node)
            }
            "assignment_expression" => self.lower_assignment_expression(node),
            "call_expression" => self.lower_call_expression(node),
            "subscript_expression" => self.lower_subscript_expression(node),
            "initializer_list" => self.lower_initializer_list(node),
            "parenthesized_expression" => {
                for i in 0..node.child_count() {
                    let Some(child) = node.child(i) else { continue };
                    if !matches!(child.kind(), "(" | ")" | "comment") {
                        return self.lower_expression(child);
                    }
                }
                Err(LowerError::at(
                    LowerErrorCode::EmptyParenthesizedExpr,
                    "empty parenthesized expression",
                    &node,
                ))
            }
            "comment" => Err(LowerError::at(
                LowerErrorCode::ExprUnsupported,
                "comment cannot be part of an expression",
                &node,
            )),
            kind => Err(LowerError::at(
                LowerErrorCode::ExprUnsupported,
                format!("unsupported expression kind: {kind}"),
                &node,
            )),
        }
    }

    fn lower_identifier<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let name = self.text(&node).into_owned();
        self.validate_identifier(&name, &node)?;
        Ok(Expr::Variable {
            name,
            loc: node_location(&node),
        })
    }

    /// Integer literals are base 10. A lexeme that denotes a negative value
    /// lowers to prefix minus over the positive literal, so negative
    /// literals never appear in the AST.
    fn lower_int_literal<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let text = self.text(&node);
        let value: i64 = text.trim().parse().map_err(|_| {
            LowerError::at(
                LowerErrorCode::IntLiteralParse,
                format!("failed to parse integer literal '{text}'"),
                &node,
            )
        })?;
        let loc = node_location(&node);

        if value < 0 {
            let positive = value.checked_neg().ok_or_else(|| {
                LowerError::at(
                    LowerErrorCode::IntLiteralParse,
                    format!("integer literal '{text}' is out of range"),
                    &node,
                )
            })?;
            return Ok(Expr::Unary {
                operator: "-".to_string(),
                operand: Box::new(Expr::IntLiteral {
                    value: positive,
                    loc,
                }),
                postfix: false,
                loc,
            });
        }

        Ok(Expr::IntLiteral { value, loc })
    }

    fn lower_binary_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut left: Option<Expr> = None;
        let mut operator: Option<String> = None;
        let mut right: Option<Expr> = None;
        let mut part = 0usize;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if child.kind() == "comment" {
                continue;
            }
            match part {
                0 => left = Some(self.lower_expression(child)?),
                1 => {
                    let token = self.text(&child).into_owned();
                    if !BINARY_OPERATORS.contains(&token.as_str()) {
                        return Err(LowerError::at(
                            LowerErrorCode::UnsupportedOperator,
                            format!("unsupported binary operator: {token}"),
                            &node,
                        ));
                    }
                    operator = Some(token);
                }
                2 => right = Some(self.lower_expression(child)?),
                _ => {}
            }
            part += 1;
        }

        match (left, operator, right) {
            (Some(left), Some(operator), Some(right)) => Ok(Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                loc: node_location(&node),
            }),
            _ => Err(LowerError::at(
                LowerErrorCode::ExprUnsupported,
                "malformed binary expression",
                &node,
            )),
        }
    }

    /// Covers `unary_expression`, `update_expression`, and
    /// `pointer_expression`. Postfix position is detected by the operator
    /// child appearing after the operand child.
    fn lower_unary_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut operator: Option<String> = None;
        let mut operand: Option<Expr> = None;
        let mut operator_index = 0usize;
        let mut operand_index = 0usize;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let kind = child.kind();
            if kind == "comment" {
                continue;
            }
            if UNARY_OPERATORS.contains(&kind) {
                operator = Some(self.text(&child).into_owned());
                operator_index = i;
            } else {
                operand = Some(self.lower_expression(child)?);
                operand_index = i;
            }
        }

        let operator = operator.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::ExprUnsupported,
                "unary expression missing operator",
                &node,
            )
        })?;
        let operand = operand.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::ExprUnsupported,
                "unary expression missing operand",
                &node,
            )
        })?;

        let postfix = operator_index > operand_index;
        if postfix && !matches!(operator.as_str(), "++" | "--") {
            return Err(LowerError::at(
                LowerErrorCode::InvalidPostfixOperator,
                format!("operator '{operator}' cannot be used in postfix notation"),
                &node,
            ));
        }

        // address-of and increment/decrement mutate or locate storage
        if matches!(operator.as_str(), "&" | "++" | "--") && !operand.is_lvalue() {
            return Err(LowerError::at(
                LowerErrorCode::RequiresLValue,
                format!("operand of '{operator}' operator must be an lvalue"),
                &node,
            ));
        }

        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
            postfix,
            loc: node_location(&node),
        })
    }

    fn lower_assignment_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut left: Option<Expr> = None;
        let mut operator: Option<String> = None;
        let mut right: Option<Expr> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let kind = child.kind();
            if kind == "comment" {
                continue;
            }
            if ASSIGNMENT_OPERATORS.contains(&kind) {
                operator = Some(self.text(&child).into_owned());
                continue;
            }

            if left.is_none() {
                left = Some(self.lower_expression(child)?);
            } else if right.is_none() {
                right = Some(self.lower_expression(child)?);
            } else {
                return Err(LowerError::at(
                    LowerErrorCode::InvalidAssignmentExpression,
                    "assignment expression has multiple right-hand sides",
                    &node,
                ));
            }
        }

        let operator = operator.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidAssignmentExpression,
                "assignment expression missing operator",
                &node,
            )
        })?;
        let left = left.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidAssignmentExpression,
                "assignment expression missing left-hand side",
                &node,
            )
        })?;
        let right = right.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidAssignmentExpression,
                "assignment expression missing right-hand side",
                &node,
            )
        })?;

        if !left.is_lvalue() {
            return Err(LowerError::at(
                LowerErrorCode::RequiresLValue,
                "left-hand side of assignment must be an lvalue",
                &node,
            ));
        }

        Ok(Expr::Assignment {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            loc: node_location(&node),
        })
    }

    fn lower_call_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut function: Option<String> = None;
        let mut args: Vec<Expr> = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "identifier" => {
                    if function.is_some() {
                        return Err(LowerError::at(
                            LowerErrorCode::InvalidCallExpression,
                            "call expression has multiple function names",
                            &node,
                        ));
                    }
                    let name = self.text(&child).into_owned();
                    self.validate_identifier(&name, &child)?;
                    function = Some(name);
                }
                "argument_list" => {
                    for j in 0..child.child_count() {
                        let Some(arg) = child.child(j) else { continue };
                        if matches!(arg.kind(), "(" | ")" | "," | "comment") {
                            continue;
                        }
                        args.push(self.lower_expression(arg)?);
                    }
                }
                _ => {}
            }
        }

        let function = function.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidCallExpression,
                "call expression missing function name",
                &node,
            )
        })?;

        Ok(Expr::Call {
            function,
            args,
            loc: node_location(&node),
        })
    }

    fn lower_subscript_expression<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut array: Option<Expr> = None;
        let mut index: Option<Expr> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if i == 0 {
                array = Some(self.lower_expression(child)?);
                continue;
            }
            if matches!(child.kind(), "[" | "]" | "comment") {
                continue;
            }
            if index.is_none() {
                index = Some(self.lower_expression(child)?);
            }
        }

        match (array, index) {
            (Some(array), Some(index)) => Ok(Expr::ArrayAccess {
                array: Box::new(array),
                index: Box::new(index),
                loc: node_location(&node),
            }),
            _ => Err(LowerError::at(
                LowerErrorCode::ExprUnsupported,
                "malformed subscript expression",
                &node,
            )),
        }
    }

    fn lower_initializer_list<N: CstNode>(&self, node: N) -> Result<Expr, LowerError> {
        let mut elements = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if matches!(child.kind(), "{" | "}" | "," | "comment") {
                continue;
            }
            elements.push(self.lower_expression(child)?);
        }

        if elements.is_empty() {
            return Err(LowerError::at(
                LowerErrorCode::EmptyArrayInitializer,
                "array initializer list cannot be empty",
                &node,
            ));
        }

        Ok(Expr::ArrayInit {
            elements,
            loc: node_location(&node),
        })
    }

    /// Identifiers start with a letter or underscore and continue with
    /// letters, digits, or underscores.
    pub(crate) fn validate_identifier<N: CstNode>(
        &self,
        name: &str,
        node: &N,
    ) -> Result<(), LowerError> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(LowerError::at(
                LowerErrorCode::InvalidIdentifier,
                "identifier cannot be empty",
                node,
            ));
        };

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(LowerError::at(
                LowerErrorCode::InvalidIdentifier,
                format!("identifier '{name}' must start with a letter or underscore"),
                node,
            ));
        }

        for (i, ch) in name.char_indices().skip(1) {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                return Err(LowerError::at(
                    LowerErrorCode::InvalidIdentifier,
                    format!("identifier '{name}' contains invalid character '{ch}' at position {i}"),
                    node,
                ));
            }
        }

        Ok(())
    }
}
