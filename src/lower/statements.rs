//! Statement lowering.

use crate::ast::{ElseIf, Expr, Stmt};
use crate::lower::cst::CstNode;
use crate::lower::errors::{LowerError, LowerErrorCode};
use crate::lower::{node_location, Lowerer};

impl<'s> Lowerer<'s> {
    /// Lower an `if_statement`, collapsing `else if` chains into the flat
    /// clause list: the nested if's condition and body become an [`ElseIf`],
    /// its own clauses are concatenated, and the innermost else block becomes
    /// the outer else branch.
    pub(crate) fn lower_if_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut condition: Option<Expr> = None;
        let mut then_branch: Option<Stmt> = None;
        let mut else_ifs: Vec<ElseIf> = Vec::new();
        let mut else_branch: Option<Stmt> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "parenthesized_expression" if condition.is_none() => {
                    condition = Some(self.lower_expression(child)?);
                }
                "else_clause" => {
                    self.lower_else_clause(child, &mut else_ifs, &mut else_branch)?;
                }
                "if" | "comment" => {}
                _ => {
                    if condition.is_some() && then_branch.is_none() {
                        then_branch = Some(self.lower_single_statement(child)?);
                    }
                }
            }
        }

        let condition = condition.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "if statement missing condition",
                &node,
            )
        })?;
        let then_branch = then_branch.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "if statement missing body",
                &node,
            )
        })?;

        Ok(Stmt::If {
            condition,
            then_branch: Box::new(then_branch),
            else_ifs,
            else_branch: else_branch.map(Box::new),
            loc: node_location(&node),
        })
    }

    fn lower_else_clause<N: CstNode>(
        &self,
        node: N,
        else_ifs: &mut Vec<ElseIf>,
        else_branch: &mut Option<Stmt>,
    ) -> Result<(), LowerError> {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "if_statement" => {
                    let lowered = self.lower_if_statement(child)?;
                    if let Stmt::If {
                        condition,
                        then_branch,
                        else_ifs: nested_clauses,
                        else_branch: nested_else,
                        loc,
                    } = lowered
                    {
                        else_ifs.push(ElseIf {
                            condition,
                            body: then_branch,
                            loc,
                        });
                        else_ifs.extend(nested_clauses);
                        *else_branch = nested_else.map(|b| *b);
                    }
                }
                "else" | "comment" => {}
                _ => {
                    *else_branch = Some(self.lower_single_statement(child)?);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn lower_while_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut condition: Option<Expr> = None;
        let mut body: Option<Stmt> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "parenthesized_expression" if condition.is_none() => {
                    condition = Some(self.lower_expression(child)?);
                }
                "while" | "comment" => {}
                _ => {
                    if body.is_none() {
                        body = Some(self.lower_single_statement(child)?);
                    }
                }
            }
        }

        let condition = condition.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "while statement missing condition",
                &node,
            )
        })?;
        let body = body.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "while statement missing body",
                &node,
            )
        })?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
            loc: node_location(&node),
        })
    }

    pub(crate) fn lower_do_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut condition: Option<Expr> = None;
        let mut body: Option<Stmt> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "parenthesized_expression" => {
                    condition = Some(self.lower_expression(child)?);
                }
                "do" | "while" | ";" | "comment" => {}
                _ => {
                    if body.is_none() {
                        body = Some(self.lower_single_statement(child)?);
                    }
                }
            }
        }

        let body = body.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "do-while statement missing body",
                &node,
            )
        })?;
        let condition = condition.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "do-while statement missing condition",
                &node,
            )
        })?;

        Ok(Stmt::DoWhile {
            body: Box::new(body),
            condition,
            loc: node_location(&node),
        })
    }

    /// Lower a `for_statement`. When the grammar exposes named fields they
    /// are taken directly; otherwise the header is scanned positionally with
    /// `(`, `;`, `)` as delimiters. Any segment may be empty.
    pub(crate) fn lower_for_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut init: Vec<Stmt> = Vec::new();
        let mut condition: Option<Expr> = None;
        let mut post: Option<Stmt> = None;
        let mut body: Option<Stmt> = None;
        let mut used_fields = false;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let Some(field) = node.field_name_for_child(i) else {
                continue;
            };
            used_fields = true;
            match field {
                // the initializer may be a declaration, a statement, or a
                // bare expression depending on the header form
                "initializer" => {
                    init = match child.kind() {
                        "declaration" | "expression_statement" => self.lower_statement(child)?,
                        _ => vec![Stmt::ExprStmt {
                            expr: self.lower_expression(child)?,
                            loc: node_location(&child),
                        }],
                    };
                }
                "condition" => condition = Some(self.lower_expression(child)?),
                "update" => {
                    post = Some(Stmt::ExprStmt {
                        expr: self.lower_expression(child)?,
                        loc: node_location(&child),
                    });
                }
                "body" => body = Some(self.lower_single_statement(child)?),
                _ => {}
            }
        }

        if !used_fields {
            let mut part = 0usize;
            let mut in_body = false;
            for i in 0..node.child_count() {
                let Some(child) = node.child(i) else { continue };
                match child.kind() {
                    "for" | "comment" => continue,
                    "(" => continue,
                    ")" => {
                        in_body = true;
                        continue;
                    }
                    ";" => {
                        part += 1;
                        continue;
                    }
                    _ => {}
                }

                if in_body {
                    if body.is_none() {
                        body = Some(self.lower_single_statement(child)?);
                    }
                    continue;
                }

                match child.kind() {
                    "declaration" => init.extend(self.lower_statement(child)?),
                    "expression_statement" if part == 0 => {
                        init.extend(self.lower_statement(child)?);
                    }
                    _ => match part {
                        0 => init.push(Stmt::ExprStmt {
                            expr: self.lower_expression(child)?,
                            loc: node_location(&child),
                        }),
                        1 => condition = Some(self.lower_expression(child)?),
                        _ => {
                            post = Some(Stmt::ExprStmt {
                                expr: self.lower_expression(child)?,
                                loc: node_location(&child),
                            });
                        }
                    },
                }
            }
        }

        let body = body.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "for statement missing body",
                &node,
            )
        })?;

        Ok(Stmt::For {
            init,
            condition,
            post: post.map(Box::new),
            body: Box::new(body),
            loc: node_location(&node),
        })
    }

    pub(crate) fn lower_return_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut value: Option<Expr> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if matches!(child.kind(), "return" | ";" | "comment") {
                continue;
            }
            if value.is_some() {
                return Err(LowerError::at(
                    LowerErrorCode::InvalidReturnStatement,
                    "return statement has more than one value",
                    &node,
                ));
            }
            value = Some(self.lower_expression(child)?);
        }

        Ok(Stmt::Return {
            value,
            loc: node_location(&node),
        })
    }

    pub(crate) fn lower_compound_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut statements = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if matches!(child.kind(), "{" | "}" | "comment") {
                continue;
            }
            statements.extend(self.lower_statement(child)?);
        }

        Ok(Stmt::Block {
            statements,
            loc: node_location(&node),
        })
    }

    pub(crate) fn lower_expression_statement<N: CstNode>(
        &self,
        node: N,
    ) -> Result<Stmt, LowerError> {
        let mut expr: Option<Expr> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if matches!(child.kind(), ";" | "comment") {
                continue;
            }
            if expr.is_some() {
                return Err(LowerError::at(
                    LowerErrorCode::InvalidExpressionStatement,
                    "expression statement has more than one expression",
                    &node,
                ));
            }
            expr = Some(self.lower_expression(child)?);
        }

        let expr = expr.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::EmptyExpressionStatement,
                "expression statement is empty",
                &node,
            )
        })?;

        Ok(Stmt::ExprStmt {
            expr,
            loc: node_location(&node),
        })
    }

    pub(crate) fn lower_goto_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if child.kind() == "statement_identifier" {
                let label = self.text(&child).into_owned();
                self.validate_identifier(&label, &child)?;
                return Ok(Stmt::Goto {
                    label,
                    loc: node_location(&node),
                });
            }
        }
        Err(LowerError::at(
            LowerErrorCode::StmtConversion,
            "goto statement missing label",
            &node,
        ))
    }

    pub(crate) fn lower_labeled_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut name: Option<String> = None;
        let mut statement: Option<Stmt> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "statement_identifier" => {
                    let text = self.text(&child).into_owned();
                    self.validate_identifier(&text, &child)?;
                    name = Some(text);
                }
                ":" | "comment" => {}
                _ => {
                    if statement.is_none() {
                        statement = Some(self.lower_single_statement(child)?);
                    }
                }
            }
        }

        let name = name.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "label missing name",
                &node,
            )
        })?;
        let statement = statement.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::StmtConversion,
                "label missing statement",
                &node,
            )
        })?;

        Ok(Stmt::Label {
            name,
            statement: Box::new(statement),
            loc: node_location(&node),
        })
    }
}
