//! CST-to-AST lowering.
//!
//! The lowerer walks a concrete syntax tree through the [`cst::CstNode`]
//! adapter and produces the typed [`Program`] the validator and interpreter
//! consume. It recovers declarator structure, collapses `else if` chains,
//! folds negative literals, classifies prefix/postfix operators, and rejects
//! tokens outside the syntactic whitelists. It never guesses past a parser
//! error: the first ERROR or missing node in a subtree aborts lowering.

pub mod cst;
pub mod errors;

mod declarations;
mod expressions;
mod statements;

use std::borrow::Cow;

use crate::ast::{Location, Program, Stmt};
use cst::CstNode;
use errors::{LowerError, LowerErrorCode};

/// Source span of a concrete node, with rows converted to 1-based lines.
pub(crate) fn node_location<N: CstNode>(node: &N) -> Location {
    let (start_row, start_column) = node.start_position();
    let (end_row, end_column) = node.end_position();
    Location::new(start_row + 1, start_column, end_row + 1, end_column)
}

/// Lowers concrete trees over one source buffer.
pub struct Lowerer<'s> {
    source: &'s [u8],
}

impl<'s> Lowerer<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        Lowerer { source }
    }

    /// Lower the root node into a [`Program`].
    ///
    /// Top-level children must be declarations or function definitions;
    /// comments are skipped, anything else is `StmtUnsupported`.
    pub fn lower_program<N: CstNode>(&self, root: N) -> Result<Program, LowerError> {
        let mut program = Program {
            declarations: Vec::new(),
            loc: node_location(&root),
        };

        for i in 0..root.child_count() {
            let Some(child) = root.child(i) else { continue };
            if let Some(err) = self.tree_error(&child) {
                return Err(err);
            }
            match child.kind() {
                "comment" => {}
                "declaration" => {
                    program
                        .declarations
                        .extend(self.lower_declaration(child, true)?);
                }
                "function_definition" => {
                    program
                        .declarations
                        .push(self.lower_function_definition(child)?);
                }
                kind => {
                    return Err(LowerError::at(
                        LowerErrorCode::StmtUnsupported,
                        format!("unsupported top-level declaration: {kind}"),
                        &child,
                    ));
                }
            }
        }

        Ok(program)
    }

    /// Lower one statement node. A multi-declarator declaration yields one
    /// statement per declarator; a comment yields none.
    pub fn lower_statement<N: CstNode>(&self, node: N) -> Result<Vec<Stmt>, LowerError> {
        if let Some(err) = self.tree_error(&node) {
            return Err(err);
        }

        match node.kind() {
            "declaration" => self.lower_declaration(node, false),
            "function_definition" => Ok(vec![self.lower_function_definition(node)?]),
            "if_statement" => Ok(vec![self.lower_if_statement(node)?]),
            "while_statement" => Ok(vec![self.lower_while_statement(node)?]),
            "do_statement" => Ok(vec![self.lower_do_statement(node)?]),
            "for_statement" => Ok(vec![self.lower_for_statement(node)?]),
            "return_statement" => Ok(vec![self.lower_return_statement(node)?]),
            "compound_statement" => Ok(vec![self.lower_compound_statement(node)?]),
            "expression_statement" => Ok(vec![self.lower_expression_statement(node)?]),
            "break_statement" => Ok(vec![Stmt::Break {
                loc: node_location(&node),
            }]),
            "continue_statement" => Ok(vec![Stmt::Continue {
                loc: node_location(&node),
            }]),
            "goto_statement" => Ok(vec![self.lower_goto_statement(node)?]),
            "labeled_statement" => Ok(vec![self.lower_labeled_statement(node)?]),
            "comment" => Ok(Vec::new()),
            kind => Err(LowerError::at(
                LowerErrorCode::StmtUnsupported,
                format!("unsupported statement kind: {kind}"),
                &node,
            )),
        }
    }

    /// Lower a node that must produce exactly one statement (loop bodies,
    /// branches, labels).
    pub(crate) fn lower_single_statement<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut stmts = self.lower_statement(node)?;
        match stmts.len() {
            1 => Ok(stmts.remove(0)),
            0 => Err(LowerError::at(
                LowerErrorCode::StmtConversion,
                "expected a statement",
                &node,
            )),
            _ => Err(LowerError::at(
                LowerErrorCode::StmtConversion,
                "multiple declarations require an enclosing block",
                &node,
            )),
        }
    }

    pub(crate) fn text<N: CstNode>(&self, node: &N) -> Cow<'s, str> {
        match self.source.get(node.byte_range()) {
            Some(bytes) => String::from_utf8_lossy(bytes),
            None => Cow::Borrowed(""),
        }
    }

    // ----- parser error reporting -----

    pub(crate) fn tree_error<N: CstNode>(&self, node: &N) -> Option<LowerError> {
        if !node.has_error() && !node.is_missing() {
            return None;
        }
        Some(LowerError::at(
            LowerErrorCode::TreeSitterError,
            self.tree_error_message(node),
            node,
        ))
    }

    /// Locate the first ERROR or missing node and describe the offending
    /// position, spelling out invisible characters.
    fn tree_error_message<N: CstNode>(&self, node: &N) -> String {
        if node.kind() == "ERROR" {
            let (row, column) = node.start_position();
            return format!(
                "syntax error at line {}, column {} near '{}'",
                row + 1,
                column,
                self.char_at(row, column)
            );
        }

        if let Some(error_node) = Self::find_error_node(node) {
            let (row, column) = error_node.start_position();
            return format!(
                "syntax error at line {}, column {} near '{}'",
                row + 1,
                column,
                self.char_at(row, column)
            );
        }

        if let Some(missing) = Self::find_missing_node(node) {
            let (row, column) = missing.start_position();
            return format!(
                "syntax error at line {}, column {}: missing '{}'",
                row + 1,
                column,
                missing.kind()
            );
        }

        format!("parse error in {}", node.kind())
    }

    fn char_at(&self, row: u32, column: u32) -> String {
        let mut lines = self.source.split(|&b| b == b'\n');
        let Some(line) = lines.nth(row as usize) else {
            return "EOF".to_string();
        };
        match line.get(column as usize) {
            None => "\\n".to_string(),
            Some(b'\t') => "\\t".to_string(),
            Some(b' ') => "SPACE".to_string(),
            Some(&byte) => String::from_utf8_lossy(&[byte]).into_owned(),
        }
    }

    fn find_error_node<N: CstNode>(node: &N) -> Option<N> {
        if node.kind() == "ERROR" {
            return Some(*node);
        }
        for i in 0..node.child_count() {
            if let Some(found) = node.child(i).as_ref().and_then(Self::find_error_node) {
                return Some(found);
            }
        }
        None
    }

    fn find_missing_node<N: CstNode>(node: &N) -> Option<N> {
        if node.is_missing() {
            return Some(*node);
        }
        for i in 0..node.child_count() {
            if let Some(found) = node.child(i).as_ref().and_then(Self::find_missing_node) {
                return Some(found);
            }
        }
        None
    }
}
