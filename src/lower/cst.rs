//! Concrete-tree adapter.
//!
//! The lowerer never touches a parser library directly; it consumes any tree
//! that can answer the [`CstNode`] questions below. The production
//! implementation is tree-sitter with the C grammar, wrapped by [`CParser`].

use std::ops::Range;

use crate::ast::Program;
use crate::lower::errors::LowerError;
use crate::lower::Lowerer;

/// Read-only view of one concrete-syntax-tree node.
///
/// Positions are raw parser coordinates: 0-based row and column. The lowerer
/// converts rows to 1-based lines when it builds AST locations.
pub trait CstNode: Copy {
    fn kind(&self) -> &str;
    fn child_count(&self) -> usize;
    fn child(&self, index: usize) -> Option<Self>;
    /// Grammar field name of the child at `index`, if the grammar names it.
    fn field_name_for_child(&self, index: usize) -> Option<&str>;
    fn start_position(&self) -> (u32, u32);
    fn end_position(&self) -> (u32, u32);
    fn byte_range(&self) -> Range<usize>;
    /// True when this node or any descendant failed to parse.
    fn has_error(&self) -> bool;
    /// True for zero-width nodes the parser inserted to recover.
    fn is_missing(&self) -> bool;
}

impl CstNode for tree_sitter::Node<'_> {
    fn kind(&self) -> &str {
        tree_sitter::Node::kind(self)
    }

    fn child_count(&self) -> usize {
        tree_sitter::Node::child_count(self)
    }

    fn child(&self, index: usize) -> Option<Self> {
        tree_sitter::Node::child(self, index)
    }

    fn field_name_for_child(&self, index: usize) -> Option<&str> {
        tree_sitter::Node::field_name_for_child(self, index as u32)
    }

    fn start_position(&self) -> (u32, u32) {
        let point = tree_sitter::Node::start_position(self);
        (point.row as u32, point.column as u32)
    }

    fn end_position(&self) -> (u32, u32) {
        let point = tree_sitter::Node::end_position(self);
        (point.row as u32, point.column as u32)
    }

    fn byte_range(&self) -> Range<usize> {
        tree_sitter::Node::byte_range(self)
    }

    fn has_error(&self) -> bool {
        tree_sitter::Node::has_error(self)
    }

    fn is_missing(&self) -> bool {
        tree_sitter::Node::is_missing(self)
    }
}

/// Tree-sitter parser configured for C, producing lowered programs.
pub struct CParser {
    parser: tree_sitter::Parser,
}

impl CParser {
    pub fn new() -> Result<Self, LowerError> {
        let mut parser = tree_sitter::Parser::new();
        let language: tree_sitter::Language = tree_sitter_c::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| LowerError::parse_failed(format!("failed to load C grammar: {e}")))?;
        Ok(CParser { parser })
    }

    /// Parse C source and lower the concrete tree to a [`Program`].
    pub fn parse_to_ast(&mut self, source: &str) -> Result<Program, LowerError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| LowerError::parse_failed("parser produced no tree"))?;
        Lowerer::new(source.as_bytes()).lower_program(tree.root_node())
    }
}
