//! Declaration lowering: declarator recovery, variable declarations, and
//! function headers.

use crate::ast::{CType, Location, Param, Stmt};
use crate::lower::cst::CstNode;
use crate::lower::errors::{LowerError, LowerErrorCode};
use crate::lower::{node_location, Lowerer};

/// Result of reducing a declarator chain: pointer wrappers raise the depth,
/// array wrappers collect dimensions (outermost first), and an identifier at
/// the bottom supplies the name.
struct DeclaratorInfo {
    pointer_depth: usize,
    array_dims: Vec<usize>,
    name: String,
}

impl<'s> Lowerer<'s> {
    /// Lower a `declaration` node. Each declarator becomes its own
    /// [`Stmt::VariableDecl`], so `int a = 1, b;` yields two statements.
    pub(crate) fn lower_declaration<N: CstNode>(
        &self,
        node: N,
        is_global: bool,
    ) -> Result<Vec<Stmt>, LowerError> {
        let mut base: Option<String> = None;
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if matches!(child.kind(), "primitive_type" | "type_identifier") {
                base = Some(self.text(&child).into_owned());
            }
        }
        let base = base.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "declaration missing type",
                &node,
            )
        })?;

        let loc = node_location(&node);
        let mut decls = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "init_declarator" => {
                    decls.push(self.lower_init_declarator(child, &base, is_global, loc)?);
                }
                "identifier" | "pointer_declarator" | "array_declarator" => {
                    let info = self.parse_declarator(child)?;
                    decls.push(Stmt::VariableDecl {
                        ty: CType {
                            base: base.clone(),
                            pointer_depth: info.pointer_depth,
                            array_dims: info.array_dims,
                        },
                        name: info.name,
                        init: None,
                        is_global,
                        loc,
                    });
                }
                _ => {}
            }
        }

        if decls.is_empty() {
            return Err(LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "declaration without a declarator",
                &node,
            ));
        }

        Ok(decls)
    }

    /// `init_declarator`: declarator `=` initializer.
    fn lower_init_declarator<N: CstNode>(
        &self,
        node: N,
        base: &str,
        is_global: bool,
        loc: Location,
    ) -> Result<Stmt, LowerError> {
        let mut declarator: Option<N> = None;
        let mut initializer: Option<N> = None;
        let mut seen_equals = false;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "=" => seen_equals = true,
                "comment" => {}
                "identifier" | "pointer_declarator" | "array_declarator" if !seen_equals => {
                    declarator = Some(child);
                }
                _ if seen_equals => initializer = Some(child),
                _ => {}
            }
        }

        let declarator = declarator.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "declaration without a variable name",
                &node,
            )
        })?;
        if seen_equals && initializer.is_none() {
            return Err(LowerError::at(
                LowerErrorCode::InitializerConversion,
                "declaration initializer is missing",
                &node,
            ));
        }

        let info = self.parse_declarator(declarator)?;
        let init = initializer
            .map(|n| self.lower_expression(n))
            .transpose()?;

        Ok(Stmt::VariableDecl {
            ty: CType {
                base: base.to_string(),
                pointer_depth: info.pointer_depth,
                array_dims: info.array_dims,
            },
            name: info.name,
            init,
            is_global,
            loc,
        })
    }

    /// Reduce a declarator chain: any sequence of pointer and array wrappers
    /// around an identifier. Dimensions keep outer-first order; a non-literal
    /// array size or a missing identifier is `InvalidDeclaration`.
    fn parse_declarator<N: CstNode>(&self, node: N) -> Result<DeclaratorInfo, LowerError> {
        let mut pointer_depth = 0usize;
        let mut array_dims: Vec<usize> = Vec::new();
        let mut current = node;

        loop {
            match current.kind() {
                "pointer_declarator" => {
                    pointer_depth += 1;
                    let mut inner = None;
                    for i in 0..current.child_count() {
                        let Some(child) = current.child(i) else { continue };
                        if !matches!(child.kind(), "*" | "comment") {
                            inner = Some(child);
                            break;
                        }
                    }
                    current = inner.ok_or_else(|| {
                        LowerError::at(
                            LowerErrorCode::InvalidDeclaration,
                            "pointer declarator without a declarator",
                            &current,
                        )
                    })?;
                }
                "array_declarator" => {
                    let mut inner = None;
                    let mut size: Option<usize> = None;
                    for i in 0..current.child_count() {
                        let Some(child) = current.child(i) else { continue };
                        if i == 0 {
                            inner = Some(child);
                            continue;
                        }
                        match child.kind() {
                            "number_literal" => {
                                size = self.text(&child).parse::<usize>().ok();
                                if size.is_none() {
                                    return Err(LowerError::at(
                                        LowerErrorCode::InvalidDeclaration,
                                        "array size must be a non-negative integer literal",
                                        &child,
                                    ));
                                }
                            }
                            "[" | "]" | "comment" => {}
                            kind => {
                                return Err(LowerError::at(
                                    LowerErrorCode::InvalidDeclaration,
                                    format!("array size must be an integer literal, got {kind}"),
                                    &child,
                                ));
                            }
                        }
                    }
                    let size = size.ok_or_else(|| {
                        LowerError::at(
                            LowerErrorCode::InvalidDeclaration,
                            "array declarator without a size",
                            &current,
                        )
                    })?;
                    array_dims.insert(0, size);
                    current = inner.ok_or_else(|| {
                        LowerError::at(
                            LowerErrorCode::InvalidDeclaration,
                            "array declarator without a declarator",
                            &current,
                        )
                    })?;
                }
                "identifier" => {
                    let name = self.text(&current).into_owned();
                    self.validate_identifier(&name, &current)?;
                    return Ok(DeclaratorInfo {
                        pointer_depth,
                        array_dims,
                        name,
                    });
                }
                kind => {
                    return Err(LowerError::at(
                        LowerErrorCode::InvalidDeclaration,
                        format!("unexpected declarator node: {kind}"),
                        &current,
                    ));
                }
            }
        }
    }

    /// Lower a `function_definition` node.
    pub(crate) fn lower_function_definition<N: CstNode>(&self, node: N) -> Result<Stmt, LowerError> {
        let mut return_base: Option<String> = None;
        let mut pointer_depth = 0usize;
        let mut name: Option<String> = None;
        let mut params: Vec<Param> = Vec::new();
        let mut body: Option<Stmt> = None;

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "primitive_type" | "type_identifier" => {
                    return_base = Some(self.text(&child).into_owned());
                }
                "function_declarator" => {
                    let (parsed_name, parsed_params) = self.parse_function_declarator(child)?;
                    name = Some(parsed_name);
                    params = parsed_params;
                }
                "pointer_declarator" => {
                    // pointer wrappers over the declarator raise the return
                    // type's pointer depth
                    let mut current = child;
                    while current.kind() == "pointer_declarator" {
                        pointer_depth += 1;
                        let mut inner = None;
                        for j in 0..current.child_count() {
                            let Some(sub) = current.child(j) else { continue };
                            if !matches!(sub.kind(), "*" | "comment") {
                                inner = Some(sub);
                                break;
                            }
                        }
                        match inner {
                            Some(next) => current = next,
                            None => break,
                        }
                    }
                    if current.kind() == "function_declarator" {
                        let (parsed_name, parsed_params) = self.parse_function_declarator(current)?;
                        name = Some(parsed_name);
                        params = parsed_params;
                    }
                }
                "compound_statement" => {
                    body = Some(self.lower_compound_statement(child)?);
                }
                _ => {}
            }
        }

        let base = return_base.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "function definition missing return type",
                &node,
            )
        })?;
        let name = name.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "function definition missing name",
                &node,
            )
        })?;
        let body = body.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "function definition missing body",
                &node,
            )
        })?;

        Ok(Stmt::FunctionDecl {
            name,
            return_type: CType {
                base,
                pointer_depth,
                array_dims: Vec::new(),
            },
            params,
            body: Box::new(body),
            loc: node_location(&node),
        })
    }

    fn parse_function_declarator<N: CstNode>(
        &self,
        node: N,
    ) -> Result<(String, Vec<Param>), LowerError> {
        let mut name: Option<String> = None;
        let mut params: Vec<Param> = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "identifier" => {
                    let text = self.text(&child).into_owned();
                    self.validate_identifier(&text, &child)?;
                    name = Some(text);
                }
                "parameter_list" => {
                    params = self.parse_parameter_list(child)?;
                }
                _ => {}
            }
        }

        let name = name.ok_or_else(|| {
            LowerError::at(
                LowerErrorCode::InvalidDeclaration,
                "function declarator missing name",
                &node,
            )
        })?;
        Ok((name, params))
    }

    fn parse_parameter_list<N: CstNode>(&self, node: N) -> Result<Vec<Param>, LowerError> {
        let mut params = Vec::new();

        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if child.kind() != "parameter_declaration" {
                continue;
            }

            let mut base: Option<String> = None;
            let mut declarator: Option<N> = None;
            for j in 0..child.child_count() {
                let Some(sub) = child.child(j) else { continue };
                match sub.kind() {
                    "primitive_type" | "type_identifier" => {
                        base = Some(self.text(&sub).into_owned());
                    }
                    "identifier" | "pointer_declarator" | "array_declarator" => {
                        declarator = Some(sub);
                    }
                    _ => {}
                }
            }

            let base = base.ok_or_else(|| {
                LowerError::at(
                    LowerErrorCode::InvalidDeclaration,
                    "parameter missing type",
                    &child,
                )
            })?;

            let Some(declarator) = declarator else {
                // `f(void)` declares no parameters
                if base == "void" {
                    continue;
                }
                return Err(LowerError::at(
                    LowerErrorCode::InvalidDeclaration,
                    "parameter missing name",
                    &child,
                ));
            };

            let info = self.parse_declarator(declarator)?;
            params.push(Param {
                ty: CType {
                    base,
                    pointer_depth: info.pointer_depth,
                    array_dims: info.array_dims,
                },
                name: info.name,
                loc: node_location(&child),
            });
        }

        Ok(params)
    }
}
