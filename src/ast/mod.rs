// AST definitions shared by the lowerer, validator, and interpreter

use serde::Serialize;

/// Source span of a node: 1-based lines, 0-based columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Location {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

/// Type of a declaration: base type name, pointer depth, and array
/// dimensions (outermost first; empty means scalar).
///
/// The base is kept as the raw source text so that unknown types flow to the
/// validator instead of failing during lowering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CType {
    pub base: String,
    pub pointer_depth: usize,
    pub array_dims: Vec<usize>,
}

impl CType {
    pub fn new(base: impl Into<String>) -> Self {
        CType {
            base: base.into(),
            pointer_depth: 0,
            array_dims: Vec::new(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.array_dims.is_empty()
    }
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub ty: CType,
    pub name: String,
    pub loc: Location,
}

/// One `else if` clause of an [`Stmt::If`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub loc: Location,
}

/// Statements of the C subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Stmt {
    VariableDecl {
        ty: CType,
        name: String,
        init: Option<Expr>,
        is_global: bool,
        loc: Location,
    },
    FunctionDecl {
        name: String,
        return_type: CType,
        params: Vec<Param>,
        body: Box<Stmt>,
        loc: Location,
    },
    #[serde(rename = "IfStmt")]
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_ifs: Vec<ElseIf>,
        else_branch: Option<Box<Stmt>>,
        loc: Location,
    },
    #[serde(rename = "WhileStmt")]
    While {
        condition: Expr,
        body: Box<Stmt>,
        loc: Location,
    },
    #[serde(rename = "DoWhileStmt")]
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
        loc: Location,
    },
    #[serde(rename = "ForStmt")]
    For {
        /// Initializer statements; a multi-declarator header yields one
        /// entry per declarator. Empty means no initializer.
        init: Vec<Stmt>,
        condition: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Box<Stmt>,
        loc: Location,
    },
    #[serde(rename = "ReturnStmt")]
    Return {
        value: Option<Expr>,
        loc: Location,
    },
    #[serde(rename = "BlockStmt")]
    Block {
        statements: Vec<Stmt>,
        loc: Location,
    },
    ExprStmt {
        expr: Expr,
        loc: Location,
    },
    #[serde(rename = "BreakStmt")]
    Break {
        loc: Location,
    },
    #[serde(rename = "ContinueStmt")]
    Continue {
        loc: Location,
    },
    #[serde(rename = "GotoStmt")]
    Goto {
        label: String,
        loc: Location,
    },
    #[serde(rename = "LabelStmt")]
    Label {
        name: String,
        statement: Box<Stmt>,
        loc: Location,
    },
}

impl Stmt {
    pub fn loc(&self) -> &Location {
        match self {
            Stmt::VariableDecl { loc, .. } => loc,
            Stmt::FunctionDecl { loc, .. } => loc,
            Stmt::If { loc, .. } => loc,
            Stmt::While { loc, .. } => loc,
            Stmt::DoWhile { loc, .. } => loc,
            Stmt::For { loc, .. } => loc,
            Stmt::Return { loc, .. } => loc,
            Stmt::Block { loc, .. } => loc,
            Stmt::ExprStmt { loc, .. } => loc,
            Stmt::Break { loc } => loc,
            Stmt::Continue { loc } => loc,
            Stmt::Goto { loc, .. } => loc,
            Stmt::Label { loc, .. } => loc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::VariableDecl { .. } => "VariableDecl",
            Stmt::FunctionDecl { .. } => "FunctionDecl",
            Stmt::If { .. } => "IfStmt",
            Stmt::While { .. } => "WhileStmt",
            Stmt::DoWhile { .. } => "DoWhileStmt",
            Stmt::For { .. } => "ForStmt",
            Stmt::Return { .. } => "ReturnStmt",
            Stmt::Block { .. } => "BlockStmt",
            Stmt::ExprStmt { .. } => "ExprStmt",
            Stmt::Break { .. } => "BreakStmt",
            Stmt::Continue { .. } => "ContinueStmt",
            Stmt::Goto { .. } => "GotoStmt",
            Stmt::Label { .. } => "LabelStmt",
        }
    }
}

/// Expressions of the C subset. Operators are carried as their source token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Expr {
    IntLiteral {
        value: i64,
        loc: Location,
    },
    #[serde(rename = "VariableExpr")]
    Variable {
        name: String,
        loc: Location,
    },
    #[serde(rename = "BinaryExpr")]
    Binary {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
        loc: Location,
    },
    #[serde(rename = "UnaryExpr")]
    Unary {
        operator: String,
        operand: Box<Expr>,
        postfix: bool,
        loc: Location,
    },
    #[serde(rename = "AssignmentExpr")]
    Assignment {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
        loc: Location,
    },
    #[serde(rename = "CallExpr")]
    Call {
        function: String,
        args: Vec<Expr>,
        loc: Location,
    },
    #[serde(rename = "ArrayAccessExpr")]
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
        loc: Location,
    },
    #[serde(rename = "ArrayInitExpr")]
    ArrayInit {
        elements: Vec<Expr>,
        loc: Location,
    },
}

impl Expr {
    pub fn loc(&self) -> &Location {
        match self {
            Expr::IntLiteral { loc, .. } => loc,
            Expr::Variable { loc, .. } => loc,
            Expr::Binary { loc, .. } => loc,
            Expr::Unary { loc, .. } => loc,
            Expr::Assignment { loc, .. } => loc,
            Expr::Call { loc, .. } => loc,
            Expr::ArrayAccess { loc, .. } => loc,
            Expr::ArrayInit { loc, .. } => loc,
        }
    }

    /// Static lvalue classification: variable references and array
    /// subscripts designate storage; everything else is a plain value.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Variable { .. } | Expr::ArrayAccess { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLiteral { .. } => "IntLiteral",
            Expr::Variable { .. } => "VariableExpr",
            Expr::Binary { .. } => "BinaryExpr",
            Expr::Unary { .. } => "UnaryExpr",
            Expr::Assignment { .. } => "AssignmentExpr",
            Expr::Call { .. } => "CallExpr",
            Expr::ArrayAccess { .. } => "ArrayAccessExpr",
            Expr::ArrayInit { .. } => "ArrayInitExpr",
        }
    }
}

/// Root of a lowered program: top-level declarations in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub declarations: Vec<Stmt>,
    pub loc: Location,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
