// Statement execution and the break/continue/return protocol

use std::rc::Rc;

use crate::ast::{CType, ElseIf, Expr, Location, Stmt};
use crate::events::Event;
use crate::interpreter::engine::{ExecResult, Interpreter};
use crate::interpreter::expressions::InitValue;
use crate::runtime::cells::{Array, Array2D, Declared, Variable};
use crate::runtime::errors::RuntimeError;

impl Interpreter {
    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<ExecResult, RuntimeError> {
        match stmt {
            Stmt::VariableDecl {
                ty,
                name,
                init,
                is_global,
                loc,
            } => self.execute_variable_decl(ty, name, init.as_ref(), *is_global, loc),
            Stmt::FunctionDecl {
                name,
                return_type,
                params,
                body,
                loc,
            } => {
                self.register_function(name, return_type, params, body, *loc)?;
                Ok(ExecResult::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                loc,
            } => self.execute_if(condition, then_branch, else_ifs, else_branch.as_deref(), loc),
            Stmt::While {
                condition,
                body,
                loc,
            } => self.execute_while(condition, body, loc),
            Stmt::DoWhile {
                body,
                condition,
                loc,
            } => self.execute_do_while(body, condition, loc),
            Stmt::For {
                init,
                condition,
                post,
                body,
                loc,
            } => self.execute_for(init, condition.as_ref(), post.as_deref(), body, loc),
            Stmt::Return { value, loc } => {
                self.note_line(loc)?;
                let value = match value {
                    Some(expr) => Some(self.eval_int(expr)?),
                    None => None,
                };
                self.commit_step()?;
                Ok(ExecResult::Return(value))
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::ExprStmt { expr, loc } => {
                self.note_line(loc)?;
                self.eval_expr(expr)?;
                self.commit_step()?;
                Ok(ExecResult::Normal)
            }
            Stmt::Break { loc } => {
                self.note_line(loc)?;
                self.commit_step()?;
                Ok(ExecResult::Break)
            }
            Stmt::Continue { loc } => {
                self.note_line(loc)?;
                self.commit_step()?;
                Ok(ExecResult::Continue)
            }
            Stmt::Goto { label, loc } => Err(RuntimeError::internal(format!(
                "goto '{label}' is not supported at runtime"
            ))
            .with_location(*loc)),
            Stmt::Label { statement, .. } => self.execute_statement(statement),
        }
    }

    fn execute_variable_decl(
        &mut self,
        ty: &CType,
        name: &str,
        init: Option<&Expr>,
        is_global: bool,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        self.note_line(loc)?;

        match ty.array_dims.len() {
            0 => {
                let value = match init {
                    Some(expr) => Some(self.eval_int(expr)?),
                    None => None,
                };
                let step = self.current_step();
                let variable = Variable::new(name, value, step, is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Variable(Rc::new(variable)));
                self.emit(Event::DeclareVar {
                    name: name.to_string(),
                    value,
                    is_global,
                })?;
            }
            1 => {
                let size = ty.array_dims[0];
                let values = match init {
                    Some(expr) => match self.eval_array_initializer(expr)? {
                        InitValue::Scalars(values) => {
                            if values.len() > size {
                                return Err(RuntimeError::internal(format!(
                                    "too many initializer values for array '{name}'"
                                ))
                                .with_location(*loc));
                            }
                            Some(values)
                        }
                        InitValue::Rows(_) => {
                            return Err(RuntimeError::internal(format!(
                                "types mismatch in initializer for array '{name}'"
                            ))
                            .with_location(*loc));
                        }
                    },
                    None => None,
                };
                let step = self.current_step();
                let array = Array::new(name, size, values.as_deref(), step, is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Array(Rc::new(array)));
                self.emit(Event::DeclareArray {
                    name: name.to_string(),
                    size,
                    values,
                    is_global,
                })?;
            }
            2 => {
                let rows = ty.array_dims[0];
                let cols = ty.array_dims[1];
                let values = match init {
                    Some(expr) => match self.eval_array_initializer(expr)? {
                        InitValue::Rows(values) => {
                            if values.len() > rows
                                || values.iter().any(|row| row.len() > cols)
                            {
                                return Err(RuntimeError::internal(format!(
                                    "too many initializer values for array '{name}'"
                                ))
                                .with_location(*loc));
                            }
                            Some(values)
                        }
                        InitValue::Scalars(_) => {
                            return Err(RuntimeError::internal(format!(
                                "types mismatch in initializer for array '{name}'"
                            ))
                            .with_location(*loc));
                        }
                    },
                    None => None,
                };
                let step = self.current_step();
                let array = Array2D::new(name, rows, cols, values.as_deref(), step, is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Array2D(Rc::new(array)));
                self.emit(Event::DeclareArray2D {
                    name: name.to_string(),
                    rows,
                    cols,
                    values,
                    is_global,
                })?;
            }
            rank => {
                return Err(RuntimeError::internal(format!(
                    "unsupported array rank {rank} for '{name}'"
                ))
                .with_location(*loc));
            }
        }

        self.commit_step()?;
        Ok(ExecResult::Normal)
    }

    /// Execute a block in a fresh scope. The scope exits on every path:
    /// fall-through, break, continue, return, and error.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<ExecResult, RuntimeError> {
        self.call_stack.current_frame_mut().enter_scope();
        self.emit(Event::EnterScope)?;

        let mut outcome = ExecResult::Normal;
        let mut error = None;
        for stmt in statements {
            match self.execute_statement(stmt) {
                Ok(ExecResult::Normal) => {}
                Ok(other) => {
                    outcome = other;
                    break;
                }
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        let exit_result = self.call_stack.current_frame_mut().exit_scope();
        if let Some(err) = error {
            return Err(err);
        }
        exit_result?;

        self.emit(Event::ExitScope)?;
        self.commit_step()?;
        Ok(outcome)
    }

    fn execute_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_ifs: &[ElseIf],
        else_branch: Option<&Stmt>,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        self.note_line(loc)?;
        let taken = self.eval_int(condition)? != 0;
        self.commit_step()?;
        if taken {
            return self.execute_statement(then_branch);
        }

        for clause in else_ifs {
            self.note_line(&clause.loc)?;
            let taken = self.eval_int(&clause.condition)? != 0;
            self.commit_step()?;
            if taken {
                return self.execute_statement(&clause.body);
            }
        }

        match else_branch {
            Some(else_branch) => self.execute_statement(else_branch),
            None => Ok(ExecResult::Normal),
        }
    }

    fn execute_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        loop {
            self.note_line(loc)?;
            let keep_going = self.eval_int(condition)? != 0;
            self.commit_step()?;
            if !keep_going {
                break;
            }

            match self.execute_statement(body)? {
                ExecResult::Break => break,
                ExecResult::Continue | ExecResult::Normal => {}
                result @ ExecResult::Return(_) => return Ok(result),
            }
        }
        Ok(ExecResult::Normal)
    }

    fn execute_do_while(
        &mut self,
        body: &Stmt,
        condition: &Expr,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        loop {
            match self.execute_statement(body)? {
                ExecResult::Break => break,
                ExecResult::Continue | ExecResult::Normal => {}
                result @ ExecResult::Return(_) => return Ok(result),
            }

            self.note_line(loc)?;
            let keep_going = self.eval_int(condition)? != 0;
            self.commit_step()?;
            if !keep_going {
                break;
            }
        }
        Ok(ExecResult::Normal)
    }

    /// The for statement opens an implicit scope enclosing the initializer,
    /// condition, post expression, and body.
    fn execute_for(
        &mut self,
        init: &[Stmt],
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Stmt,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        self.call_stack.current_frame_mut().enter_scope();
        self.emit(Event::EnterScope)?;

        let result = self.run_for_loop(init, condition, post, body, loc);

        let exit_result = self.call_stack.current_frame_mut().exit_scope();
        let outcome = result?;
        exit_result?;

        self.emit(Event::ExitScope)?;
        self.commit_step()?;
        Ok(outcome)
    }

    fn run_for_loop(
        &mut self,
        init: &[Stmt],
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Stmt,
        loc: &Location,
    ) -> Result<ExecResult, RuntimeError> {
        for stmt in init {
            self.execute_statement(stmt)?;
        }

        loop {
            if let Some(condition) = condition {
                self.note_line(loc)?;
                let keep_going = self.eval_int(condition)? != 0;
                self.commit_step()?;
                if !keep_going {
                    break;
                }
            }

            match self.execute_statement(body)? {
                ExecResult::Break => break,
                ExecResult::Continue | ExecResult::Normal => {}
                result @ ExecResult::Return(_) => return Ok(result),
            }

            if let Some(post) = post {
                self.execute_statement(post)?;
            }
        }

        Ok(ExecResult::Normal)
    }
}
