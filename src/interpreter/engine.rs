// Execution engine: program entry, function calls, event bookkeeping

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{CType, Expr, Location, Param, Program, Stmt};
use crate::events::Event;
use crate::runtime::cells::{Declared, Variable};
use crate::runtime::errors::RuntimeError;
use crate::runtime::stack::{CallStack, Scope, StackFrame};
use crate::snapshot::EventDispatcher;

/// Outcome of executing one statement. Non-normal results propagate up the
/// walk until a loop (break/continue) or a call site (return) absorbs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecResult {
    Normal,
    Break,
    Continue,
    Return(Option<i64>),
}

/// A registered function definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: CType,
    pub params: Vec<Param>,
    pub body: Stmt,
    pub loc: Location,
}

/// The interpreter: live runtime state plus the event dispatcher that
/// mirrors it for the visualizer.
pub struct Interpreter {
    pub(crate) call_stack: CallStack,
    pub(crate) global_scope: Rc<Scope>,
    pub(crate) functions: FxHashMap<String, Rc<Function>>,
    pub(crate) dispatcher: EventDispatcher,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let global_scope = Scope::new(None);
        Interpreter {
            call_stack: CallStack::new(global_scope.clone()),
            global_scope,
            functions: FxHashMap::default(),
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Execute a whole program: register functions, run global initializers,
    /// then call `main` with no arguments. Returns `main`'s value, or `None`
    /// when `main` falls through without returning.
    pub fn execute_program(&mut self, program: &Program) -> Result<Option<i64>, RuntimeError> {
        for decl in &program.declarations {
            match decl {
                Stmt::FunctionDecl { .. } | Stmt::VariableDecl { .. } => {
                    self.execute_statement(decl)?;
                }
                other => {
                    return Err(RuntimeError::internal(format!(
                        "unsupported top-level declaration: {}",
                        other.kind_name()
                    ))
                    .with_location(*other.loc()));
                }
            }
        }

        if !self.functions.contains_key("main") {
            return Err(RuntimeError::internal("entrypoint function main not found"));
        }

        self.call_function("main", &[], program.loc)
    }

    /// Call a function: arguments evaluate in the caller's frame before the
    /// new frame exists, then parameters are declared by value in a fresh
    /// inner scope. The frame is popped on every exit path.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        loc: Location,
    ) -> Result<Option<i64>, RuntimeError> {
        let Some(function) = self.functions.get(name).cloned() else {
            return Err(
                RuntimeError::internal(format!("unknown function named '{name}'"))
                    .with_location(loc),
            );
        };

        if args.len() != function.params.len() {
            return Err(RuntimeError::internal(format!(
                "function '{}' expects {} arguments, got {}",
                name,
                function.params.len(),
                args.len()
            ))
            .with_location(loc));
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_int(arg)?);
        }

        // commit whatever the caller's statement accumulated, then record
        // the call prologue as its own step
        self.commit_step()?;
        self.emit(Event::FunctionCall {
            name: name.to_string(),
        })?;
        self.emit(Event::EnterScope)?;

        self.call_stack
            .push_frame(StackFrame::new(name, self.global_scope.clone()));
        self.call_stack.current_frame_mut().enter_scope();

        let step = self.dispatcher.next_step_number();
        for (param, value) in function.params.iter().zip(&arg_values) {
            let variable = Variable::new(param.name.clone(), Some(*value), step, false);
            self.call_stack
                .current_frame()
                .declare(Declared::Variable(Rc::new(variable)));
            self.emit(Event::DeclareVar {
                name: param.name.clone(),
                value: Some(*value),
                is_global: false,
            })?;
        }
        self.commit_step()?;

        match self.execute_statement(&function.body) {
            Ok(result) => {
                let value = match result {
                    ExecResult::Return(value) => value,
                    ExecResult::Normal => None,
                    ExecResult::Break | ExecResult::Continue => {
                        let _ = self.call_stack.pop_frame();
                        return Err(RuntimeError::internal(
                            "break or continue outside of a loop",
                        )
                        .with_location(loc));
                    }
                };
                self.emit(Event::FunctionReturn {
                    name: name.to_string(),
                    value,
                })?;
                self.commit_step()?;
                self.call_stack.pop_frame()?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.call_stack.pop_frame();
                Err(err)
            }
        }
    }

    pub(crate) fn register_function(
        &mut self,
        name: &str,
        return_type: &CType,
        params: &[Param],
        body: &Stmt,
        loc: Location,
    ) -> Result<(), RuntimeError> {
        if self.functions.contains_key(name) {
            return Err(
                RuntimeError::internal(format!("functions with the same name: {name}"))
                    .with_location(loc),
            );
        }
        self.functions.insert(
            name.to_string(),
            Rc::new(Function {
                name: name.to_string(),
                return_type: return_type.clone(),
                params: params.to_vec(),
                body: body.clone(),
                loc,
            }),
        );
        Ok(())
    }

    // ----- event bookkeeping -----

    /// Emit an event, lazily opening a step if none is in progress.
    pub(crate) fn emit(&mut self, event: Event) -> Result<(), RuntimeError> {
        self.dispatcher.begin_step();
        self.dispatcher.emit(event)
    }

    /// Commit the open step, if any.
    pub(crate) fn commit_step(&mut self) -> Result<(), RuntimeError> {
        if self.dispatcher.step_in_progress() {
            self.dispatcher.end_step()?;
        }
        Ok(())
    }

    pub(crate) fn note_line(&mut self, loc: &Location) -> Result<(), RuntimeError> {
        self.emit(Event::LineChanged { line: loc.line })
    }

    /// Step number live cell writes are tagged with.
    pub(crate) fn current_step(&self) -> usize {
        self.dispatcher.next_step_number()
    }

    // ----- accessors -----

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    pub fn into_dispatcher(self) -> EventDispatcher {
        self.dispatcher
    }

    pub fn frames_count(&self) -> usize {
        self.call_stack.frames_count()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }
}
