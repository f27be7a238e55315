//! Lexical scopes, stack frames, and the call stack.
//!
//! The global scope is a single object: every frame's scope chain is rooted
//! at the same `Rc<Scope>`, so globals declared by one frame are visible to
//! all of them. Inner scopes link to their parent and die with their block;
//! a function frame never sees the caller's locals because its chain goes
//! straight from its own scopes to the shared global scope.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::cells::{Array, Array2D, Declared, Variable};
use crate::runtime::errors::RuntimeError;

/// One lexical scope: insertion-ordered declarations plus a parent link.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    declarations: RefCell<Vec<Declared>>,
}

impl Scope {
    pub fn new(parent: Option<Rc<Scope>>) -> Rc<Scope> {
        Rc::new(Scope {
            parent,
            declarations: RefCell::new(Vec::new()),
        })
    }

    /// Declare an item. A same-name item already in this scope is replaced
    /// in place, which keeps event replay over the preserved global scope
    /// from accumulating duplicates.
    pub fn declare(&self, item: Declared) {
        let mut declarations = self.declarations.borrow_mut();
        if let Some(existing) = declarations
            .iter_mut()
            .find(|d| d.name() == item.name())
        {
            *existing = item;
            return;
        }
        declarations.push(item);
    }

    /// First-match lookup in insertion order, this scope only.
    pub fn get(&self, name: &str) -> Option<Declared> {
        self.declarations
            .borrow()
            .iter()
            .find(|d| d.name() == name)
            .cloned()
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    pub fn declarations(&self) -> Vec<Declared> {
        self.declarations.borrow().clone()
    }
}

/// Activation record of one function call.
///
/// The bottom scope is always the shared global scope; parameters and locals
/// live in scopes pushed above it.
#[derive(Debug)]
pub struct StackFrame {
    pub func_name: String,
    scopes: Vec<Rc<Scope>>,
    return_value: RefCell<Option<i64>>,
}

impl StackFrame {
    pub fn new(func_name: impl Into<String>, global_scope: Rc<Scope>) -> Self {
        StackFrame {
            func_name: func_name.into(),
            scopes: vec![global_scope],
            return_value: RefCell::new(None),
        }
    }

    pub fn enter_scope(&mut self) {
        let parent = self.scopes.last().cloned();
        self.scopes.push(Scope::new(parent));
    }

    pub fn exit_scope(&mut self) -> Result<(), RuntimeError> {
        if self.scopes.len() <= 1 {
            return Err(RuntimeError::internal(
                "cannot exit the global scope of a stack frame",
            ));
        }
        self.scopes.pop();
        Ok(())
    }

    pub fn current_scope(&self) -> &Rc<Scope> {
        // scopes is never empty: the frame is created with the global scope
        self.scopes.last().expect("frame has no scopes")
    }

    pub fn scopes(&self) -> &[Rc<Scope>] {
        &self.scopes
    }

    /// Walk the scope chain from the innermost scope outward. The chain ends
    /// at the shared global scope.
    pub fn lookup(&self, name: &str) -> Option<Declared> {
        let mut current = Some(self.current_scope().clone());
        while let Some(scope) = current {
            if let Some(found) = scope.get(name) {
                return Some(found);
            }
            current = scope.parent().cloned();
        }
        None
    }

    pub fn variable(&self, name: &str) -> Option<Rc<Variable>> {
        match self.lookup(name) {
            Some(Declared::Variable(v)) => Some(v),
            _ => None,
        }
    }

    pub fn array(&self, name: &str) -> Option<Rc<Array>> {
        match self.lookup(name) {
            Some(Declared::Array(a)) => Some(a),
            _ => None,
        }
    }

    pub fn array2d(&self, name: &str) -> Option<Rc<Array2D>> {
        match self.lookup(name) {
            Some(Declared::Array2D(a)) => Some(a),
            _ => None,
        }
    }

    pub fn declare(&self, item: Declared) {
        self.current_scope().declare(item);
    }

    pub fn set_return_value(&self, value: i64) {
        *self.return_value.borrow_mut() = Some(value);
    }

    pub fn return_value(&self) -> Option<i64> {
        *self.return_value.borrow()
    }
}

/// The call stack. The bottom frame is a synthetic "global" frame whose only
/// scope is the global scope; it exists for the whole execution and cannot
/// be popped.
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<StackFrame>,
}

impl CallStack {
    pub fn new(global_scope: Rc<Scope>) -> Self {
        CallStack {
            frames: vec![StackFrame::new("global", global_scope)],
        }
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Result<StackFrame, RuntimeError> {
        if self.frames.len() <= 1 {
            return Err(RuntimeError::internal(
                "cannot pop the global frame from the call stack",
            ));
        }
        Ok(self.frames.pop().expect("call stack is empty"))
    }

    pub fn current_frame(&self) -> &StackFrame {
        self.frames.last().expect("call stack is empty")
    }

    pub fn current_frame_mut(&mut self) -> &mut StackFrame {
        self.frames.last_mut().expect("call stack is empty")
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn frames_count(&self) -> usize {
        self.frames.len()
    }
}
