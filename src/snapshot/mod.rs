//! Snapshot reconstruction and the event dispatcher.
//!
//! The dispatcher buffers events into steps and applies each committed step
//! to its own [`Snapshot`] — a replica of the runtime state that is rebuilt
//! purely from events. Navigation forward applies pending steps in order;
//! navigation backward resets the snapshot and replays from step zero. The
//! global scope object survives a reset (declarations replayed into it
//! replace their previous incarnations), so rewinding is cheap and
//! structurally exact.

use std::rc::Rc;

use crate::events::{Event, Step};
use crate::runtime::cells::{Array, Array2D, Declared, Variable};
use crate::runtime::errors::RuntimeError;
use crate::runtime::stack::{CallStack, Scope, StackFrame};

/// Reconstructable runtime state at some step index.
#[derive(Debug)]
pub struct Snapshot {
    call_stack: CallStack,
    global_scope: Rc<Scope>,
    line: u32,
}

impl Snapshot {
    pub fn new(global_scope: Rc<Scope>) -> Self {
        Snapshot {
            call_stack: CallStack::new(global_scope.clone()),
            global_scope,
            line: 0,
        }
    }

    /// Apply one event, tagging any cells it writes with `step`.
    pub fn apply(&mut self, event: &Event, step: usize) -> Result<(), RuntimeError> {
        match event {
            Event::EnterScope => {
                self.call_stack.current_frame_mut().enter_scope();
                Ok(())
            }
            Event::ExitScope => self.call_stack.current_frame_mut().exit_scope(),
            Event::DeclareVar {
                name,
                value,
                is_global,
            } => {
                let variable = Variable::new(name.clone(), *value, step, *is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Variable(Rc::new(variable)));
                Ok(())
            }
            Event::DeclareArray {
                name,
                size,
                values,
                is_global,
            } => {
                let array = Array::new(name.clone(), *size, values.as_deref(), step, *is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Array(Rc::new(array)));
                Ok(())
            }
            Event::DeclareArray2D {
                name,
                rows,
                cols,
                values,
                is_global,
            } => {
                let array =
                    Array2D::new(name.clone(), *rows, *cols, values.as_deref(), step, *is_global);
                self.call_stack
                    .current_frame()
                    .declare(Declared::Array2D(Rc::new(array)));
                Ok(())
            }
            Event::VarChanged { name, value } => {
                let variable = self.call_stack.current_frame().variable(name).ok_or_else(|| {
                    RuntimeError::undefined_behavior(format!("variable '{name}' not found"))
                })?;
                variable.assign(*value, step);
                Ok(())
            }
            Event::ArrayElementChanged { name, index, value } => {
                let array = self.call_stack.current_frame().array(name).ok_or_else(|| {
                    RuntimeError::undefined_behavior(format!("array '{name}' not found"))
                })?;
                array.set_element(*index, *value, step)
            }
            Event::Array2DElementChanged {
                name,
                row,
                col,
                value,
            } => {
                let array = self.call_stack.current_frame().array2d(name).ok_or_else(|| {
                    RuntimeError::undefined_behavior(format!("array '{name}' not found"))
                })?;
                array.set_element(*row, *col, *value, step)
            }
            Event::FunctionCall { name } => {
                let frame = StackFrame::new(name.clone(), self.global_scope.clone());
                self.call_stack.push_frame(frame);
                Ok(())
            }
            Event::FunctionReturn { name: _, value } => {
                if let Some(value) = value {
                    self.call_stack.current_frame().set_return_value(*value);
                }
                self.call_stack.pop_frame().map(|_| ())
            }
            Event::LineChanged { line } => {
                self.line = *line;
                Ok(())
            }
        }
    }

    /// Drop everything but the global scope object and start over.
    pub fn reset(&mut self) {
        self.call_stack = CallStack::new(self.global_scope.clone());
        self.line = 0;
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn current_frame(&self) -> &StackFrame {
        self.call_stack.current_frame()
    }

    pub fn frames_count(&self) -> usize {
        self.call_stack.frames_count()
    }

    pub fn variable(&self, name: &str) -> Option<Rc<Variable>> {
        self.call_stack.current_frame().variable(name)
    }

    pub fn array(&self, name: &str) -> Option<Rc<Array>> {
        self.call_stack.current_frame().array(name)
    }

    pub fn array2d(&self, name: &str) -> Option<Rc<Array2D>> {
        self.call_stack.current_frame().array2d(name)
    }

    /// Structural value of the whole snapshot, for equality comparisons.
    pub fn dump(&self) -> StateDump {
        StateDump {
            line: self.line,
            frames: self
                .call_stack
                .frames()
                .iter()
                .map(|frame| FrameDump {
                    func_name: frame.func_name.clone(),
                    return_value: frame.return_value(),
                    scopes: frame
                        .scopes()
                        .iter()
                        .map(|scope| {
                            scope.declarations().iter().map(DeclDump::from).collect()
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Plain-value projection of a snapshot: frames, scopes, and every cell with
/// its step tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDump {
    pub line: u32,
    pub frames: Vec<FrameDump>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameDump {
    pub func_name: String,
    pub return_value: Option<i64>,
    pub scopes: Vec<Vec<DeclDump>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclDump {
    Variable {
        name: String,
        value: Option<i64>,
        step: usize,
    },
    Array {
        name: String,
        cells: Vec<(Option<i64>, usize)>,
    },
    Array2D {
        name: String,
        rows: Vec<Vec<(Option<i64>, usize)>>,
    },
}

impl From<&Declared> for DeclDump {
    fn from(item: &Declared) -> Self {
        match item {
            Declared::Variable(v) => {
                let cell = v.cell().borrow();
                DeclDump::Variable {
                    name: v.name.clone(),
                    value: cell.get(),
                    step: cell.step_changed(),
                }
            }
            Declared::Array(a) => DeclDump::Array {
                name: a.name.clone(),
                cells: a
                    .cells()
                    .iter()
                    .map(|c| {
                        let cell = c.borrow();
                        (cell.get(), cell.step_changed())
                    })
                    .collect(),
            },
            Declared::Array2D(a) => DeclDump::Array2D {
                name: a.name.clone(),
                rows: a
                    .row_arrays()
                    .iter()
                    .map(|row| {
                        row.cells()
                            .iter()
                            .map(|c| {
                                let cell = c.borrow();
                                (cell.get(), cell.step_changed())
                            })
                            .collect()
                    })
                    .collect(),
            },
        }
    }
}

/// Buffers emitted events into numbered steps and maintains the live
/// snapshot.
///
/// `begin_step` is idempotent; `emit` and `end_step` without an open step
/// are usage errors. `end_step` commits the buffer: it applies every
/// buffered event to the snapshot in order and records the step.
#[derive(Debug)]
pub struct EventDispatcher {
    snapshot: Snapshot,
    steps: Vec<Step>,
    current_step: Option<usize>,
    pending: Vec<Event>,
    step_in_progress: bool,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// The snapshot gets its own global scope: it is replicated state,
    /// independent of the interpreter's live runtime.
    pub fn new() -> Self {
        let global_scope = Scope::new(None);
        EventDispatcher {
            snapshot: Snapshot::new(global_scope),
            steps: Vec::new(),
            current_step: None,
            pending: Vec::new(),
            step_in_progress: false,
        }
    }

    pub fn begin_step(&mut self) {
        if self.step_in_progress {
            return;
        }
        self.pending.clear();
        self.step_in_progress = true;
    }

    pub fn emit(&mut self, event: Event) -> Result<(), RuntimeError> {
        if !self.step_in_progress {
            return Err(RuntimeError::internal(
                "no step in progress, call begin_step first",
            ));
        }
        self.pending.push(event);
        Ok(())
    }

    pub fn end_step(&mut self) -> Result<usize, RuntimeError> {
        if !self.step_in_progress {
            return Err(RuntimeError::internal("no step in progress"));
        }

        let number = self.steps.len();
        for event in &self.pending {
            self.snapshot.apply(event, number)?;
        }

        self.steps.push(Step {
            number,
            events: std::mem::take(&mut self.pending),
        });
        self.current_step = Some(number);
        self.step_in_progress = false;

        Ok(number)
    }

    /// Navigate the snapshot to `step_index`. Forward targets apply the
    /// missing steps; backward targets reset and replay from step zero.
    pub fn apply_step(&mut self, step_index: usize) -> Result<(), RuntimeError> {
        if step_index >= self.steps.len() {
            return Err(RuntimeError::internal(format!(
                "invalid step index: {step_index} (total steps: {})",
                self.steps.len()
            )));
        }

        if let Some(current) = self.current_step {
            if step_index < current {
                self.snapshot.reset();
                self.current_step = None;
            }
        }

        let start = match self.current_step {
            Some(current) => current + 1,
            None => 0,
        };
        for i in start..=step_index {
            let events = self.steps[i].events.clone();
            for event in &events {
                self.snapshot.apply(event, i)?;
            }
            self.current_step = Some(i);
        }

        Ok(())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Committed step the snapshot currently reflects; `None` before any
    /// step has been applied.
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps_count(&self) -> usize {
        self.steps.len()
    }

    /// Number the next committed step will receive. The interpreter tags
    /// live cells with this so live state and replayed state agree.
    pub fn next_step_number(&self) -> usize {
        self.steps.len()
    }

    pub fn step_in_progress(&self) -> bool {
        self.step_in_progress
    }
}
