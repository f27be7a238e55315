//! Storage cells and the declarable items built from them.
//!
//! A [`Cell`] holds an optional integer and the step that last wrote it (the
//! visualizer highlights recently changed cells). Global cells are zeroed at
//! declaration; local cells start unset and reading one is undefined
//! behavior. Cells are shared through `Rc<RefCell<_>>` so that a declaration
//! and every live reference to it observe the same storage.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::errors::RuntimeError;

pub type CellRef = Rc<RefCell<Cell>>;

/// One unit of mutable storage with a last-modified step tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    value: Option<i64>,
    step_changed: usize,
}

impl Cell {
    pub fn unset(step: usize) -> CellRef {
        Rc::new(RefCell::new(Cell {
            value: None,
            step_changed: step,
        }))
    }

    pub fn with_value(value: i64, step: usize) -> CellRef {
        Rc::new(RefCell::new(Cell {
            value: Some(value),
            step_changed: step,
        }))
    }

    pub fn get(&self) -> Option<i64> {
        self.value
    }

    pub fn set(&mut self, value: i64, step: usize) {
        self.value = Some(value);
        self.step_changed = step;
    }

    pub fn step_changed(&self) -> usize {
        self.step_changed
    }
}

/// A named scalar cell.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    cell: CellRef,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Option<i64>, step: usize, is_global: bool) -> Self {
        let cell = match value {
            Some(v) => Cell::with_value(v, step),
            None if is_global => Cell::with_value(0, step),
            None => Cell::unset(step),
        };
        Variable {
            name: name.into(),
            cell,
        }
    }

    pub fn value(&self) -> Result<i64, RuntimeError> {
        self.cell.borrow().get().ok_or_else(|| {
            RuntimeError::undefined_behavior(format!(
                "reading uninitialized variable '{}'",
                self.name
            ))
        })
    }

    pub fn assign(&self, value: i64, step: usize) {
        self.cell.borrow_mut().set(value, step);
    }

    pub fn cell(&self) -> &CellRef {
        &self.cell
    }
}

/// A fixed-size one-dimensional array of cells.
///
/// When initializer values are supplied the remaining cells are zero-filled;
/// without an initializer, local cells stay unset and global cells are
/// zeroed.
#[derive(Debug)]
pub struct Array {
    pub name: String,
    pub size: usize,
    cells: Vec<CellRef>,
}

impl Array {
    pub fn new(
        name: impl Into<String>,
        size: usize,
        values: Option<&[i64]>,
        step: usize,
        is_global: bool,
    ) -> Self {
        let cells = match values {
            Some(values) => (0..size)
                .map(|i| Cell::with_value(values.get(i).copied().unwrap_or(0), step))
                .collect(),
            None if is_global => (0..size).map(|_| Cell::with_value(0, step)).collect(),
            None => (0..size).map(|_| Cell::unset(step)).collect(),
        };
        Array {
            name: name.into(),
            size,
            cells,
        }
    }

    pub fn cell(&self, index: usize) -> Result<&CellRef, RuntimeError> {
        self.cells.get(index).ok_or_else(|| {
            RuntimeError::undefined_behavior(format!(
                "index {index} out of bounds in array '{}'",
                self.name
            ))
        })
    }

    pub fn element(&self, index: usize) -> Result<i64, RuntimeError> {
        self.cell(index)?.borrow().get().ok_or_else(|| {
            RuntimeError::undefined_behavior(format!(
                "reading uninitialized element {index} of array '{}'",
                self.name
            ))
        })
    }

    pub fn set_element(&self, index: usize, value: i64, step: usize) -> Result<(), RuntimeError> {
        self.cell(index)?.borrow_mut().set(value, step);
        Ok(())
    }

    pub fn cells(&self) -> &[CellRef] {
        &self.cells
    }
}

/// A fixed-size two-dimensional array stored as rows of [`Array`]s.
#[derive(Debug)]
pub struct Array2D {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    row_arrays: Vec<Rc<Array>>,
}

impl Array2D {
    pub fn new(
        name: impl Into<String>,
        rows: usize,
        cols: usize,
        values: Option<&[Vec<i64>]>,
        step: usize,
        is_global: bool,
    ) -> Self {
        let row_arrays = match values {
            Some(values) => (0..rows)
                .map(|i| {
                    let row_values = values.get(i).map(|v| v.as_slice()).unwrap_or(&[]);
                    Rc::new(Array::new("", cols, Some(row_values), step, is_global))
                })
                .collect(),
            None => (0..rows)
                .map(|_| Rc::new(Array::new("", cols, None, step, is_global)))
                .collect(),
        };
        Array2D {
            name: name.into(),
            rows,
            cols,
            row_arrays,
        }
    }

    pub fn row(&self, index: usize) -> Result<&Rc<Array>, RuntimeError> {
        self.row_arrays.get(index).ok_or_else(|| {
            RuntimeError::undefined_behavior(format!(
                "row index {index} out of bounds in array '{}'",
                self.name
            ))
        })
    }

    pub fn element(&self, row: usize, col: usize) -> Result<i64, RuntimeError> {
        let cell = self.bounds_checked_cell(row, col)?;
        cell.borrow().get().ok_or_else(|| {
            RuntimeError::undefined_behavior(format!(
                "reading uninitialized element ({row}, {col}) of array '{}'",
                self.name
            ))
        })
    }

    pub fn set_element(
        &self,
        row: usize,
        col: usize,
        value: i64,
        step: usize,
    ) -> Result<(), RuntimeError> {
        self.bounds_checked_cell(row, col)?
            .borrow_mut()
            .set(value, step);
        Ok(())
    }

    fn bounds_checked_cell(&self, row: usize, col: usize) -> Result<&CellRef, RuntimeError> {
        if row >= self.rows || col >= self.cols {
            return Err(RuntimeError::undefined_behavior(format!(
                "index ({row}, {col}) out of bounds in array '{}'",
                self.name
            )));
        }
        self.row(row)?.cell(col)
    }

    pub fn row_arrays(&self) -> &[Rc<Array>] {
        &self.row_arrays
    }
}

/// Anything a scope can hold.
#[derive(Debug, Clone)]
pub enum Declared {
    Variable(Rc<Variable>),
    Array(Rc<Array>),
    Array2D(Rc<Array2D>),
}

impl Declared {
    pub fn name(&self) -> &str {
        match self {
            Declared::Variable(v) => &v.name,
            Declared::Array(a) => &a.name,
            Declared::Array2D(a) => &a.name,
        }
    }
}
