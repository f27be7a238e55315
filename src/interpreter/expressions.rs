// Expression evaluation: rvalues are integers, lvalues are places

use std::rc::Rc;

use crate::ast::{Expr, Location};
use crate::events::Event;
use crate::interpreter::engine::Interpreter;
use crate::runtime::cells::{Array, Array2D, Declared, Variable};
use crate::runtime::errors::RuntimeError;

/// A resolved lvalue. Places carry the declared name and indices so that
/// every write can be described by an exact event.
pub(crate) enum Place {
    Var(Rc<Variable>),
    Elem {
        array: Rc<Array>,
        index: usize,
    },
    Elem2D {
        array: Rc<Array2D>,
        row: usize,
        col: usize,
    },
    /// One row of a 2-D array, the intermediate of `m[i][j]`.
    Row {
        array: Rc<Array2D>,
        row: usize,
    },
    WholeArray(Rc<Array>),
    WholeArray2D(Rc<Array2D>),
}

/// Evaluated array initializer: all scalars, or all nested rows.
pub(crate) enum InitValue {
    Scalars(Vec<i64>),
    Rows(Vec<Vec<i64>>),
}

impl Interpreter {
    /// Evaluate as an rvalue. `None` is the result of calling a function
    /// that produced no value.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Option<i64>, RuntimeError> {
        match expr {
            Expr::IntLiteral { value, .. } => Ok(Some(*value)),
            Expr::Variable { .. } | Expr::ArrayAccess { .. } => {
                let place = self.eval_place(expr)?;
                self.read_place(&place, expr.loc()).map(Some)
            }
            Expr::Binary {
                left,
                operator,
                right,
                loc,
            } => self.eval_binary(left, operator, right, loc).map(Some),
            Expr::Unary {
                operator,
                operand,
                postfix,
                loc,
            } => self.eval_unary(operator, operand, *postfix, loc).map(Some),
            Expr::Assignment {
                left,
                operator,
                right,
                loc,
            } => self.eval_assignment(left, operator, right, loc).map(Some),
            Expr::Call {
                function,
                args,
                loc,
            } => self.call_function(function, args, *loc),
            Expr::ArrayInit { loc, .. } => Err(RuntimeError::internal(
                "array initializer outside a declaration",
            )
            .with_location(*loc)),
        }
    }

    /// Evaluate as an rvalue that must be an integer. Using a no-value call
    /// result in an expression context is a types mismatch.
    pub(crate) fn eval_int(&mut self, expr: &Expr) -> Result<i64, RuntimeError> {
        match self.eval_expr(expr)? {
            Some(value) => Ok(value),
            None => Err(
                RuntimeError::internal("types mismatch: expression produced no value")
                    .with_location(*expr.loc()),
            ),
        }
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        operator: &str,
        right: &Expr,
        loc: &Location,
    ) -> Result<i64, RuntimeError> {
        let lhs = self.eval_int(left)?;

        // short-circuit: the right operand must not run when the left one
        // already decides the result
        match operator {
            "&&" if lhs == 0 => return Ok(0),
            "||" if lhs != 0 => return Ok(1),
            _ => {}
        }

        let rhs = self.eval_int(right)?;
        let value = match operator {
            "+" => lhs.wrapping_add(rhs),
            "-" => lhs.wrapping_sub(rhs),
            "*" => lhs.wrapping_mul(rhs),
            "/" => {
                if rhs == 0 {
                    return Err(RuntimeError::runtime("division by zero").with_location(*loc));
                }
                lhs.wrapping_div(rhs)
            }
            "%" => {
                if rhs == 0 {
                    return Err(RuntimeError::runtime("modulo by zero").with_location(*loc));
                }
                lhs.wrapping_rem(rhs)
            }
            "==" => (lhs == rhs) as i64,
            "!=" => (lhs != rhs) as i64,
            "<" => (lhs < rhs) as i64,
            "<=" => (lhs <= rhs) as i64,
            ">" => (lhs > rhs) as i64,
            ">=" => (lhs >= rhs) as i64,
            "&&" => (lhs != 0 && rhs != 0) as i64,
            "||" => (lhs != 0 || rhs != 0) as i64,
            other => {
                return Err(
                    RuntimeError::internal(format!("unknown binary operator: {other}"))
                        .with_location(*loc),
                );
            }
        };

        Ok(value)
    }

    fn eval_unary(
        &mut self,
        operator: &str,
        operand: &Expr,
        postfix: bool,
        loc: &Location,
    ) -> Result<i64, RuntimeError> {
        match operator {
            "!" | "-" | "+" => {
                let value = self.eval_int(operand)?;
                Ok(match operator {
                    "!" => (value == 0) as i64,
                    "-" => value.wrapping_neg(),
                    _ => value,
                })
            }
            "++" | "--" => {
                let place = self.eval_place(operand)?;
                let old = self.read_place(&place, operand.loc())?;
                let new = if operator == "++" {
                    old.wrapping_add(1)
                } else {
                    old.wrapping_sub(1)
                };
                self.write_place(&place, new)?;
                Ok(if postfix { old } else { new })
            }
            other => Err(RuntimeError::internal(format!(
                "unsupported unary operator at runtime: {other}"
            ))
            .with_location(*loc)),
        }
    }

    /// Assignments evaluate to the written value, so they compose in larger
    /// expressions the way C defines.
    fn eval_assignment(
        &mut self,
        left: &Expr,
        operator: &str,
        right: &Expr,
        loc: &Location,
    ) -> Result<i64, RuntimeError> {
        let place = self.eval_place(left)?;
        let rhs = self.eval_int(right)?;

        let value = match operator {
            "=" => rhs,
            "+=" => self.read_place(&place, left.loc())?.wrapping_add(rhs),
            "-=" => self.read_place(&place, left.loc())?.wrapping_sub(rhs),
            "*=" => self.read_place(&place, left.loc())?.wrapping_mul(rhs),
            "/=" => {
                if rhs == 0 {
                    return Err(RuntimeError::runtime("division by zero").with_location(*loc));
                }
                self.read_place(&place, left.loc())?.wrapping_div(rhs)
            }
            "%=" => {
                if rhs == 0 {
                    return Err(RuntimeError::runtime("modulo by zero").with_location(*loc));
                }
                self.read_place(&place, left.loc())?.wrapping_rem(rhs)
            }
            other => {
                return Err(RuntimeError::internal(format!(
                    "unknown assignment operator: {other}"
                ))
                .with_location(*loc));
            }
        };

        self.write_place(&place, value)?;
        Ok(value)
    }

    /// Resolve an expression to a place. Name lookup walks the current
    /// frame's scope chain only; the chain ends at the shared global scope,
    /// so a callee never sees the caller's locals.
    pub(crate) fn eval_place(&mut self, expr: &Expr) -> Result<Place, RuntimeError> {
        match expr {
            Expr::Variable { name, loc } => {
                match self.call_stack.current_frame().lookup(name) {
                    Some(Declared::Variable(v)) => Ok(Place::Var(v)),
                    Some(Declared::Array(a)) => Ok(Place::WholeArray(a)),
                    Some(Declared::Array2D(a)) => Ok(Place::WholeArray2D(a)),
                    None => Err(
                        RuntimeError::internal(format!("no variable named '{name}'"))
                            .with_location(*loc),
                    ),
                }
            }
            Expr::ArrayAccess { array, index, loc } => {
                let base = self.eval_place(array)?;
                let raw_index = self.eval_int(index)?;
                match base {
                    Place::WholeArray(array) => {
                        let index = check_index(raw_index, array.size, &array.name, loc)?;
                        Ok(Place::Elem { array, index })
                    }
                    Place::WholeArray2D(array) => {
                        let row = check_index(raw_index, array.rows, &array.name, loc)?;
                        Ok(Place::Row { array, row })
                    }
                    Place::Row { array, row } => {
                        let col = check_index(raw_index, array.cols, &array.name, loc)?;
                        Ok(Place::Elem2D { array, row, col })
                    }
                    _ => Err(RuntimeError::internal(
                        "subscripted expression is not an array",
                    )
                    .with_location(*loc)),
                }
            }
            other => Err(RuntimeError::internal(format!(
                "expression is not an lvalue: {}",
                other.kind_name()
            ))
            .with_location(*other.loc())),
        }
    }

    pub(crate) fn read_place(
        &self,
        place: &Place,
        loc: &Location,
    ) -> Result<i64, RuntimeError> {
        let result = match place {
            Place::Var(v) => v.value(),
            Place::Elem { array, index } => array.element(*index),
            Place::Elem2D { array, row, col } => array.element(*row, *col),
            Place::Row { .. } | Place::WholeArray(_) | Place::WholeArray2D(_) => {
                Err(RuntimeError::internal("array used as a value"))
            }
        };
        result.map_err(|err| err.with_location(*loc))
    }

    /// Write a value through a place and emit the matching change event.
    pub(crate) fn write_place(&mut self, place: &Place, value: i64) -> Result<(), RuntimeError> {
        let step = self.current_step();
        match place {
            Place::Var(v) => {
                v.assign(value, step);
                self.emit(Event::VarChanged {
                    name: v.name.clone(),
                    value,
                })?;
            }
            Place::Elem { array, index } => {
                array.set_element(*index, value, step)?;
                self.emit(Event::ArrayElementChanged {
                    name: array.name.clone(),
                    index: *index,
                    value,
                })?;
            }
            Place::Elem2D { array, row, col } => {
                array.set_element(*row, *col, value, step)?;
                self.emit(Event::Array2DElementChanged {
                    name: array.name.clone(),
                    row: *row,
                    col: *col,
                    value,
                })?;
            }
            Place::Row { .. } | Place::WholeArray(_) | Place::WholeArray2D(_) => {
                return Err(RuntimeError::internal("cannot assign to an array"));
            }
        }
        Ok(())
    }

    /// Evaluate a braced initializer list: all elements scalar, or all
    /// nested lists of scalars. Mixed shapes are rejected.
    pub(crate) fn eval_array_initializer(
        &mut self,
        expr: &Expr,
    ) -> Result<InitValue, RuntimeError> {
        let Expr::ArrayInit { elements, loc } = expr else {
            return Err(
                RuntimeError::internal("array initializer expected").with_location(*expr.loc()),
            );
        };

        let nested = matches!(elements.first(), Some(Expr::ArrayInit { .. }));
        if nested {
            let mut rows = Vec::with_capacity(elements.len());
            for element in elements {
                let Expr::ArrayInit { .. } = element else {
                    return Err(RuntimeError::internal(
                        "initializer mixes scalars and nested lists",
                    )
                    .with_location(*loc));
                };
                match self.eval_array_initializer(element)? {
                    InitValue::Scalars(row) => rows.push(row),
                    InitValue::Rows(_) => {
                        return Err(RuntimeError::internal(
                            "initializer nesting is limited to two dimensions",
                        )
                        .with_location(*loc));
                    }
                }
            }
            return Ok(InitValue::Rows(rows));
        }

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if matches!(element, Expr::ArrayInit { .. }) {
                return Err(RuntimeError::internal(
                    "initializer mixes scalars and nested lists",
                )
                .with_location(*loc));
            }
            values.push(self.eval_int(element)?);
        }
        Ok(InitValue::Scalars(values))
    }
}

fn check_index(
    index: i64,
    len: usize,
    name: &str,
    loc: &Location,
) -> Result<usize, RuntimeError> {
    if index < 0 || index as usize >= len {
        return Err(RuntimeError::undefined_behavior(format!(
            "index {index} out of bounds in array '{name}'"
        ))
        .with_location(*loc));
    }
    Ok(index as usize)
}
