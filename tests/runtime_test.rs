// Runtime model tests: cells, scopes, frames, and the call stack

use std::rc::Rc;

use cstep::runtime::{Array, Array2D, CallStack, Declared, Scope, StackFrame, Variable};

#[test]
fn global_variables_are_zero_initialized() {
    let global = Variable::new("g", None, 0, true);
    assert_eq!(global.value().unwrap(), 0);
}

#[test]
fn reading_an_unset_local_is_undefined_behavior() {
    let local = Variable::new("x", None, 0, false);
    let err = local.value().unwrap_err();
    assert_eq!(err.code(), "UndefinedBehavior");
}

#[test]
fn writes_update_value_and_step_tag() {
    let local = Variable::new("x", None, 0, false);
    local.assign(41, 3);
    assert_eq!(local.value().unwrap(), 41);
    assert_eq!(local.cell().borrow().step_changed(), 3);

    local.assign(42, 7);
    assert_eq!(local.cell().borrow().step_changed(), 7);
}

#[test]
fn scope_lookup_walks_the_parent_chain() {
    let global = Scope::new(None);
    global.declare(Declared::Variable(Rc::new(Variable::new(
        "g",
        Some(1),
        0,
        true,
    ))));

    let mut frame = StackFrame::new("f", global);
    frame.enter_scope();
    frame.declare(Declared::Variable(Rc::new(Variable::new(
        "x",
        Some(2),
        0,
        false,
    ))));

    assert_eq!(frame.variable("x").unwrap().value().unwrap(), 2);
    assert_eq!(frame.variable("g").unwrap().value().unwrap(), 1);
    assert!(frame.variable("missing").is_none());
}

#[test]
fn inner_scopes_shadow_and_unshadow() {
    let global = Scope::new(None);
    let mut frame = StackFrame::new("f", global);
    frame.enter_scope();
    frame.declare(Declared::Variable(Rc::new(Variable::new(
        "x",
        Some(1),
        0,
        false,
    ))));

    frame.enter_scope();
    frame.declare(Declared::Variable(Rc::new(Variable::new(
        "x",
        Some(2),
        0,
        false,
    ))));
    assert_eq!(frame.variable("x").unwrap().value().unwrap(), 2);

    frame.exit_scope().unwrap();
    assert_eq!(frame.variable("x").unwrap().value().unwrap(), 1);
}

#[test]
fn redeclaration_replaces_in_place() {
    let scope = Scope::new(None);
    scope.declare(Declared::Variable(Rc::new(Variable::new(
        "x",
        Some(1),
        0,
        false,
    ))));
    scope.declare(Declared::Variable(Rc::new(Variable::new(
        "x",
        Some(2),
        1,
        false,
    ))));

    assert_eq!(scope.declarations().len(), 1);
    match scope.get("x").unwrap() {
        Declared::Variable(v) => assert_eq!(v.value().unwrap(), 2),
        _ => panic!("expected a variable"),
    }
}

#[test]
fn a_frame_cannot_exit_its_root_scope() {
    let global = Scope::new(None);
    let mut frame = StackFrame::new("f", global);
    let err = frame.exit_scope().unwrap_err();
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn the_global_frame_cannot_be_popped() {
    let global = Scope::new(None);
    let mut stack = CallStack::new(global);
    assert_eq!(stack.frames_count(), 1);
    let err = stack.pop_frame().unwrap_err();
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn frames_share_the_global_scope() {
    let global = Scope::new(None);
    global.declare(Declared::Variable(Rc::new(Variable::new(
        "g",
        Some(9),
        0,
        true,
    ))));

    let mut stack = CallStack::new(global.clone());
    stack.push_frame(StackFrame::new("f", global));

    assert_eq!(
        stack
            .current_frame()
            .variable("g")
            .unwrap()
            .value()
            .unwrap(),
        9
    );
    stack.pop_frame().unwrap();
    assert_eq!(stack.frames_count(), 1);
}

#[test]
fn array_partial_initializer_zero_fills() {
    let array = Array::new("a", 5, Some(&[1, 2]), 0, false);
    assert_eq!(array.element(0).unwrap(), 1);
    assert_eq!(array.element(1).unwrap(), 2);
    assert_eq!(array.element(4).unwrap(), 0);
}

#[test]
fn array_bounds_are_checked() {
    let array = Array::new("a", 3, Some(&[1, 2, 3]), 0, false);
    let err = array.element(3).unwrap_err();
    assert_eq!(err.code(), "UndefinedBehavior");
    let err = array.set_element(3, 0, 0).unwrap_err();
    assert_eq!(err.code(), "UndefinedBehavior");
}

#[test]
fn uninitialized_array_cells() {
    let local = Array::new("a", 3, None, 0, false);
    assert_eq!(local.element(0).unwrap_err().code(), "UndefinedBehavior");

    let global = Array::new("g", 3, None, 0, true);
    assert_eq!(global.element(0).unwrap(), 0);
}

#[test]
fn array2d_shape_and_bounds() {
    let rows = [vec![1, 2, 3], vec![4, 5, 6]];
    let matrix = Array2D::new("m", 2, 3, Some(&rows), 0, false);

    assert_eq!(matrix.element(0, 0).unwrap(), 1);
    assert_eq!(matrix.element(1, 2).unwrap(), 6);

    assert_eq!(matrix.element(2, 0).unwrap_err().code(), "UndefinedBehavior");
    assert_eq!(matrix.element(0, 3).unwrap_err().code(), "UndefinedBehavior");

    matrix.set_element(1, 1, 50, 4).unwrap();
    assert_eq!(matrix.element(1, 1).unwrap(), 50);
}

#[test]
fn frame_return_value_slot() {
    let global = Scope::new(None);
    let frame = StackFrame::new("f", global);
    assert_eq!(frame.return_value(), None);
    frame.set_return_value(12);
    assert_eq!(frame.return_value(), Some(12));
}
