// Dispatcher and snapshot tests: step discipline, reconstruction, replay

use cstep::events::Event;
use cstep::pipeline::run_source;
use cstep::snapshot::{DeclDump, EventDispatcher, StateDump};

#[test]
fn emit_without_a_step_is_an_error() {
    let mut dispatcher = EventDispatcher::new();
    let err = dispatcher.emit(Event::LineChanged { line: 1 }).unwrap_err();
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn end_without_a_step_is_an_error() {
    let mut dispatcher = EventDispatcher::new();
    let err = dispatcher.end_step().unwrap_err();
    assert_eq!(err.code(), "UnexpectedInternalError");
}

#[test]
fn begin_step_is_idempotent() {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.begin_step();
    dispatcher.begin_step();
    dispatcher.emit(Event::LineChanged { line: 3 }).unwrap();
    assert_eq!(dispatcher.end_step().unwrap(), 0);
    assert_eq!(dispatcher.steps_count(), 1);
    assert_eq!(dispatcher.snapshot().line(), 3);
}

#[test]
fn initial_state() {
    let dispatcher = EventDispatcher::new();
    assert_eq!(dispatcher.current_step(), None);
    assert_eq!(dispatcher.steps_count(), 0);
    assert_eq!(dispatcher.snapshot().line(), 0);
    assert_eq!(dispatcher.snapshot().frames_count(), 1);
}

#[test]
fn declarations_and_writes_reconstruct() {
    let mut dispatcher = EventDispatcher::new();

    dispatcher.begin_step();
    dispatcher
        .emit(Event::DeclareVar {
            name: "x".to_string(),
            value: None,
            is_global: false,
        })
        .unwrap();
    dispatcher.emit(Event::LineChanged { line: 10 }).unwrap();
    dispatcher.end_step().unwrap();

    let snapshot = dispatcher.snapshot();
    assert_eq!(snapshot.line(), 10);
    let x = snapshot.variable("x").expect("x not declared");
    assert!(x.value().is_err());

    dispatcher.begin_step();
    dispatcher
        .emit(Event::VarChanged {
            name: "x".to_string(),
            value: 42,
        })
        .unwrap();
    dispatcher.end_step().unwrap();

    let x = dispatcher.snapshot().variable("x").expect("x not declared");
    assert_eq!(x.value().unwrap(), 42);
    assert_eq!(x.cell().borrow().step_changed(), 1);
}

#[test]
fn array_events_reconstruct() {
    let mut dispatcher = EventDispatcher::new();

    dispatcher.begin_step();
    dispatcher
        .emit(Event::DeclareArray {
            name: "a".to_string(),
            size: 3,
            values: Some(vec![7, 8, 9]),
            is_global: false,
        })
        .unwrap();
    dispatcher
        .emit(Event::DeclareArray2D {
            name: "m".to_string(),
            rows: 2,
            cols: 2,
            values: None,
            is_global: true,
        })
        .unwrap();
    dispatcher.end_step().unwrap();

    dispatcher.begin_step();
    dispatcher
        .emit(Event::ArrayElementChanged {
            name: "a".to_string(),
            index: 1,
            value: 80,
        })
        .unwrap();
    dispatcher
        .emit(Event::Array2DElementChanged {
            name: "m".to_string(),
            row: 1,
            col: 0,
            value: 5,
        })
        .unwrap();
    dispatcher.end_step().unwrap();

    let snapshot = dispatcher.snapshot();
    let a = snapshot.array("a").expect("a not declared");
    assert_eq!(a.element(1).unwrap(), 80);
    let m = snapshot.array2d("m").expect("m not declared");
    assert_eq!(m.element(1, 0).unwrap(), 5);
    assert_eq!(m.element(0, 0).unwrap(), 0);
}

#[test]
fn function_call_and_return_manage_frames() {
    let mut dispatcher = EventDispatcher::new();

    dispatcher.begin_step();
    dispatcher
        .emit(Event::FunctionCall {
            name: "f".to_string(),
        })
        .unwrap();
    dispatcher.emit(Event::EnterScope).unwrap();
    dispatcher
        .emit(Event::DeclareVar {
            name: "n".to_string(),
            value: Some(4),
            is_global: false,
        })
        .unwrap();
    dispatcher.end_step().unwrap();

    assert_eq!(dispatcher.snapshot().frames_count(), 2);
    assert_eq!(
        dispatcher
            .snapshot()
            .variable("n")
            .unwrap()
            .value()
            .unwrap(),
        4
    );

    dispatcher.begin_step();
    dispatcher
        .emit(Event::FunctionReturn {
            name: "f".to_string(),
            value: Some(24),
        })
        .unwrap();
    dispatcher.end_step().unwrap();

    assert_eq!(dispatcher.snapshot().frames_count(), 1);
    assert!(dispatcher.snapshot().variable("n").is_none());
}

#[test]
fn exiting_the_global_scope_fails() {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.begin_step();
    dispatcher.emit(Event::ExitScope).unwrap();
    let err = dispatcher.end_step().unwrap_err();
    assert_eq!(err.code(), "UnexpectedInternalError");
}

const REPLAY_PROGRAM: &str = r#"
    int total = 0;
    int scale(int n) { return n * 2; }
    int main() {
        int a[3] = {3, 1, 2};
        for (int i = 0; i < 3; i++) {
            total += scale(a[i]);
        }
        int m[2][2] = {{1, 2}, {3, 4}};
        m[1][1] = total;
        return total + m[1][1];
    }
"#;

#[test]
fn replay_reaches_the_live_state() {
    let execution = run_source(REPLAY_PROGRAM).expect("pipeline failed");
    assert_eq!(execution.result, Some(24));

    let mut dispatcher = execution.dispatcher;
    let total_steps = dispatcher.steps_count();
    assert!(total_steps > 0);
    assert_eq!(dispatcher.current_step(), Some(total_steps - 1));

    let live = dispatcher.snapshot().dump();

    // rewind to the start, then replay to the end again
    dispatcher.apply_step(0).unwrap();
    dispatcher.apply_step(total_steps - 1).unwrap();
    assert_eq!(dispatcher.snapshot().dump(), live);
}

#[test]
fn every_rewind_matches_the_forward_pass() {
    let execution = run_source(REPLAY_PROGRAM).expect("pipeline failed");
    let mut dispatcher = execution.dispatcher;
    let total_steps = dispatcher.steps_count();

    let mut forward: Vec<StateDump> = Vec::with_capacity(total_steps);
    dispatcher.apply_step(0).unwrap();
    forward.push(dispatcher.snapshot().dump());
    for k in 1..total_steps {
        dispatcher.apply_step(k).unwrap();
        forward.push(dispatcher.snapshot().dump());
    }

    for k in [0, total_steps / 3, total_steps / 2, total_steps - 1] {
        dispatcher.apply_step(k).unwrap();
        assert_eq!(dispatcher.snapshot().dump(), forward[k], "step {k}");
    }
}

#[test]
fn step_tags_never_exceed_the_step_counter() {
    let execution = run_source(REPLAY_PROGRAM).expect("pipeline failed");
    let dispatcher = execution.dispatcher;
    let total_steps = dispatcher.steps_count();

    let dump = dispatcher.snapshot().dump();
    for frame in &dump.frames {
        for scope in &frame.scopes {
            for decl in scope {
                match decl {
                    DeclDump::Variable { step, .. } => assert!(*step < total_steps),
                    DeclDump::Array { cells, .. } => {
                        for (_, step) in cells {
                            assert!(*step < total_steps);
                        }
                    }
                    DeclDump::Array2D { rows, .. } => {
                        for row in rows {
                            for (_, step) in row {
                                assert!(*step < total_steps);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn steps_are_numbered_consecutively() {
    let execution = run_source(REPLAY_PROGRAM).expect("pipeline failed");
    for (i, step) in execution.dispatcher.steps().iter().enumerate() {
        assert_eq!(step.number, i);
        assert!(!step.events.is_empty());
    }
}

#[test]
fn invalid_step_index_is_rejected() {
    let mut dispatcher = EventDispatcher::new();
    assert!(dispatcher.apply_step(0).is_err());
}

#[test]
fn events_serialize_with_type_discriminators() {
    let event = Event::DeclareVar {
        name: "x".to_string(),
        value: Some(3),
        is_global: true,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "DeclareVar");
    assert_eq!(json["isGlobal"], true);

    let event = Event::VarChanged {
        name: "x".to_string(),
        value: 4,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "VarChanged");
}
