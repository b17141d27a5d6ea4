use super::*;
use crate::error::Sentinel;
use crate::event::{Entity, Method};

fn labels(frames: &[Frame]) -> Vec<String> {
    frames.iter().map(|f| f.label().into_owned()).collect()
}

fn proxy_event() -> Event {
    Event::new(Entity::Connection, Method::ExecContext, false)
}

#[test]
fn test_scopes_push_and_pop() {
    assert!(Stack::capture().frames().is_empty());
    {
        let _outer = scope("outer");
        {
            let _inner = scope("inner");
            assert_eq!(labels(Stack::capture().frames()), vec!["inner", "outer"]);
        }
        assert_eq!(labels(Stack::capture().frames()), vec!["outer"]);
    }
    assert!(Stack::capture().frames().is_empty());
}

#[test]
fn test_leaked_inner_scope_is_discarded_by_outer() {
    {
        let _outer = scope("outer");
        std::mem::forget(scope("leaked"));
    }
    assert!(Stack::capture().frames().is_empty());
}

#[test]
fn test_external_without_internal_frames_keeps_everything() {
    let _a = scope("a");
    let _b = scope("b");
    let stack = Stack::capture();
    assert_eq!(labels(stack.external()), vec!["b", "a"]);
}

#[test]
fn test_external_starts_after_internal_frames() {
    let _test = scope("app::test");
    let _front = library_scope("frontend::exec");
    let _proxy = proxy_scope(proxy_event());
    let _hook = scope("app::error_hook");

    let stack = Stack::capture();
    assert_eq!(
        labels(stack.frames()),
        vec![
            "app::error_hook",
            "sqlproxy::connection.ExecContext",
            "frontend::exec",
            "app::test"
        ]
    );
    assert_eq!(labels(stack.external()), vec!["app::test"]);
}

#[test]
fn test_external_keeps_outer_caller_frames() {
    let _main = scope("app::main");
    let _handler = scope("app::handler");
    let _proxy = proxy_scope(proxy_event());

    let stack = Stack::capture();
    assert_eq!(labels(stack.external()), vec!["app::handler", "app::main"]);
}

#[test]
fn test_external_only_internal_frames() {
    let _proxy = proxy_scope(proxy_event());
    let _orm = library_scope("orm::execute");
    let stack = Stack::capture();
    assert_eq!(stack.frames().len(), 2);
    assert!(stack.external().is_empty());
}


#[test]
fn test_capture_depth_limit() {
    let _a = scope("a");
    let _b = scope("b");
    let _c = scope("c");
    let stack = Stack::capture_with_depth(2);
    assert_eq!(labels(stack.frames()), vec!["c", "b"]);
}

#[test]
fn test_enrich_formats_message_then_frames() {
    let _test = scope("app::test");
    let err = {
        let _proxy = proxy_scope(proxy_event());
        add_stacktrace(DriverError::other("near \"THIS\": syntax error"))
    };

    assert_eq!(err.to_string(), "near \"THIS\": syntax error");
    let full = format!("{err:#}");
    assert!(
        full.starts_with("near \"THIS\": syntax error\napp::test\n\t"),
        "got {full:?}"
    );
    assert!(full.contains(file!()));
    assert_eq!(err.stack().unwrap().frames().len(), 1);
    assert!(err.stack().unwrap().inner().to_string().starts_with("near"));
}

#[test]
fn test_enrich_leaves_sentinels_and_stacked_errors_alone() {
    let err = add_stacktrace(Sentinel::EndOfStream.into());
    assert!(err.is_end_of_stream());

    let once = add_stacktrace(DriverError::other("boom"));
    let twice = add_stacktrace(once);
    match twice {
        DriverError::Stack(w) => assert!(matches!(w.into_inner(), DriverError::Other(_))),
        other => panic!("expected stack error, got {other:?}"),
    }
}

#[test]
fn test_enricher_hooks() {
    let _test = scope("app::test");
    let hooks = Enricher::new().with_max_depth(4).into_hooks();
    let _proxy = proxy_scope(proxy_event());
    let err = hooks
        .route_error(&proxy_event(), DriverError::other("boom"))
        .unwrap();
    let frames = err.stack().unwrap().frames();
    assert_eq!(labels(frames), vec!["app::test"]);
}
