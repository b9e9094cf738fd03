use super::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl Fn(&Value) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |data: &Value| log.lock().unwrap().push(format!("{tag}:{data}"))
}

#[test]
fn dispatch_runs_listeners_in_registration_order() {
    let hub = EventHub::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    hub.on(SocketEvent::TestResult, recorder(&log, "a"));
    hub.on(SocketEvent::TestResult, recorder(&log, "b"));

    let ran = hub.dispatch(SocketEvent::TestResult, &json!({"id": 1}));

    assert_eq!(ran, 2);
    assert_eq!(*log.lock().unwrap(), vec![r#"a:{"id":1}"#, r#"b:{"id":1}"#]);
}

#[test]
fn dispatch_without_listeners_is_noop() {
    let hub = EventHub::new();
    assert_eq!(hub.dispatch(SocketEvent::TaskStatus, &json!("RUNNING")), 0);
}

#[test]
fn events_are_isolated() {
    let hub = EventHub::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    hub.on(SocketEvent::TaskStatus, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    hub.dispatch(SocketEvent::TestResult, &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    hub.dispatch(SocketEvent::TaskStatus, &json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn off_removes_only_that_listener() {
    let hub = EventHub::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = hub.on(SocketEvent::TestResult, recorder(&log, "a"));
    hub.on(SocketEvent::TestResult, recorder(&log, "b"));

    assert!(hub.off(SocketEvent::TestResult, first));
    hub.dispatch(SocketEvent::TestResult, &json!(7));

    assert_eq!(*log.lock().unwrap(), vec!["b:7"]);
    assert_eq!(hub.listener_count(SocketEvent::TestResult), 1);
}

#[test]
fn off_with_unknown_id_or_wrong_event_returns_false() {
    let hub = EventHub::new();
    let id = hub.on(SocketEvent::TestResult, |_| {});

    assert!(!hub.off(SocketEvent::TaskStatus, id));
    assert!(hub.off(SocketEvent::TestResult, id));
    assert!(!hub.off(SocketEvent::TestResult, id));
    assert_eq!(hub.listener_count(SocketEvent::TestResult), 0);
}

#[test]
fn same_closure_registered_twice_gets_distinct_ids() {
    let hub = EventHub::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let listener = {
        let hits = Arc::clone(&hits);
        move |_: &Value| {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    };
    let a = hub.on(SocketEvent::TestResult, listener.clone());
    let b = hub.on(SocketEvent::TestResult, listener);
    assert_ne!(a, b);

    hub.off(SocketEvent::TestResult, a);
    hub.dispatch(SocketEvent::TestResult, &Value::Null);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_can_remove_itself_during_dispatch() {
    let hub = EventHub::new();
    let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
    let hits = Arc::new(AtomicUsize::new(0));
    let id = {
        let hub_inner = hub.clone();
        let slot = Arc::clone(&slot);
        let hits = Arc::clone(&hits);
        hub.on(SocketEvent::TaskStatus, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock().unwrap() {
                hub_inner.off(SocketEvent::TaskStatus, id);
            }
        })
    };
    *slot.lock().unwrap() = Some(id);

    assert_eq!(hub.dispatch(SocketEvent::TaskStatus, &json!({})), 1);
    assert_eq!(hub.dispatch(SocketEvent::TaskStatus, &json!({})), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn clones_share_registry() {
    let hub = EventHub::new();
    let other = hub.clone();
    other.on(SocketEvent::TestResult, |_| {});
    assert_eq!(hub.listener_count(SocketEvent::TestResult), 1);
}
