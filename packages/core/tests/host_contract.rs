//! End-to-end tests of the by-name call surface.
//!
//! Each test builds a fresh [`Host`] and drives it only through
//! [`Host::call`], the way the WebPPL interpreter does, so that every
//! observable contract is checked at the boundary the model actually uses.
//!
//! # Coverage
//!
//! | Test | Contract |
//! |------|----------|
//! | `agent_ids_are_consecutive_in_call_order` | identity allocation |
//! | `tagging_boxes_strings_and_mutates_objects` | `addAgentId` asymmetry |
//! | `stored_objects_come_back_by_identity` | `store` / `get` |
//! | `primitives_come_back_by_value` | `store` / `get` |
//! | `missing_type_and_name_have_distinct_messages` | not-found errors |
//! | `get_all_lists_exactly_the_stored_entries` | `getAll` |
//! | `get_all_result_stays_live` | `getAll` returns the bucket itself |
//! | `agent_ids_stop_at_the_exact_number_limit` | identity allocation bounds |
//! | `ascii_table_pads_every_column` | `renderAsciiTable` |
//! | `named_function_shows_only_its_name` | `nameFunction` |
//! | `named_function_field_reaches_the_callable` | `nameFunction` `fn` field |
//! | `fixed_arity_thunk_calls_through_each_time` | `applyFixedArity` |
//! | `fixed_arity_rejects_zero_and_four_args` | `applyFixedArity` errors |
//! | `agent_display_equals_serialization` | `mkAgent` |
//! | `rsa_model_walkthrough` | all of the above together |

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use serde_json::json;
use webppl_rsa::host::codes;
use webppl_rsa::{
    Host, HostConfig, HostFunction, Props, Value, AGENT_ID_PROP, IS_AGENT_FIELD, MAX_AGENT_ID,
    NAMED_FN_PROP,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

static TRACING: Once = Once::new();

/// Route library events to the test harness; `RUST_LOG=webppl_rsa=trace`
/// shows them for a failing test.
fn host() -> Host {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "webppl_rsa=warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
    Host::new(HostConfig::default())
}

fn s(v: &str) -> Value {
    Value::from(v)
}

fn n(v: f64) -> Value {
    Value::Number(v)
}

fn array(items: Vec<Value>) -> Value {
    Value::array(items)
}

/// A function value that records every argument list it is called with.
fn recording_fn() -> (Value, Rc<RefCell<Vec<Vec<Value>>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&calls);
    let f = Value::function(HostFunction::new(move |args: &[Value]| {
        log.borrow_mut().push(args.to_vec());
        Ok(Value::Number(args.len() as f64))
    }));
    (f, calls)
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn agent_ids_are_consecutive_in_call_order() {
    let mut h = host();
    let before = h.agents().current() as f64;
    let ids: Vec<Value> = (0..4)
        .map(|_| h.call("getNewAgentId", &[]).unwrap())
        .collect();
    let expected: Vec<Value> = (1..=4).map(|i| n(before + i as f64)).collect();
    assert_eq!(ids, expected);
}

#[test]
fn agent_ids_stop_at_the_exact_number_limit() {
    let mut h = Host::new(HostConfig {
        agent_id_offset: MAX_AGENT_ID - 2,
        ..HostConfig::default()
    });
    let mut ids = Vec::new();
    let mut failures = Vec::new();
    for _ in 0..4 {
        match h.call("getNewAgentId", &[]) {
            Ok(id) => ids.push(id),
            Err(e) => failures.push(e.code()),
        }
    }
    assert_eq!(
        ids,
        vec![n((MAX_AGENT_ID - 1) as f64), n(MAX_AGENT_ID as f64)]
    );
    assert_eq!(
        failures,
        vec![codes::AGENT_IDS_EXHAUSTED, codes::AGENT_IDS_EXHAUSTED]
    );
}

#[test]
fn tagging_boxes_strings_and_mutates_objects() {
    let mut h = host();
    let id = h.call("getNewAgentId", &[]).unwrap();
    let record = Value::plain(Props::new());
    let nested = array(vec![n(1.0)]);
    let items = array(vec![s("square"), record.clone(), nested.clone()]);

    let tagged = h.call("addAgentId", &[items, id.clone()]).unwrap();
    let tagged = tagged.array_items().unwrap();
    assert_eq!(tagged.len(), 3);

    for t in &tagged {
        assert_eq!(t.get_prop(AGENT_ID_PROP), id);
    }
    assert_eq!(tagged[0].type_of(), "object");
    assert_ne!(tagged[0], s("square"));
    assert_eq!(tagged[0].to_string(), "square");
    assert_eq!(tagged[1], record);
    assert_eq!(tagged[2], nested);
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn stored_objects_come_back_by_identity() {
    let mut h = host();
    let prior = Value::from_json(json!({"blue": 0.5, "green": 0.5}));
    h.call("store", &[s("prior"), s("colors"), prior.clone()])
        .unwrap();
    let got = h.call("get", &[s("prior"), s("colors")]).unwrap();
    assert_eq!(got, prior);
}

#[test]
fn primitives_come_back_by_value() {
    let mut h = host();
    h.call("store", &[s("cost"), s("blue"), n(1.0)]).unwrap();
    h.call("store", &[s("cost"), s("label"), s("cheap")]).unwrap();
    assert_eq!(h.call("get", &[s("cost"), s("blue")]).unwrap(), n(1.0));
    assert_eq!(h.call("get", &[s("cost"), s("label")]).unwrap(), s("cheap"));
}

#[test]
fn missing_type_and_name_have_distinct_messages() {
    let mut h = host();
    let no_type = h.call("get", &[s("agent"), s("speaker")]).unwrap_err();
    h.call("store", &[s("agent"), s("listener"), n(1.0)]).unwrap();
    let no_name = h.call("get", &[s("agent"), s("speaker")]).unwrap_err();

    assert_eq!(no_type.code(), codes::NOT_FOUND);
    assert_eq!(no_name.code(), codes::NOT_FOUND);
    assert!(no_type.to_string().starts_with("no objects of type"));
    assert!(no_name.to_string().starts_with("no object of name"));
    assert_ne!(no_type.to_string(), no_name.to_string());
}

#[test]
fn get_all_lists_exactly_the_stored_entries() {
    let mut h = host();
    h.call("store", &[s("t"), s("b"), n(2.0)]).unwrap();
    h.call("store", &[s("t"), s("a"), n(1.0)]).unwrap();
    let all = h.call("getAll", &[s("t")]).unwrap();
    assert_eq!(all.to_json(), json!({"a": 1, "b": 2}));
}

#[test]
fn get_all_result_stays_live() {
    let mut h = host();
    h.call("store", &[s("t"), s("a"), n(1.0)]).unwrap();
    let all = h.call("getAll", &[s("t")]).unwrap();

    h.call("store", &[s("t"), s("b"), n(2.0)]).unwrap();
    assert_eq!(all.get_prop("b"), n(2.0));

    all.set_prop("c", n(3.0));
    assert_eq!(h.call("get", &[s("t"), s("c")]).unwrap(), n(3.0));
    assert_eq!(all.to_json(), json!({"a": 1, "b": 2, "c": 3}));
}

// ---------------------------------------------------------------------------
// Helpers exposed to models
// ---------------------------------------------------------------------------

#[test]
fn ascii_table_pads_every_column() {
    let mut h = host();
    let rows = array(vec![
        array(vec![s("a"), s("bb")]),
        array(vec![s("ccc"), s("d")]),
    ]);
    let table = h.call("renderAsciiTable", &[rows]).unwrap();
    assert_eq!(table.to_string(), "a    bb  \nccc  d   \n");
}

#[test]
fn named_function_shows_only_its_name() {
    let mut h = host();
    let (f, _) = recording_fn();
    let named = h.call("nameFunction", &[s("foo"), f]).unwrap();
    assert_eq!(named.to_string(), "foo");
    assert_eq!(named.to_json(), json!("foo"));
    assert_eq!(
        serde_json::to_string(&array(vec![named])).unwrap(),
        r#"["foo"]"#
    );
}

#[test]
fn named_function_field_reaches_the_callable() {
    let mut h = host();
    let (f, calls) = recording_fn();
    let named = h.call("nameFunction", &[s("foo"), f.clone()]).unwrap();

    let inner = named.get_prop(NAMED_FN_PROP);
    assert_eq!(inner, f);
    assert_eq!(inner.call(&[n(7.0)]).unwrap(), n(1.0));
    assert_eq!(*calls.borrow(), vec![vec![n(7.0)]]);
    assert_eq!(named.to_string(), "foo");
}

#[test]
fn fixed_arity_thunk_calls_through_each_time() {
    let mut h = host();
    let (f, calls) = recording_fn();
    let thunk = h
        .call("applyFixedArity", &[f, array(vec![n(1.0), n(2.0)])])
        .unwrap();
    thunk.call(&[]).unwrap();
    thunk.call(&[]).unwrap();
    assert_eq!(
        *calls.borrow(),
        vec![vec![n(1.0), n(2.0)], vec![n(1.0), n(2.0)]]
    );
}

#[test]
fn fixed_arity_rejects_zero_and_four_args() {
    let mut h = host();
    let (f, calls) = recording_fn();
    for args in [vec![], vec![n(1.0), n(2.0), n(3.0), n(4.0)]] {
        let err = h
            .call("applyFixedArity", &[f.clone(), array(args)])
            .unwrap_err();
        assert_eq!(err.code(), codes::UNSUPPORTED_ARITY);
    }
    assert!(calls.borrow().is_empty());
}

#[test]
fn agent_display_equals_serialization() {
    let mut h = host();
    let agent = h
        .call("mkAgent", &[Value::from_json(json!({"name": "L1", "alpha": 1}))])
        .unwrap();
    assert_eq!(agent.get_prop(IS_AGENT_FIELD), Value::Bool(true));
    assert_eq!(agent.to_string(), agent.to_json().to_string());
    assert_eq!(agent.to_json(), json!({"name": "L1", "alpha": 1, "isAgent": true}));
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

/// A speaker and a literal listener registered, tagged, and tabulated the
/// way a reference-game model does it.
#[test]
fn rsa_model_walkthrough() {
    let mut h = host();

    let speaker_id = h.call("getNewAgentId", &[]).unwrap();
    let listener_id = h.call("getNewAgentId", &[]).unwrap();
    assert_ne!(speaker_id, listener_id);

    let fields = h
        .call(
            "makeObject",
            &[
                array(vec![s("name"), s("id")]),
                array(vec![s("S1"), speaker_id.clone()]),
            ],
        )
        .unwrap();
    let speaker = h.call("mkAgent", &[fields.clone()]).unwrap();
    assert_eq!(speaker, fields);
    h.call("store", &[s("agent"), s("S1"), speaker.clone()])
        .unwrap();

    let utterances = h
        .call(
            "addAgentId",
            &[array(vec![s("blue"), s("square")]), speaker_id.clone()],
        )
        .unwrap();
    for u in utterances.array_items().unwrap() {
        assert_eq!(u.get_prop(AGENT_ID_PROP), speaker_id);
    }

    let stored = h.call("get", &[s("agent"), s("S1")]).unwrap();
    assert_eq!(stored, speaker);
    assert_eq!(stored.get_prop("name"), s("S1"));

    let rows = array(vec![
        array(vec![s("agent"), s("id")]),
        array(vec![stored.get_prop("name"), stored.get_prop("id")]),
    ]);
    let table = h.call("renderAsciiTable", &[rows]).unwrap();
    assert_eq!(table.to_string(), "agent  id  \nS1     1   \n");

    h.call("assert", &[stored.get_prop(IS_AGENT_FIELD), s("S1 must be an agent")])
        .unwrap();
    assert!(h.call("nonexistent", &[]).is_err());
}
