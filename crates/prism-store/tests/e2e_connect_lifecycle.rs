//! End-to-end lifecycle test: a small todo application driving connected
//! components through mount, store mutation, property changes, and unmount.
//!
//! Validates:
//! 1. Action dispatch re-renders exactly the components whose declared
//!    paths changed.
//! 2. Dynamic schemes select different store slices as properties change.
//! 3. Unmounting (explicitly or mid-pass) stops further notifications.
//! 4. The default scheme flattens the whole snapshot over incoming props.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use prism_core::{Path, Value};
use prism_store::{Component, Props, Scheme, SchemeMap, Store};
use serde_json::json;

/// Records every render's merged properties.
struct Probe {
    renders: Rc<RefCell<Vec<Props>>>,
}

impl Probe {
    fn new() -> (Self, Rc<RefCell<Vec<Props>>>) {
        let renders = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                renders: Rc::clone(&renders),
            },
            renders,
        )
    }
}

impl Component for Probe {
    fn render(&mut self, props: &Props) {
        self.renders.borrow_mut().push(props.clone());
    }
}

fn todo_store() -> Store {
    Store::new(Value::map([
        (
            "todos",
            Value::from(json!([
                {"title": "buy milk", "done": true},
                {"title": "ship it", "done": false},
            ])),
        ),
        ("title", Value::from("inbox")),
        (
            "add",
            Value::action(|txn, args| {
                let title = args.first().and_then(Value::as_str).unwrap_or("untitled");
                let len = txn
                    .get("todos")?
                    .and_then(Value::as_list)
                    .map_or(0, im::Vector::len);
                txn.set(
                    &format!("todos[{len}]"),
                    Value::map([("title", Value::from(title)), ("done", Value::Bool(false))]),
                )
            }),
        ),
        (
            "toggle",
            Value::action(|txn, args| {
                let index = args.first().and_then(Value::as_int).unwrap_or(0);
                txn.update(&format!("todos[{index}].done"), |v| {
                    Value::Bool(!v.and_then(Value::as_bool).unwrap_or(false))
                })
            }),
        ),
        (
            "rename",
            Value::action(|txn, args| {
                let title = args.first().and_then(Value::as_str).unwrap_or("");
                txn.set("title", title)
            }),
        ),
    ]))
}

#[test]
fn components_render_only_for_their_slices() {
    let store = todo_store();

    let (header, header_renders) = Probe::new();
    let _header = store.connect_with(header, SchemeMap::new().bind("title", "title").unwrap());

    let (list, list_renders) = Probe::new();
    let _list = store.connect_with(list, SchemeMap::new().bind("todos", "todos").unwrap());

    assert_eq!(header_renders.borrow().len(), 1);
    assert_eq!(list_renders.borrow().len(), 1);

    // Toggling a todo touches only the list.
    store.call("toggle", &[Value::Int(1)]).unwrap();
    assert_eq!(header_renders.borrow().len(), 1);
    assert_eq!(list_renders.borrow().len(), 2);
    let todos = list_renders.borrow()[1].get("todos").unwrap().to_json();
    assert_eq!(todos[1]["done"], json!(true));

    // Renaming touches only the header.
    store.call("rename", &[Value::from("today")]).unwrap();
    assert_eq!(header_renders.borrow().len(), 2);
    assert_eq!(list_renders.borrow().len(), 2);
    assert_eq!(
        header_renders.borrow()[1].get("title"),
        Some(&Value::from("today"))
    );

    // Adding a todo touches only the list.
    store.call("add", &[Value::from("profit")]).unwrap();
    assert_eq!(header_renders.borrow().len(), 2);
    assert_eq!(list_renders.borrow().len(), 3);
    let todos = list_renders.borrow()[2].get("todos").unwrap().to_json();
    assert_eq!(todos[2]["title"], json!("profit"));
}

#[test]
fn dynamic_scheme_tracks_the_selected_todo() {
    let store = todo_store();

    // A detail pane whose scheme depends on the `index` property.
    let scheme = Scheme::dynamic(|props| {
        let index = props.get("index").and_then(Value::as_int).unwrap_or(0);
        SchemeMap::new()
            .bind_path("todo", Path::parse(&format!("todos[{index}]")).unwrap())
    });

    let (pane, renders) = Probe::new();
    let mut pane = store.connect_with_props(pane, scheme, Props::new().with("index", 0));
    assert_eq!(
        renders.borrow()[0].get("todo").unwrap().to_json()["title"],
        json!("buy milk")
    );

    // Selecting another todo re-derives the slice without a store change.
    pane.set_props(Props::new().with("index", 1));
    assert_eq!(renders.borrow().len(), 2);
    assert_eq!(
        renders.borrow()[1].get("todo").unwrap().to_json()["title"],
        json!("ship it")
    );

    // A store change to the unselected todo does not render the pane.
    store.call("toggle", &[Value::Int(0)]).unwrap();
    assert_eq!(renders.borrow().len(), 2);

    // A change to the selected todo does.
    store.call("toggle", &[Value::Int(1)]).unwrap();
    assert_eq!(renders.borrow().len(), 3);
    assert_eq!(
        renders.borrow()[2].get("todo").unwrap().to_json()["done"],
        json!(true)
    );
}

#[test]
fn a_callback_may_dispatch_a_nested_action() {
    let store = todo_store();

    // Renaming triggers this watcher, which toggles the first todo from
    // inside the notification pass.
    let store_for_cb = store.clone();
    store.watch(SchemeMap::new().bind("title", "title").unwrap(), move |_| {
        store_for_cb.call("toggle", &[Value::Int(0)]).unwrap();
    });

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    store.watch(SchemeMap::new().bind("todos", "todos").unwrap(), move |subset| {
        log.borrow_mut()
            .push(subset.get("todos").unwrap().to_json()[0]["done"].clone());
    });

    store.call("rename", &[Value::from("later")]).unwrap();

    // The nested pass delivered the toggled todos exactly once; the outer
    // pass saw todos unchanged against its own snapshot pair and did not
    // re-notify.
    assert_eq!(*seen.borrow(), vec![json!(false)]);
    assert_eq!(store.snapshot().get("title"), Some(&Value::from("later")));
    assert_eq!(store.snapshot().to_json()["todos"][0]["done"], json!(false));
}

#[test]
fn unmounting_one_component_mid_pass_spares_the_rest() {
    let store = todo_store();

    // First subscriber unmounts the second during the notification pass.
    let victim: Rc<RefCell<Option<prism_store::SubscriptionId>>> =
        Rc::new(RefCell::new(None));
    let store_for_cb = store.clone();
    let victim_for_cb = Rc::clone(&victim);
    store.watch(SchemeMap::new().bind("title", "title").unwrap(), move |_| {
        if let Some(id) = victim_for_cb.borrow_mut().take() {
            store_for_cb.unsubscribe(id);
        }
    });

    let second_hits = Rc::new(RefCell::new(0u32));
    let log = Rc::clone(&second_hits);
    let second = store.watch(SchemeMap::new().bind("title", "title").unwrap(), move |_| {
        *log.borrow_mut() += 1;
    });
    *victim.borrow_mut() = Some(second);

    let third_hits = Rc::new(RefCell::new(0u32));
    let log = Rc::clone(&third_hits);
    store.watch(SchemeMap::new().bind("title", "title").unwrap(), move |_| {
        *log.borrow_mut() += 1;
    });

    store.call("rename", &[Value::from("renamed")]).unwrap();
    assert_eq!(*second_hits.borrow(), 0, "unsubscribed mid-pass");
    assert_eq!(*third_hits.borrow(), 1, "later entries still visited");
}

#[test]
fn default_scheme_exposes_the_whole_snapshot() {
    let store = Store::from_json(json!({"a": 1, "b": 2}));
    let (probe, renders) = Probe::new();
    let connector = store.connector(Scheme::whole_store());
    let _conn = connector.wrap_with(probe, Props::new().with("own", true));

    let first = &renders.borrow()[0];
    assert_eq!(first.get("a"), Some(&Value::Int(1)));
    assert_eq!(first.get("b"), Some(&Value::Int(2)));
    assert_eq!(first.get("own"), Some(&Value::Bool(true)));
}
