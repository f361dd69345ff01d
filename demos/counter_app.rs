//! A todo list and a counter composed into one view.
//!
//! Run with `RUST_LOG=hoverboard=trace` to see dispatches and notifications.

use hoverboard::{compose, create_store, Compose, Definition, Handlers, Outcome, Store};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn counter() -> Store {
    create_store(
        &Handlers::new()
            .initial_state(|| Ok(json!({ "count": 0 })))
            .on("increment", |state, _| {
                Ok(json!({ "count": state["count"].as_i64().unwrap_or(0) + 1 }))
            })
            .on("reset", |_, _| Ok(Outcome::Replace(json!({ "count": 0 })))),
    )
}

fn todos() -> Store {
    create_store(
        &Handlers::new()
            .initial_state(|| Ok(json!({ "items": [] })))
            .on("add", |state, args| {
                let mut items = state["items"].as_array().cloned().unwrap_or_default();
                items.push(json!({ "title": args[0].clone(), "done": false }));
                Ok(json!({ "items": items }))
            })
            .on("toggle", |state, args| {
                let index = args[0].as_u64().unwrap_or(0) as usize;
                let mut items = state["items"].as_array().cloned().unwrap_or_default();
                if let Some(item) = items.get_mut(index) {
                    let done = item["done"].as_bool().unwrap_or(false);
                    item["done"] = json!(!done);
                }
                Ok(json!({ "items": items }))
            }),
    )
}

fn summarize(state: Value) -> Value {
    let items = state["todos"]["items"].as_array().cloned().unwrap_or_default();
    let done = items.iter().filter(|item| item["done"] == true).count();
    json!({
        "clicks": state["counter"]["count"],
        "total": items.len(),
        "done": done,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Hoverboard Example: Counter + Todos ===\n");

    let counter = counter();
    let todos = todos();

    let view = Compose::new(Definition::map([
        ("counter", counter.clone()),
        ("todos", todos.clone()),
    ]))
    .transform(summarize)
    .build()?;

    println!("1. Subscribing to the composed view");
    let subscription = view.subscribe(|state| println!("   [View] {state}"))?;

    println!("\n2. Adding todos");
    todos.call("add", &[json!("Learn Rust")])?;
    todos.call("add", &[json!("Build a store")])?;

    println!("\n3. Completing the first todo");
    todos.call("toggle", &[json!(0)])?;

    println!("\n4. Clicking the counter twice");
    counter.call("increment", &[])?;
    counter.call("increment", &[])?;

    println!("\n5. Members stay reachable through the view");
    if let Some(inner) = view.member("counter") {
        inner.call("reset", &[])?;
    }

    println!("\n6. A static composition");
    let greeting = compose(json!("hello"))?;
    println!("   {}", greeting.state()?);

    subscription.unsubscribe();
    println!("\n✓ Example complete!");
    Ok(())
}
