use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::handlers::{Handler, Outcome, Setter};
use crate::error::{Result, StoreError};
use crate::runtime::ActionLock;
use crate::store::StateCell;

/// A named, callable operation bound to one handler of one store.
///
/// Cloning an action is cheap; clones dispatch to the same handler and store.
#[derive(Clone)]
pub struct Action {
    inner: Rc<ActionInner>,
}

struct ActionInner {
    name: String,
    handler: Handler,
    cell: Rc<StateCell>,
    lock: ActionLock,
}

impl Action {
    pub(crate) fn new(name: String, handler: Handler, cell: Rc<StateCell>, lock: ActionLock) -> Self {
        Self {
            inner: Rc::new(ActionInner {
                name,
                handler,
                cell,
                lock,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run the handler against a copy of the current state and apply its outcome.
    ///
    /// Returns the store's state after the action. Fails with
    /// [`StoreError::Reentrant`] when another action holds the lock, which
    /// includes calls made from listeners notified by a running action.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let inner = &*self.inner;
        tracing::trace!(action = %inner.name, args = args.len(), "dispatching action");
        inner.lock.run(|| {
            let state = inner.cell.read()?;
            let outcome = (inner.handler)(state, args).map_err(StoreError::from_handler)?;
            apply(&inner.cell, outcome)
        })?;
        inner.cell.read()
    }

    /// Whether both handles dispatch to the same bound action.
    pub fn ptr_eq(&self, other: &Action) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn apply(cell: &Rc<StateCell>, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Unchanged => Ok(()),
        Outcome::Merge(delta) => cell.write(delta),
        Outcome::Replace(state) => cell.replace(state),
        Outcome::Deferred(initializer) => {
            initializer(setter_for(cell)).map_err(StoreError::from_handler)
        }
    }
}

/// A setter merging into `cell`. It holds the cell alive for as long as it is kept.
pub(crate) fn setter_for(cell: &Rc<StateCell>) -> Setter {
    let cell = Rc::clone(cell);
    Setter::new(move |delta| cell.write(delta))
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.inner.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LockScope, StoreConfig};
    use serde_json::json;

    fn bind(name: &str, handler: Handler) -> Action {
        let cell = StateCell::new(&StoreConfig::default(), None);
        Action::new(
            name.to_string(),
            handler,
            cell,
            ActionLock::for_scope(LockScope::Store),
        )
    }

    #[test]
    fn call_returns_resulting_state() {
        let add = bind(
            "add",
            Rc::new(|state: Value, args: &[Value]| {
                let value = state["value"].as_i64().unwrap_or(0) + args[0].as_i64().unwrap_or(0);
                Ok(Outcome::Merge(json!({ "value": value })))
            }),
        );
        assert_eq!(add.call(&[json!(4)]).unwrap(), json!({ "value": 4 }));
        assert_eq!(add.call(&[json!(2)]).unwrap(), json!({ "value": 6 }));
    }

    #[test]
    fn handler_failure_releases_the_lock() {
        let fail = bind(
            "fail",
            Rc::new(|_: Value, args: &[Value]| {
                if args.is_empty() {
                    anyhow::bail!("no arguments");
                }
                Ok(Outcome::Unchanged)
            }),
        );
        let err = fail.call(&[]).unwrap_err();
        assert!(matches!(err, StoreError::Handler(_)));
        assert!(fail.call(&[json!(1)]).is_ok());
    }

    #[test]
    fn deferred_setter_outlives_the_call() {
        let kept: Rc<std::cell::RefCell<Option<Setter>>> = Rc::default();
        let slot = Rc::clone(&kept);
        let load = bind(
            "load",
            Rc::new(move |_: Value, _: &[Value]| {
                let slot = Rc::clone(&slot);
                Ok(Outcome::deferred(move |setter| {
                    setter.set(json!({ "loading": true }))?;
                    *slot.borrow_mut() = Some(setter);
                    Ok(())
                }))
            }),
        );

        assert_eq!(load.call(&[]).unwrap(), json!({ "loading": true }));
        let setter = kept.borrow_mut().take().unwrap();
        setter.set(json!({ "loading": false, "rows": 3 })).unwrap();
        assert_eq!(
            load.inner.cell.read().unwrap(),
            json!({ "loading": false, "rows": 3 })
        );
    }

    #[test]
    fn clones_share_identity() {
        let noop = bind("noop", Rc::new(|_: Value, _: &[Value]| Ok(Outcome::Unchanged)));
        let other = bind("noop", Rc::new(|_: Value, _: &[Value]| Ok(Outcome::Unchanged)));
        assert!(noop.ptr_eq(&noop.clone()));
        assert!(!noop.ptr_eq(&other));
    }
}
