use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::state::StateCell;
use super::subscription::{Listener, Subscribable, Subscription};
use crate::action::{Action, HandlerSource};
use crate::compose::Composition;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::runtime::ActionLock;

/// Stores reachable through a composed store.
pub(crate) enum Links {
    None,
    /// The composition wraps a single store and forwards its actions.
    Wrapped(Store),
    Keyed(Vec<(String, Store)>),
    Indexed(Vec<(usize, Store)>),
}

/// A state container with bound actions.
///
/// Stores are single-threaded handles; cloning one is cheap and the clones
/// share state, listeners and actions.
///
/// # Examples
///
/// ```
/// use hoverboard::{create_store, Handlers};
/// use serde_json::json;
///
/// let counter = create_store(&Handlers::new().on("add", |state, args| {
///     let value = state["value"].as_i64().unwrap_or(0) + args[0].as_i64().unwrap_or(0);
///     Ok(json!({ "value": value }))
/// }));
///
/// counter.call("add", &[json!(2)]).unwrap();
/// counter.call("add", &[json!(3)]).unwrap();
/// assert_eq!(counter.state().unwrap()["value"], 5);
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

struct StoreInner {
    cell: Rc<StateCell>,
    actions: Vec<Action>,
    links: Links,
    // Keeps child subscriptions of a composed store alive.
    _composition: Option<Rc<Composition>>,
}

impl Store {
    /// Bind a store with the default configuration.
    pub fn new<S>(source: &S) -> Self
    where
        S: HandlerSource + ?Sized,
    {
        Self::with_config(source, StoreConfig::default())
    }

    pub fn with_config<S>(source: &S, config: StoreConfig) -> Self
    where
        S: HandlerSource + ?Sized,
    {
        let handlers = source.handlers();
        let cell = StateCell::new(&config, handlers.initializer());
        let lock = ActionLock::for_scope(config.lock_scope);

        let mut actions: Vec<Action> = Vec::new();
        for (name, handler) in handlers.actions() {
            // A later member with the same action name wins.
            let position = actions.iter().position(|existing| existing.name() == name);
            let action = Action::new(name, handler, Rc::clone(&cell), lock.clone());
            match position {
                Some(position) => actions[position] = action,
                None => actions.push(action),
            }
        }
        tracing::debug!(
            actions = actions.len(),
            lock_scope = ?config.lock_scope,
            "store created"
        );

        Self {
            inner: Rc::new(StoreInner {
                cell,
                actions,
                links: Links::None,
                _composition: None,
            }),
        }
    }

    pub(crate) fn composed(cell: Rc<StateCell>, links: Links, composition: Rc<Composition>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                cell,
                actions: Vec::new(),
                links,
                _composition: Some(composition),
            }),
        }
    }

    /// A fresh copy of the current state.
    pub fn state(&self) -> Result<Value> {
        self.inner.cell.read()
    }

    /// Call `listener` now with the current state and again after every change.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn(Value) + 'static,
    {
        let listener: Listener = Rc::new(listener);
        self.inner.cell.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.cell.listener_count()
    }

    /// Look up an action by its public name.
    ///
    /// A composition wrapping a single store answers with that store's actions.
    pub fn action(&self, name: &str) -> Option<Action> {
        if let Links::Wrapped(store) = &self.inner.links {
            return store.action(name);
        }
        self.inner
            .actions
            .iter()
            .find(|action| action.name() == name)
            .cloned()
    }

    pub fn action_names(&self) -> Vec<String> {
        if let Links::Wrapped(store) = &self.inner.links {
            return store.action_names();
        }
        self.inner
            .actions
            .iter()
            .map(|action| action.name().to_string())
            .collect()
    }

    /// Call an action by name and return this store's state afterwards.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let action = self.action(name).ok_or_else(|| StoreError::UnknownAction {
            name: name.to_string(),
        })?;
        match &self.inner.links {
            Links::Wrapped(_) => {
                action.call(args)?;
                self.state()
            }
            _ => action.call(args),
        }
    }

    /// Store placed under `key` in a composed mapping.
    pub fn member(&self, key: &str) -> Option<Store> {
        match &self.inner.links {
            Links::Keyed(stores) => stores
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, store)| store.clone()),
            _ => None,
        }
    }

    /// Store placed at `index` in a composed sequence.
    pub fn element(&self, index: usize) -> Option<Store> {
        match &self.inner.links {
            Links::Indexed(stores) => stores
                .iter()
                .find(|(position, _)| *position == index)
                .map(|(_, store)| store.clone()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Subscribable for Store {
    fn subscribe(&self, listener: Box<dyn Fn(Value)>) -> Result<Subscription> {
        self.inner.cell.subscribe(Rc::from(listener))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("actions", &self.action_names())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Bind a store from a handler source with the default configuration.
pub fn create_store<S>(source: &S) -> Store
where
    S: HandlerSource + ?Sized,
{
    Store::new(source)
}
