use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::action::{Initializer, Setter};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::runtime::Lock;
use crate::store::{Links, StateCell, Store, Subscription};

/// `state -> state` step applied to a composed state, in registration order.
pub type Transform = Box<dyn Fn(Value) -> Value>;

/// One slot of a composed mapping or sequence.
pub enum Entry {
    /// Copied into the composed state as is.
    Value(Value),
    /// Mirrors the store's state; the store stays reachable through the composition.
    Store(Store),
    /// Called once with a setter for this slot. The slot reads `null` until it is set.
    Function(Initializer),
}

impl Entry {
    pub fn function<F>(initializer: F) -> Self
    where
        F: FnOnce(Setter) -> anyhow::Result<()> + 'static,
    {
        Entry::Function(Box::new(initializer))
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Value(value)
    }
}

impl From<Store> for Entry {
    fn from(store: Store) -> Self {
        Entry::Store(store)
    }
}

/// What a composed store is built from.
pub enum Definition {
    Value(Value),
    Store(Store),
    Function(Initializer),
    Map(Vec<(String, Entry)>),
    List(Vec<Entry>),
}

impl Definition {
    pub fn function<F>(initializer: F) -> Self
    where
        F: FnOnce(Setter) -> anyhow::Result<()> + 'static,
    {
        Definition::Function(Box::new(initializer))
    }

    pub fn map<K, E, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<Entry>,
    {
        Definition::Map(
            entries
                .into_iter()
                .map(|(key, entry)| (key.into(), entry.into()))
                .collect(),
        )
    }

    pub fn list<E, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Entry>,
    {
        Definition::List(entries.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        Definition::Value(value)
    }
}

impl From<Store> for Definition {
    fn from(store: Store) -> Self {
        Definition::Store(store)
    }
}

impl From<Entry> for Definition {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Value(value) => Definition::Value(value),
            Entry::Store(store) => Definition::Store(store),
            Entry::Function(initializer) => Definition::Function(initializer),
        }
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Root,
    Key(String),
    Index(usize),
}

/// Live wiring behind a composed store.
///
/// Slots are filled while the composition is being built; the composed
/// state is only computed once every input has been wired, and from then on
/// after each slot update.
///
/// A slot updated while the composed store is still notifying (a listener on
/// the composed store drove one of its children) marks the composition stale;
/// the running recompute picks the change up once its notification returns.
pub(crate) struct Composition {
    container: RefCell<Value>,
    transforms: Vec<Transform>,
    active: Cell<bool>,
    recomputing: Lock,
    stale: Cell<bool>,
    cell: Rc<StateCell>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Composition {
    fn update(&self, slot: &Slot, value: Value) -> Result<()> {
        {
            let mut container = self.container.borrow_mut();
            match slot {
                Slot::Root => *container = value,
                Slot::Key(key) => {
                    if let Some(map) = container.as_object_mut() {
                        map.insert(key.clone(), value);
                    }
                }
                Slot::Index(index) => {
                    if let Some(element) = container.get_mut(*index) {
                        *element = value;
                    }
                }
            }
        }
        if self.active.get() {
            self.recompute()
        } else {
            Ok(())
        }
    }

    fn recompute(&self) -> Result<()> {
        let Ok(_recomputing) = self.recomputing.acquire() else {
            self.stale.set(true);
            return Ok(());
        };
        loop {
            self.stale.set(false);
            let mut state = self.container.borrow().clone();
            for transform in &self.transforms {
                state = transform(state);
            }
            tracing::trace!(transforms = self.transforms.len(), "composed state recomputed");
            self.cell.replace(state)?;
            if !self.stale.get() {
                return Ok(());
            }
        }
    }

    fn setter(self: &Rc<Self>, slot: Slot) -> Setter {
        let composition = Rc::downgrade(self);
        Setter::new(move |value| match composition.upgrade() {
            Some(composition) => composition.update(&slot, value),
            None => Ok(()),
        })
    }

    fn follow(self: &Rc<Self>, slot: Slot, store: &Store) -> Result<()> {
        let composition: Weak<Self> = Rc::downgrade(self);
        let subscription = store.subscribe(move |state| {
            let Some(composition) = composition.upgrade() else {
                return;
            };
            if let Err(err) = composition.update(&slot, state) {
                tracing::warn!(slot = ?slot, error = %err, "composed store dropped a child update");
            }
        })?;
        self.subscriptions.borrow_mut().push(subscription);
        Ok(())
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Builder for a composed store.
///
/// # Examples
///
/// ```
/// use hoverboard::{create_store, Compose, Definition, Handlers};
/// use serde_json::json;
///
/// let source = Handlers::new().on("set", |_, args| Ok(args[0].clone()));
/// let a = create_store(&source);
/// let b = create_store(&source);
///
/// let both = Compose::new(Definition::map([("a", a.clone()), ("b", b.clone())]))
///     .build()
///     .unwrap();
///
/// a.call("set", &[json!(1)]).unwrap();
/// assert_eq!(both.state().unwrap(), json!({ "a": 1, "b": {} }));
/// ```
pub struct Compose {
    definition: Definition,
    transforms: Vec<Transform>,
}

impl Compose {
    pub fn new(definition: impl Into<Definition>) -> Self {
        Self {
            definition: definition.into(),
            transforms: Vec::new(),
        }
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn build(self) -> Result<Store> {
        let config = StoreConfig::default().with_default_state(Value::Null);
        let cell = StateCell::new(&config, None);

        let (container, wiring, links) = layout(self.definition);
        tracing::debug!(
            inputs = wiring.len(),
            transforms = self.transforms.len(),
            "composing store"
        );

        let composition = Rc::new(Composition {
            container: RefCell::new(container),
            transforms: self.transforms,
            active: Cell::new(false),
            recomputing: Lock::new(StoreError::IN_NOTIFICATION),
            stale: Cell::new(false),
            cell: Rc::clone(&cell),
            subscriptions: RefCell::new(Vec::new()),
        });

        for (slot, entry) in wiring {
            match entry {
                Entry::Value(value) => composition.update(&slot, value)?,
                Entry::Store(store) => composition.follow(slot, &store)?,
                Entry::Function(initializer) => {
                    initializer(composition.setter(slot)).map_err(StoreError::from_handler)?
                }
            }
        }

        composition.active.set(true);
        composition.recompute()?;

        Ok(Store::composed(cell, links, composition))
    }
}

/// Build a composed store without transforms.
pub fn compose(definition: impl Into<Definition>) -> Result<Store> {
    Compose::new(definition).build()
}

/// Initial container, the inputs to wire into it and the stores to expose.
fn layout(definition: Definition) -> (Value, Vec<(Slot, Entry)>, Links) {
    match definition {
        Definition::Value(value) => (value, Vec::new(), Links::None),
        Definition::Store(store) => (
            Value::Null,
            vec![(Slot::Root, Entry::Store(store.clone()))],
            Links::Wrapped(store),
        ),
        Definition::Function(initializer) => (
            Value::Null,
            vec![(Slot::Root, Entry::Function(initializer))],
            Links::None,
        ),
        Definition::Map(entries) => {
            let mut container = serde_json::Map::new();
            let mut stores = Vec::new();
            let mut wiring = Vec::with_capacity(entries.len());
            for (key, entry) in entries {
                container.insert(key.clone(), Value::Null);
                if let Entry::Store(store) = &entry {
                    stores.push((key.clone(), store.clone()));
                }
                wiring.push((Slot::Key(key), entry));
            }
            (Value::Object(container), wiring, Links::Keyed(stores))
        }
        Definition::List(entries) => {
            let container = vec![Value::Null; entries.len()];
            let mut stores = Vec::new();
            let mut wiring = Vec::with_capacity(entries.len());
            for (index, entry) in entries.into_iter().enumerate() {
                if let Entry::Store(store) = &entry {
                    stores.push((index, store.clone()));
                }
                wiring.push((Slot::Index(index), entry));
            }
            (Value::Array(container), wiring, Links::Indexed(stores))
        }
    }
}
