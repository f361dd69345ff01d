use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::store::StateInitializer;

/// A handler member: receives a copy of the current state and the call arguments.
pub type Handler = Rc<dyn Fn(Value, &[Value]) -> anyhow::Result<Outcome>>;

/// Work handed a [`Setter`] so it can update state now or later.
pub type Initializer = Box<dyn FnOnce(Setter) -> anyhow::Result<()>>;

/// What an action does with the store after its handler returned.
pub enum Outcome {
    /// Leave the state alone.
    Unchanged,
    /// Merge into the current state.
    Merge(Value),
    /// Throw the current state away and use this one.
    Replace(Value),
    /// Run the initializer with a setter bound to the store.
    Deferred(Initializer),
}

impl Outcome {
    pub fn deferred<F>(initializer: F) -> Self
    where
        F: FnOnce(Setter) -> anyhow::Result<()> + 'static,
    {
        Outcome::Deferred(Box::new(initializer))
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Merge(value)
    }
}

impl From<Option<Value>> for Outcome {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Outcome::Unchanged, Outcome::Merge)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Unchanged
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged => f.write_str("Unchanged"),
            Outcome::Merge(value) => f.debug_tuple("Merge").field(value).finish(),
            Outcome::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Outcome::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Cheap handle that pushes a value into a store.
#[derive(Clone)]
pub struct Setter {
    apply: Rc<dyn Fn(Value) -> Result<()>>,
}

impl Setter {
    pub(crate) fn new<F>(apply: F) -> Self
    where
        F: Fn(Value) -> Result<()> + 'static,
    {
        Self {
            apply: Rc::new(apply),
        }
    }

    pub fn set(&self, value: Value) -> Result<()> {
        (self.apply)(value)
    }
}

/// Public action name for a handler member, if it follows the `onXxx` convention.
///
/// ```
/// use hoverboard::action_name;
///
/// assert_eq!(action_name("onSomeThing").as_deref(), Some("someThing"));
/// assert_eq!(action_name("online"), None);
/// assert_eq!(action_name("helper"), None);
/// ```
pub fn action_name(member: &str) -> Option<String> {
    let rest = member.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(first.to_lowercase().chain(chars).collect())
}

/// A method table a store is bound from.
///
/// Members keep their registration order. Only members named `onXxx` become
/// actions; anything else is carried along but never exposed.
#[derive(Clone, Default)]
pub struct Handlers {
    members: Vec<(String, Handler)>,
    initial_state: Option<StateInitializer>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member under its full name.
    pub fn member<F, O>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value, &[Value]) -> anyhow::Result<O> + 'static,
        O: Into<Outcome>,
    {
        let handler: Handler = Rc::new(move |state: Value, args: &[Value]| {
            handler(state, args).map(<O as Into<Outcome>>::into)
        });
        self.members.push((name.into(), handler));
        self
    }

    /// Register `on{Name}` for the action `name`.
    ///
    /// `Handlers::new().on("add", ..)` is the same as `.member("onAdd", ..)`.
    /// An empty name can never become an action, so the handler is not
    /// registered and a warning is logged.
    pub fn on<F, O>(self, action: &str, handler: F) -> Self
    where
        F: Fn(Value, &[Value]) -> anyhow::Result<O> + 'static,
        O: Into<Outcome>,
    {
        let mut chars = action.chars();
        let Some(first) = chars.next() else {
            tracing::warn!("ignoring handler registered under an empty action name");
            return self;
        };
        let member = format!("on{}{}", first.to_uppercase(), chars.as_str());
        self.member(member, handler)
    }

    /// Initial state, computed lazily the first time the store is read.
    pub fn initial_state<F>(mut self, initializer: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + 'static,
    {
        self.initial_state = Some(Rc::new(initializer));
        self
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.initial_state.is_none()
    }

    /// Action name and handler for every member following the naming convention.
    pub(crate) fn actions(&self) -> impl Iterator<Item = (String, Handler)> + '_ {
        self.members.iter().filter_map(|(member, handler)| {
            action_name(member).map(|name| (name, Rc::clone(handler)))
        })
    }

    pub(crate) fn initializer(&self) -> Option<StateInitializer> {
        self.initial_state.clone()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("members", &self.members().collect::<Vec<_>>())
            .field("initial_state", &self.initial_state.is_some())
            .finish()
    }
}

/// Anything that can hand out a method table for a store.
///
/// Binding asks for a fresh table and never writes back into the source, so
/// one source can back any number of independent stores.
pub trait HandlerSource {
    fn handlers(&self) -> Handlers;
}

impl HandlerSource for Handlers {
    fn handlers(&self) -> Handlers {
        self.clone()
    }
}

impl<T: HandlerSource + ?Sized> HandlerSource for Rc<T> {
    fn handlers(&self) -> Handlers {
        (**self).handlers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_names_follow_convention() {
        assert_eq!(action_name("onAdd").as_deref(), Some("add"));
        assert_eq!(action_name("onX").as_deref(), Some("x"));
        assert_eq!(action_name("onÉclair").as_deref(), Some("éclair"));
        assert_eq!(action_name("on"), None);
        assert_eq!(action_name("onadd"), None);
        assert_eq!(action_name("add"), None);
        assert_eq!(action_name("getInitialState"), None);
    }

    #[test]
    fn on_builds_member_names() {
        let handlers = Handlers::new()
            .on("add", |_, _| Ok(()))
            .on("someThing", |_, _| Ok(()))
            .member("helper", |_, _| Ok(()));
        assert_eq!(
            handlers.members().collect::<Vec<_>>(),
            ["onAdd", "onSomeThing", "helper"]
        );
        let actions: Vec<String> = handlers.actions().map(|(name, _)| name).collect();
        assert_eq!(actions, ["add", "someThing"]);
    }

    #[test]
    fn empty_action_name_is_not_registered() {
        let handlers = Handlers::new()
            .on("", |_, _| Ok(()))
            .on("add", |_, _| Ok(()));
        assert_eq!(handlers.members().collect::<Vec<_>>(), ["onAdd"]);
        assert!(Handlers::new().on("", |_, _| Ok(())).is_empty());
    }

    #[test]
    fn outcomes_from_plain_values() {
        assert!(matches!(Outcome::from(json!(1)), Outcome::Merge(_)));
        assert!(matches!(Outcome::from(()), Outcome::Unchanged));
        assert!(matches!(Outcome::from(None::<Value>), Outcome::Unchanged));
    }

    #[test]
    fn binding_copies_the_table() {
        let source = Handlers::new().on("add", |_, _| Ok(()));
        let mut copy = source.handlers();
        copy = copy.on("extra", |_, _| Ok(()));
        assert_eq!(copy.members().count(), 2);
        assert_eq!(source.members().count(), 1);
    }
}
