//! Stores: state, listeners and the actions bound to them.

mod state;
mod store;
mod subscription;

pub(crate) use state::{StateCell, StateInitializer};
pub use state::merge;
pub use store::{create_store, Store};
pub(crate) use store::Links;
pub use subscription::{Subscribable, Subscription, SubscriptionGuard};
