//! # Hoverboard
//!
//! Small single-threaded state stores for Rust.
//!
//! A store is built from a table of action handlers and exposes three things:
//!
//! ## Actions
//!
//! Every handler member named `onXxx` becomes an action named `xxx`:
//! - `Handlers` - The method table a store is bound from
//! - `Action` - A callable bound to one handler, guarded against re-entrant calls
//! - `Outcome` - What a handler asks the store to do with its state
//!
//! ## State
//!
//! - `Store::state` - A fresh copy of the current state
//! - `Store::subscribe` - Listen to every change, starting with the current state
//! - Shallow merging of mapping states, replacement for everything else
//!
//! ## Composition
//!
//! - `compose` / `Compose` - Derive one store from stores, values and initializers

pub mod action;
pub mod compose;
pub mod config;
pub mod error;
pub mod runtime;
pub mod store;

// Re-export main types for convenience
pub use action::{action_name, Action, HandlerSource, Handlers, Outcome, Setter};
pub use compose::{compose, Compose, Definition, Entry};
pub use config::{LockScope, StateShape, StoreConfig};
pub use error::{Result, StoreError};
pub use store::{create_store, merge, Store, Subscribable, Subscription, SubscriptionGuard};
