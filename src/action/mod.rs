//! Action binding.
//!
//! A [`Handlers`] table (or any [`HandlerSource`]) is scanned once when a
//! store is created. Every member named `onXxx` becomes an [`Action`] named
//! `xxx` that runs under the store's re-entrancy lock.

mod action;
mod handlers;

pub use action::Action;
pub use handlers::{action_name, Handler, HandlerSource, Handlers, Initializer, Outcome, Setter};
