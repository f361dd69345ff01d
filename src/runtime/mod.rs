//! Re-entrancy guards.
//!
//! Actions run under an action lock scoped to one store or shared by every
//! thread-scoped store on the current thread. Strict stores additionally guard
//! their own notifications with a [`Lock`].

mod lock;

pub(crate) use lock::ActionLock;
pub use lock::{Lock, LockGuard};
