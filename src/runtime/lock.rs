use std::cell::Cell;
use std::rc::Rc;

use crate::config::LockScope;
use crate::error::{Result, StoreError};

/// A re-entrancy guard around a unit of work.
///
/// Engaging an already engaged lock fails with [`StoreError::Reentrant`]
/// instead of blocking. The lock is released when the returned guard drops,
/// which includes unwinding out of a panicking handler.
pub struct Lock {
    engaged: Cell<bool>,
    operation: &'static str,
}

impl Lock {
    pub fn new(operation: &'static str) -> Self {
        Self {
            engaged: Cell::new(false),
            operation,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.get()
    }

    /// Engage the lock until the guard is dropped.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        if self.engaged.replace(true) {
            tracing::debug!(operation = self.operation, "re-entrant call rejected");
            return Err(StoreError::Reentrant {
                operation: self.operation,
            });
        }
        Ok(LockGuard { lock: self })
    }

    /// Run `f` with the lock engaged.
    pub fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let _guard = self.acquire()?;
        f()
    }
}

/// RAII guard releasing a [`Lock`].
pub struct LockGuard<'a> {
    lock: &'a Lock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.engaged.set(false);
    }
}

// One action lock shared by every thread-scoped store on this thread.
thread_local! {
    static THREAD_ACTION_LOCK: Lock = Lock::new(StoreError::IN_ACTION);
}

/// The action lock a store dispatches through.
#[derive(Clone)]
pub(crate) enum ActionLock {
    Store(Rc<Lock>),
    Thread,
}

impl ActionLock {
    pub(crate) fn for_scope(scope: LockScope) -> Self {
        match scope {
            LockScope::Store => ActionLock::Store(Rc::new(Lock::new(StoreError::IN_ACTION))),
            LockScope::Thread => ActionLock::Thread,
        }
    }

    pub(crate) fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        match self {
            ActionLock::Store(lock) => lock.run(f),
            ActionLock::Thread => THREAD_ACTION_LOCK.with(|lock| lock.run(f)),
        }
    }
}
