//! Host listener bookkeeping.
//!
//! Every component that asks the host for event delivery (resize sessions
//! need pointer-move/up, popovers need outside-click and Escape) registers
//! through here and holds a [`ListenerGuard`]. Dropping the guard
//! deregisters the listener, so teardown is release-by-ownership: when the
//! editor destroys a component, its listeners go with it. Leaked listeners
//! compound across mount/unmount cycles of the hosting page, which is why
//! this is a contract and not a convention — `active_count` must return to
//! zero after every teardown.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerUp,
    PointerDown,
    KeyDown,
    Click,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    active: HashMap<u64, EventKind>,
}

/// Shared registry handle. Cloning shares the underlying table; the editor
/// owns the original and hands clones to its components.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Inner>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in an event. The returned guard is the
    /// registration; there is no other way to deregister.
    pub fn register(&self, kind: EventKind) -> ListenerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.active.insert(id, kind);
        ListenerGuard {
            id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }

    pub fn active_count_of(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .active
            .values()
            .filter(|&&k| k == kind)
            .count()
    }
}

/// RAII registration for one host listener.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    inner: Weak<RefCell<Inner>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().active.remove(&self.id);
        }
    }
}
