//! In-memory list state
//!
//! One `ListStore` holds the displayed list of one domain. It is created by
//! the command that needs it and handed explicitly to the orchestrator that
//! writes it and to the views that render it.

use std::sync::Arc;

use tokio::sync::watch;

/// Single-owner container for a domain's current list
///
/// Writers either replace the whole list or apply an atomic
/// read-modify-write; readers take cheap snapshots or subscribe to changes.
pub struct ListStore<T> {
    tx: Arc<watch::Sender<Arc<Vec<T>>>>,
}

impl<T> Clone for ListStore<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Default for ListStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListStore<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self { tx: Arc::new(tx) }
    }

    /// Current list
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replace the whole list, as a full reload does
    pub fn replace(&self, items: Vec<T>) {
        self.tx.send_replace(Arc::new(items));
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.tx.subscribe()
    }
}

impl<T: PartialEq> ListStore<T> {
    /// Atomically derive the next list from the current one
    ///
    /// Subscribers are only notified when the list actually changed.
    ///
    /// # Returns
    /// The list as it stands after the update
    pub fn update(&self, f: impl FnOnce(&[T]) -> Vec<T>) -> Arc<Vec<T>> {
        let mut result = Arc::default();
        self.tx.send_if_modified(|list| {
            let next = f(list.as_slice());
            if next == **list {
                result = Arc::clone(list);
                return false;
            }
            *list = Arc::new(next);
            result = Arc::clone(list);
            true
        });
        result
    }
}
