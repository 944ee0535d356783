//! Scoped resource cleanup.
//!
//! Long-lived components own timers, spawned tasks and subscriptions whose
//! lifetime must not outlive the component. Each component keeps one
//! [`DisposableList`] and registers everything it starts; teardown is then a
//! single [`DisposableList::dispose`] call. Disposal is idempotent and
//! applies to late registrations as well: adding to an already-disposed list
//! disposes the item on the spot, so nothing can slip through a teardown
//! race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::task::AbortHandle;

/// A resource that can be released exactly once.
///
/// Implementations must tolerate repeated calls; only the first call may
/// have an effect.
pub trait Disposable: Send {
    /// Release the underlying resource.
    fn dispose(&mut self);
}

/// An owning collection of [`Disposable`]s released together.
///
/// The list itself implements [`Disposable`], so lists nest: a child
/// component's list can be registered in its parent's and the whole tree
/// tears down with one call.
pub struct DisposableList {
    items: Mutex<Vec<Box<dyn Disposable>>>,
    disposed: AtomicBool,
}

impl DisposableList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Register an item for disposal.
    ///
    /// If the list has already been disposed the item is disposed
    /// immediately instead of being stored.
    pub fn add<D: Disposable + 'static>(&self, item: D) {
        let mut item: Box<dyn Disposable> = Box::new(item);
        if self.disposed.load(Ordering::SeqCst) {
            item.dispose();
            return;
        }
        let mut items = self.lock_items();
        // Re-check under the lock: dispose() may have drained between the
        // flag load and the lock acquisition.
        if self.disposed.load(Ordering::SeqCst) {
            drop(items);
            item.dispose();
            return;
        }
        items.push(item);
    }

    /// Dispose every registered item. Idempotent; later calls are no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut drained = {
            let mut items = self.lock_items();
            std::mem::take(&mut *items)
        };
        // Items run outside the lock so a dispose callback may register
        // against this list (and get disposed immediately) without
        // deadlocking.
        for item in drained.iter_mut() {
            item.dispose();
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<Box<dyn Disposable>>> {
        // A poisoned lock must not block teardown.
        self.items.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for DisposableList {
    fn default() -> Self {
        Self::new()
    }
}

impl Disposable for DisposableList {
    fn dispose(&mut self) {
        DisposableList::dispose(self);
    }
}

impl Drop for DisposableList {
    fn drop(&mut self) {
        DisposableList::dispose(self);
    }
}

/// Aborts a spawned task when disposed.
///
/// Register the [`AbortHandle`] of every task a component spawns so a
/// disposed component cannot run callbacks afterwards.
///
/// # Examples
///
/// ```rust
/// use rtcast_infra_common::disposable::{AbortOnDispose, DisposableList};
///
/// # tokio_test::block_on(async {
/// let task = tokio::spawn(async {
///     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
/// });
///
/// let list = DisposableList::new();
/// list.add(AbortOnDispose::new(task.abort_handle()));
/// list.dispose();
///
/// assert!(task.await.unwrap_err().is_cancelled());
/// # })
/// ```
pub struct AbortOnDispose(AbortHandle);

impl AbortOnDispose {
    pub fn new(handle: AbortHandle) -> Self {
        Self(handle)
    }
}

impl Disposable for AbortOnDispose {
    fn dispose(&mut self) {
        self.0.abort();
    }
}

impl From<AbortHandle> for AbortOnDispose {
    fn from(handle: AbortHandle) -> Self {
        Self(handle)
    }
}

/// Runs a closure once when disposed.
pub struct DisposeFn(Option<Box<dyn FnOnce() + Send>>);

impl DisposeFn {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }
}

impl Disposable for DisposeFn {
    fn dispose(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn dispose_runs_each_item_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let list = DisposableList::new();
        for _ in 0..2 {
            let count = count.clone();
            list.add(DisposeFn::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        list.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Second dispose is a no-op.
        list.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(list.is_disposed());
    }

    #[test]
    fn add_after_dispose_runs_item_immediately() {
        let count = Arc::new(AtomicUsize::new(0));
        let list = DisposableList::new();
        list.dispose();

        let count2 = count.clone();
        list.add(DisposeFn::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_list_disposes_with_parent() {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = DisposableList::new();
        let count2 = count.clone();
        inner.add(DisposeFn::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        }));

        let outer = DisposableList::new();
        outer.add(inner);
        outer.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abort_on_dispose_cancels_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            fired2.store(true, Ordering::SeqCst);
        });

        let list = DisposableList::new();
        list.add(AbortOnDispose::new(task.abort_handle()));
        list.dispose();

        let joined = task.await;
        assert!(joined.unwrap_err().is_cancelled());
        assert!(!fired.load(Ordering::SeqCst));
    }
}
