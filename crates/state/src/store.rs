//! Observer-pattern cell
//!
//! A [`Store`] holds one value and a registry of callbacks. Every mutation
//! replaces the value and then calls each subscriber synchronously with the
//! new value. Mutations are serialized: two concurrent `update` calls apply
//! one after the other and neither result is lost.
//!
//! Subscribers run after the value lock is released, so a callback may read
//! the store it is subscribed to (or mutate it; the writer lock is
//! re-entrant). Updater closures passed to [`Store::update`] run under the
//! value lock and must not touch the same store.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    /// Serializes mutation + notification so subscribers see values in order
    writer: ReentrantMutex<()>,
    value: RwLock<T>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

/// Shared, observable value
///
/// Cloning a `Store` clones the handle, not the value.
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                writer: ReentrantMutex::new(()),
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        let _writer = self.inner.writer.lock();
        let snapshot = {
            let mut current = self.inner.value.write();
            *current = value;
            current.clone()
        };
        self.notify(&snapshot);
    }

    /// Compute the next value from the current one and notify subscribers
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let _writer = self.inner.writer.lock();
        let snapshot = {
            let mut current = self.inner.value.write();
            let next = f(&current);
            *current = next;
            current.clone()
        };
        self.notify(&snapshot);
    }

    /// Mutate the value in place and notify subscribers
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        let _writer = self.inner.writer.lock();
        let snapshot = {
            let mut current = self.inner.value.write();
            f(&mut current);
            current.clone()
        };
        self.notify(&snapshot);
    }

    /// Like [`Store::update`], but commits only when `f` succeeds
    ///
    /// On error the value is left untouched and nobody is notified.
    pub fn try_update<E>(&self, f: impl FnOnce(&T) -> Result<T, E>) -> Result<(), E> {
        let _writer = self.inner.writer.lock();
        let snapshot = {
            let mut current = self.inner.value.write();
            let next = f(&current)?;
            *current = next;
            current.clone()
        };
        self.notify(&snapshot);
        Ok(())
    }

    /// Register a callback
    ///
    /// The callback is invoked immediately with the current value and then
    /// after every mutation, until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let callback: Callback<T> = Arc::new(callback);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let _writer = self.inner.writer.lock();
        self.inner
            .subscribers
            .lock()
            .push((id, Arc::clone(&callback)));

        let current = self.get();
        callback(&current);

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.subscribers.lock().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }
}

/// Handle returned by [`Store::subscribe`]; unsubscribes on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    /// Keep the callback registered for the lifetime of the store
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_sees_current_value_then_each_mutation() {
        let store = Store::new(1u32);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |value| sink.lock().push(*value));

        store.set(2);
        store.update(|value| value * 10);
        store.modify(|value| *value += 1);

        assert_eq!(*seen.lock(), vec![1, 2, 20, 21]);
        assert_eq!(store.get(), 21);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = Store::new(String::new());
        let calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&calls);
        let sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.subscriber_count(), 1);

        drop(sub);
        store.set("ignored".to_string());

        assert_eq!(store.subscriber_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_subscription_stays_registered() {
        let store = Store::new(0u8);
        store.subscribe(|_| {}).detach();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_try_update_error_leaves_value_untouched() {
        let store = Store::new(5i32);
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let _sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result: Result<(), &str> = store.try_update(|_| Err("disk full"));

        assert_eq!(result, Err("disk full"));
        assert_eq!(store.get(), 5);
        // Only the initial call from subscribe
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_read_its_own_store() {
        let store = Store::new(vec![1, 2, 3]);
        let lengths = Arc::new(Mutex::new(Vec::new()));

        let reader = store.clone();
        let sink = Arc::clone(&lengths);
        let _sub = store.subscribe(move |_| sink.lock().push(reader.get().len()));

        store.modify(|items| items.push(4));
        assert_eq!(*lengths.lock(), vec![3, 4]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Store::new(0u64);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        store.update(|value| value + 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get(), 8000);
    }
}
