use std::sync::{Arc, Mutex};

use super::subscription::Subscription;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: T,
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A value cell with change notification: synchronous get, equality-guarded
/// set, and scoped subscriptions that detach on drop.
///
/// Single-writer, multi-reader. `set` fans out to subscribers synchronously
/// on the caller's thread; callers dispatching onto an event loop are
/// expected to hop threads themselves before calling `set`.
#[derive(Clone)]
pub struct Property<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Clone + PartialEq + Send + 'static> Property<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: initial,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.inner.lock().unwrap().value.clone()
    }

    /// Sets the value. No-op (no notification) if `value` equals the current value.
    pub fn set(&self, value: T) {
        let to_notify: Vec<Listener<T>> = {
            let mut guard = self.inner.lock().unwrap();
            if guard.value == value {
                return;
            }
            guard.value = value.clone();
            guard.listeners.iter().map(|(_, f)| Arc::clone(f)).collect()
        };
        for listener in to_notify {
            listener(&value);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let mut guard = self.inner.lock().unwrap();
        let id = guard.next_id;
        guard.next_id += 1;
        guard.listeners.push((id, Arc::new(listener)));
        drop(guard);

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            let mut guard = inner.lock().unwrap();
            guard.listeners.retain(|(listener_id, _)| *listener_id != id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn set_notifies_subscribers_on_change() {
        let prop = Property::new(1);
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_listener = Arc::clone(&seen);
        let _sub = prop.subscribe(move |v| {
            seen_in_listener.store(*v, Ordering::SeqCst);
        });

        prop.set(42);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn set_is_equality_guarded() {
        let prop = Property::new(1);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_listener = Arc::clone(&calls);
        let _sub = prop.subscribe(move |_| {
            calls_in_listener.fetch_add(1, Ordering::SeqCst);
        });

        prop.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        prop.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_detaches_listener() {
        let prop = Property::new(0);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_listener = Arc::clone(&calls);
        let sub = prop.subscribe(move |_| {
            calls_in_listener.fetch_add(1, Ordering::SeqCst);
        });

        drop(sub);
        prop.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
