use std::sync::{Arc, Mutex};

use super::subscription::Subscription;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A multicast emission channel with scoped subscription handles. Unlike
/// `Property`, a `Signal` holds no current value — it only fans events out
/// to whoever is subscribed at emission time.
pub struct Signal<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn emit(&self, value: &T) {
        let listeners: Vec<Listener<T>> = {
            let guard = self.inner.lock().unwrap();
            guard.listeners.iter().map(|(_, f)| Arc::clone(f)).collect()
        };
        for listener in listeners {
            listener(value);
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

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }
}
