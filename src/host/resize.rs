use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Handle to a listener registered on a [`ResizeNotifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn()>;

/// Window-level resize notification source.
///
/// The host calls [`notify`](Self::notify) whenever the window size changes;
/// listeners read the new size from their container themselves.
#[derive(Default)]
pub struct ResizeNotifier {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

impl ResizeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if the listener was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Invokes every listener registered at the time of the call
    pub fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let notifier = ResizeNotifier::new();
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        let id = notifier.subscribe(move || counter.set(counter.get() + 1));
        notifier.notify();
        notifier.notify();
        assert_eq!(calls.get(), 2);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify();
        assert_eq!(calls.get(), 2);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let notifier = Rc::new(ResizeNotifier::new());
        let own_id = Rc::new(Cell::new(None));

        let inner_notifier = notifier.clone();
        let inner_id = own_id.clone();
        own_id.set(Some(notifier.subscribe(move || {
            if let Some(id) = inner_id.get() {
                inner_notifier.unsubscribe(id);
            }
        })));

        notifier.notify();
        assert_eq!(notifier.listener_count(), 0);
    }
}
