use crate::signal::{ListenerId, Listeners};

use super::Appearance;

/// Observable host appearance. Platform glue calls `set` when the OS scheme
/// changes; listeners only fire on an actual change.
#[derive(Debug, Default)]
pub struct AppearanceSignal {
    current: Appearance,
    listeners: Listeners<Appearance>,
}

impl AppearanceSignal {
    pub fn new(initial: Appearance) -> Self {
        Self {
            current: initial,
            listeners: Listeners::new(),
        }
    }

    pub fn current(&self) -> Appearance {
        self.current
    }

    pub fn set(&mut self, appearance: Appearance) {
        if self.current == appearance {
            return;
        }
        tracing::debug!(from = %self.current, to = %appearance, "host appearance changed");
        self.current = appearance;
        self.listeners.emit(&appearance);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Appearance) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = AppearanceSignal::new(Appearance::Light);
        let sink = Rc::clone(&seen);
        signal.subscribe(move |appearance| sink.borrow_mut().push(*appearance));

        signal.set(Appearance::Light);
        signal.set(Appearance::Dark);
        signal.set(Appearance::Dark);

        assert_eq!(*seen.borrow(), vec![Appearance::Dark]);
        assert_eq!(signal.current(), Appearance::Dark);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let seen = Rc::new(RefCell::new(0));
        let mut signal = AppearanceSignal::new(Appearance::Dark);
        let sink = Rc::clone(&seen);
        let id = signal.subscribe(move |_| *sink.borrow_mut() += 1);

        assert!(signal.unsubscribe(id));
        signal.set(Appearance::Light);
        assert_eq!(*seen.borrow(), 0);
    }
}
