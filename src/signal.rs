use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Entry<T> = (ListenerId, Box<dyn FnMut(&T)>);

/// Ordered set of callbacks invoked synchronously on `emit`.
pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
    detached: Vec<ListenerId>,
}

/// Callbacks moved out of a [`Listeners`] so they can run while its owner
/// is free to be borrowed again.
pub struct DetachedListeners<T> {
    entries: Vec<Entry<T>>,
}

impl<T> DetachedListeners<T> {
    pub fn emit(&mut self, value: &T) {
        for (_, listener) in &mut self.entries {
            listener(value);
        }
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
            detached: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Removing a detached listener takes effect when it is reattached.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len() + self.detached.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.detached.retain(|entry| *entry != id);
        self.entries.len() + self.detached.len() != before
    }

    /// Call every listener in registration order.
    pub fn emit(&mut self, value: &T) {
        for (_, listener) in &mut self.entries {
            listener(value);
        }
    }

    /// Move the callbacks out. Ids keep counting, so listeners added before
    /// `reattach` never collide with detached ones.
    pub fn detach(&mut self) -> DetachedListeners<T> {
        let entries = std::mem::take(&mut self.entries);
        self.detached.extend(entries.iter().map(|(id, _)| *id));
        DetachedListeners { entries }
    }

    /// Put detached callbacks back ahead of any added in the meantime,
    /// dropping those removed while they were out.
    pub fn reattach(&mut self, detached: DetachedListeners<T>) {
        let added = std::mem::take(&mut self.entries);
        let kept = &self.detached;
        let mut entries: Vec<Entry<T>> = detached
            .entries
            .into_iter()
            .filter(|(id, _)| kept.contains(id))
            .collect();
        let returned: Vec<ListenerId> = entries.iter().map(|(id, _)| *id).collect();
        self.detached.retain(|id| !returned.contains(id));
        entries.extend(added);
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
