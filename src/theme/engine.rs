use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::signal::{ListenerId, Listeners};
use crate::storage::{KeyValueStore, StorageResult};

use super::appearance::AppearanceSignal;
use super::preference::{load_preference, save_preference, ThemePreference};
use super::tokens::{resolve_color_tokens, ColorTokens, ThemeColors};
use super::{AccentId, Appearance, ThemeMode};

/// Everything a screen needs to paint, resolved together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTheme {
    pub effective_mode: Appearance,
    pub colors: ColorTokens,
    pub accent: AccentId,
    pub current_accent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeOptions {
    pub default_accent: AccentId,
    pub color_overrides: Option<ThemeColors>,
}

pub fn resolve_theme(
    preference: &ThemePreference,
    host: Appearance,
    color_overrides: Option<&ThemeColors>,
) -> ResolvedTheme {
    let effective_mode = preference.mode.resolve(host);
    ResolvedTheme {
        effective_mode,
        colors: resolve_color_tokens(effective_mode, color_overrides),
        accent: preference.accent,
        current_accent: preference.accent.color().to_string(),
    }
}

/// Owns the theme preference and the current resolved snapshot.
///
/// Any input change rebuilds the snapshot and swaps it in whole before
/// listeners run, so every reader in the same update sees one tuple.
pub struct ThemeEngine<S> {
    store: S,
    preference: ThemePreference,
    host_appearance: Appearance,
    options: ThemeOptions,
    snapshot: Rc<ResolvedTheme>,
    notified: Rc<ResolvedTheme>,
    notifying: bool,
    listeners: Listeners<Rc<ResolvedTheme>>,
    unsaved: bool,
}

impl<S: KeyValueStore> ThemeEngine<S> {
    pub fn load(store: S, host_appearance: Appearance, options: ThemeOptions) -> Self {
        let preference = load_preference(&store, options.default_accent);
        let snapshot = Rc::new(resolve_theme(
            &preference,
            host_appearance,
            options.color_overrides.as_ref(),
        ));
        tracing::info!(
            mode = %preference.mode,
            accent = %preference.accent,
            effective_mode = %snapshot.effective_mode,
            "loaded theme preference"
        );
        Self {
            store,
            preference,
            host_appearance,
            options,
            notified: Rc::clone(&snapshot),
            snapshot,
            notifying: false,
            listeners: Listeners::new(),
            unsaved: false,
        }
    }

    pub fn into_shared(self) -> SharedThemeEngine<S> {
        SharedThemeEngine {
            inner: Rc::new(SharedInner {
                engine: RefCell::new(self),
                pending_host: Cell::new(None),
            }),
        }
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    pub fn host_appearance(&self) -> Appearance {
        self.host_appearance
    }

    /// Current snapshot. Cheap: a reference-count bump, no recomputation.
    pub fn resolved(&self) -> Rc<ResolvedTheme> {
        Rc::clone(&self.snapshot)
    }

    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.apply_mode(mode);
        self.notify();
    }

    /// Select an accent by id. Unknown ids fall back to the default accent;
    /// returns the accent actually applied.
    pub fn set_accent(&mut self, accent_id: &str) -> AccentId {
        let accent = self.apply_accent_id(accent_id);
        self.notify();
        accent
    }

    pub fn select_accent(&mut self, accent: AccentId) {
        self.apply_accent(accent);
        self.notify();
    }

    /// Host appearance interrupt. Only affects the snapshot in system mode.
    pub fn set_host_appearance(&mut self, appearance: Appearance) {
        self.apply_host_appearance(appearance);
        self.notify();
    }

    pub fn set_color_overrides(&mut self, overrides: Option<ThemeColors>) {
        self.apply_color_overrides(overrides);
        self.notify();
    }

    /// Register a listener called synchronously with each new snapshot.
    pub fn subscribe(&mut self, listener: impl FnMut(&Rc<ResolvedTheme>) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn flush(&mut self) -> StorageResult<()> {
        let result = save_preference(&self.store, &self.preference);
        self.unsaved = result.is_err();
        result
    }

    fn apply_mode(&mut self, mode: ThemeMode) {
        if self.preference.mode == mode {
            return;
        }
        tracing::info!(from = %self.preference.mode, to = %mode, "theme mode changed");
        self.preference.mode = mode;
        self.refresh();
        self.persist();
    }

    fn apply_accent_id(&mut self, accent_id: &str) -> AccentId {
        let accent = accent_id.parse::<AccentId>().unwrap_or_else(|err| {
            tracing::warn!(%err, fallback = %self.options.default_accent, "unknown accent; using default");
            self.options.default_accent
        });
        self.apply_accent(accent);
        accent
    }

    fn apply_accent(&mut self, accent: AccentId) {
        if self.preference.accent == accent {
            return;
        }
        tracing::info!(
            from = %self.preference.accent,
            to = %accent,
            label = accent.label(),
            "accent changed"
        );
        self.preference.accent = accent;
        self.refresh();
        self.persist();
    }

    fn apply_host_appearance(&mut self, appearance: Appearance) {
        if self.host_appearance == appearance {
            return;
        }
        self.host_appearance = appearance;
        self.refresh();
    }

    fn apply_color_overrides(&mut self, overrides: Option<ThemeColors>) {
        if self.options.color_overrides == overrides {
            return;
        }
        self.options.color_overrides = overrides;
        self.refresh();
    }

    fn refresh(&mut self) {
        let next = resolve_theme(
            &self.preference,
            self.host_appearance,
            self.options.color_overrides.as_ref(),
        );
        if next == *self.snapshot {
            return;
        }
        tracing::debug!(
            effective_mode = %next.effective_mode,
            accent = %next.accent,
            listeners = self.listeners.len(),
            "theme snapshot replaced"
        );
        self.snapshot = Rc::new(next);
    }

    fn notify(&mut self) {
        if Rc::ptr_eq(&self.snapshot, &self.notified) {
            return;
        }
        self.notified = Rc::clone(&self.snapshot);
        self.listeners.emit(&self.notified);
    }

    fn persist(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(?err, "failed to persist theme preference; keeping in-memory choice");
        }
    }
}

impl<S> std::fmt::Debug for ThemeEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("preference", &self.preference)
            .field("host_appearance", &self.host_appearance)
            .field("snapshot", &self.snapshot)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

struct SharedInner<S> {
    engine: RefCell<ThemeEngine<S>>,
    pending_host: Cell<Option<Appearance>>,
}

/// Engine handle shared between the app, screens and host glue.
///
/// Mutators release the engine borrow before listeners run, so a listener may
/// read or change the theme. A change made from inside a listener is
/// delivered to every listener once the current round finishes.
pub struct SharedThemeEngine<S> {
    inner: Rc<SharedInner<S>>,
}

impl<S> Clone for SharedThemeEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SharedThemeEngine<S> {
    /// Read access to the engine. Hold it only briefly: mutators called while
    /// it is alive panic.
    pub fn borrow(&self) -> Ref<'_, ThemeEngine<S>> {
        self.apply_pending_host();
        self.inner.engine.borrow()
    }

    pub fn resolved(&self) -> Rc<ResolvedTheme> {
        self.borrow().resolved()
    }

    pub fn preference(&self) -> ThemePreference {
        self.borrow().preference()
    }

    pub fn host_appearance(&self) -> Appearance {
        self.borrow().host_appearance()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.borrow().has_unsaved_changes()
    }

    pub fn set_mode(&self, mode: ThemeMode) {
        self.update(|engine| engine.apply_mode(mode));
    }

    pub fn set_accent(&self, accent_id: &str) -> AccentId {
        self.update(|engine| engine.apply_accent_id(accent_id))
    }

    pub fn select_accent(&self, accent: AccentId) {
        self.update(|engine| engine.apply_accent(accent));
    }

    pub fn set_host_appearance(&self, appearance: Appearance) {
        self.update(|engine| engine.apply_host_appearance(appearance));
    }

    pub fn set_color_overrides(&self, overrides: Option<ThemeColors>) {
        self.update(|engine| engine.apply_color_overrides(overrides));
    }

    pub fn subscribe(&self, listener: impl FnMut(&Rc<ResolvedTheme>) + 'static) -> ListenerId {
        self.inner.engine.borrow_mut().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.engine.borrow_mut().unsubscribe(id)
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.inner.engine.borrow_mut().flush()
    }

    fn update<R>(&self, change: impl FnOnce(&mut ThemeEngine<S>) -> R) -> R {
        let result = {
            let mut engine = self.inner.engine.borrow_mut();
            if let Some(host) = self.inner.pending_host.take() {
                engine.apply_host_appearance(host);
            }
            change(&mut *engine)
        };
        self.notify();
        result
    }

    /// Deliver the latest snapshot with no borrow held. Re-entrant calls
    /// return at once; the outer round picks up whatever they changed.
    fn notify(&self) {
        {
            let mut engine = self.inner.engine.borrow_mut();
            if engine.notifying {
                return;
            }
            engine.notifying = true;
        }
        loop {
            let (snapshot, mut listeners) = {
                let mut engine = self.inner.engine.borrow_mut();
                if Rc::ptr_eq(&engine.snapshot, &engine.notified) {
                    engine.notifying = false;
                    return;
                }
                engine.notified = Rc::clone(&engine.snapshot);
                (Rc::clone(&engine.snapshot), engine.listeners.detach())
            };
            listeners.emit(&snapshot);
            self.inner.engine.borrow_mut().listeners.reattach(listeners);
        }
    }

    /// Apply a host appearance that arrived while the engine was borrowed.
    fn apply_pending_host(&self) {
        if self.inner.pending_host.get().is_some() && self.inner.engine.try_borrow_mut().is_ok() {
            self.update(|_| ());
        }
    }

    fn defer_host_appearance(&self, appearance: Appearance) {
        tracing::debug!(%appearance, "theme engine busy; deferring host appearance");
        self.inner.pending_host.set(Some(appearance));
    }
}

impl<S> std::fmt::Debug for SharedThemeEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedThemeEngine")
            .field("engine", &self.inner.engine)
            .field("pending_host", &self.inner.pending_host.get())
            .finish()
    }
}

/// Forward host appearance changes from `signal` into `engine`.
///
/// The engine is held weakly; once it is dropped the listener does nothing.
/// A change that arrives while the engine is borrowed is applied on the next
/// access through the shared handle.
pub fn connect_appearance<S: KeyValueStore + 'static>(
    engine: &SharedThemeEngine<S>,
    signal: &mut AppearanceSignal,
) -> ListenerId {
    engine.set_host_appearance(signal.current());

    let weak = Rc::downgrade(&engine.inner);
    signal.subscribe(move |appearance| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let engine = SharedThemeEngine { inner };
        if engine.inner.engine.try_borrow_mut().is_err() {
            engine.defer_host_appearance(*appearance);
            return;
        }
        engine.set_host_appearance(*appearance);
    })
}
