mod bootstrap;

use std::rc::Rc;

use crate::onboarding::OnboardingController;
use crate::router::{initial_route, AuthState, Route};
use crate::storage::KeyValueStore;
use crate::theme::{
    connect_appearance, Appearance, AppearanceSignal, SharedThemeEngine, ThemeEngine,
    ThemeOptions,
};

pub use bootstrap::{bootstrap_app_runtime, AppBootstrap};

/// Process-wide owner of the onboarding controller and theme engine.
///
/// Both share one store handle. Screens receive references from here rather
/// than reaching for globals, so tests build isolated instances.
pub struct App<S> {
    onboarding: OnboardingController<Rc<S>>,
    theme: SharedThemeEngine<Rc<S>>,
    appearance: AppearanceSignal,
}

impl<S: KeyValueStore + 'static> App<S> {
    pub fn new(store: S, host_appearance: Appearance, theme_options: ThemeOptions) -> Self {
        let store = Rc::new(store);
        let onboarding = OnboardingController::load(Rc::clone(&store));
        let theme = ThemeEngine::load(Rc::clone(&store), host_appearance, theme_options).into_shared();
        let mut appearance = AppearanceSignal::new(host_appearance);
        connect_appearance(&theme, &mut appearance);

        Self {
            onboarding,
            theme,
            appearance,
        }
    }

    pub fn onboarding(&self) -> &OnboardingController<Rc<S>> {
        &self.onboarding
    }

    pub fn onboarding_mut(&mut self) -> &mut OnboardingController<Rc<S>> {
        &mut self.onboarding
    }

    pub fn theme(&self) -> &SharedThemeEngine<Rc<S>> {
        &self.theme
    }

    /// Platform glue pushes OS appearance changes through this signal.
    pub fn appearance_mut(&mut self) -> &mut AppearanceSignal {
        &mut self.appearance
    }

    pub fn initial_route(&self, auth: AuthState) -> Route {
        initial_route(auth, &self.onboarding)
    }
}
