use crate::onboarding::{OnboardingController, StepId};
use crate::storage::KeyValueStore;

/// Snapshot of the authentication provider at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState {
    pub is_loaded: bool,
    pub is_signed_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Splash,
    Onboarding(StepId),
    SignIn,
    Home,
}

impl Route {
    pub fn screen_name(self) -> String {
        match self {
            Self::Splash => "splash".to_string(),
            Self::Onboarding(step) => step.screen_name(),
            Self::SignIn => "sign-in".to_string(),
            Self::Home => "home".to_string(),
        }
    }
}

/// One-shot choice of the first screen group.
pub fn initial_route<S: KeyValueStore>(
    auth: AuthState,
    onboarding: &OnboardingController<S>,
) -> Route {
    let route = if !auth.is_loaded {
        Route::Splash
    } else if auth.is_signed_in {
        Route::Home
    } else {
        match onboarding.current_step() {
            Ok(step) if !onboarding.is_completed() => Route::Onboarding(step.id),
            _ => Route::SignIn,
        }
    };
    tracing::debug!(?auth, ?route, "initial route chosen");
    route
}
