pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod onboarding;
pub mod router;
pub mod signal;
pub mod storage;
pub mod theme;
pub use error::{AppError, AppResult};

use router::{AuthState, Route};

/// Entrypoint used by host integrations: load persisted state and pick the first screen.
pub fn run(auth: AuthState) -> AppResult<Route> {
    logging::init();
    tracing::info!("starting shotlog");

    let bootstrap = app::bootstrap_app_runtime()?;
    let app = app::App::new(
        bootstrap.store,
        bootstrap.host_appearance,
        bootstrap.theme_options,
    );
    let route = app.initial_route(auth);
    let theme = app.theme().resolved();

    tracing::info!(
        route = %route.screen_name(),
        effective_mode = %theme.effective_mode,
        accent = %theme.accent,
        "startup complete"
    );
    Ok(route)
}
