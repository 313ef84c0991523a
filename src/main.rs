use anyhow::Context;
use shotlog::router::AuthState;

fn main() -> anyhow::Result<()> {
    let signed_in = std::env::args().skip(1).any(|arg| arg == "--signed-in");
    let auth = AuthState {
        is_loaded: true,
        is_signed_in: signed_in,
    };
    let route = shotlog::run(auth).context("failed to start shotlog")?;
    println!("{}", route.screen_name());
    Ok(())
}
