//! Host environments for Quetzal components.
//!
//! - [`headless`]: in-memory document plus a single-threaded task queue.
//!   Used by tests, tooling, and server-side rendering.
//! - `web` (feature `web`, `wasm32` only): real shadow roots through `web-sys`.

pub mod headless;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use headless::{Failure, Headless, HeadlessOptions};

/// Env var read by [`init_logging`].
pub const LOG_ENV: &str = "QUETZAL_LOG";

/// Installs `env_logger`, filtered by `QUETZAL_LOG` or `default_filter`.
/// Safe to call more than once.
pub fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().filter_or(LOG_ENV, default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

/// `Display` for an error and its sources, `outer: inner: ...`.
pub(crate) fn describe(error: &quetzal_core::Error) -> String {
    anyhow::Chain::new(error)
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
