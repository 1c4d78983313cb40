//! Process-level observability shared by the storefront and admin binaries.
//!
//! Sentry must be initialized before [`init_tracing`] so the Sentry tracing
//! layer has a client to report to.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Filter directives (overrides the binary's default filter)
//! - `LOG_FORMAT` - `json` for JSON lines, anything else for text

use std::borrow::Cow;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry when a DSN is configured.
///
/// The returned guard flushes pending events on drop and must be kept alive
/// for the life of the process. Pass `sentry::release_name!()` from the
/// binary so the release names the binary's crate.
#[must_use]
pub fn init_sentry(
    dsn: Option<&str>,
    environment: Option<&str>,
    release: Option<Cow<'static, str>>,
) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release,
            environment: environment.map(|e| Cow::Owned(e.to_owned())),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events, info and debug breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn json_logs(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

/// Install the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json = json_logs(std::env::var("LOG_FORMAT").ok().as_deref());
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Resolve on Ctrl+C or SIGTERM.
///
/// # Panics
///
/// Panics if the signal handlers cannot be installed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_selection() {
        assert!(json_logs(Some("json")));
        assert!(json_logs(Some(" JSON ")));
        assert!(!json_logs(Some("text")));
        assert!(!json_logs(None));
    }

    #[test]
    fn test_init_sentry_without_dsn() {
        assert!(init_sentry(None, Some("test"), None).is_none());
    }
}
