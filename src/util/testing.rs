//! Shared tracing setup for unit and integration tests.
//!
//! Tests log to stderr so `cargo test -- --nocapture` shows layout passes,
//! reconcile transitions and fit flips. `RUST_LOG` overrides the default
//! filter, which keeps only this crate's events at debug level.

use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "mindmap=debug";

/// Dependency targets that drown out engine spans at debug level.
const NOISY_TARGETS: [&str; 2] = ["config", "tempfile"];

static TEST_SETUP: Once = Once::new();

/// Install the test subscriber once per test binary.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("test logging ready");
    });
}

fn setup_test_logging() {
    let module_filter = filter_fn(|metadata| {
        !NOISY_TARGETS
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // another harness may already own the global dispatcher
    if tracing::dispatcher::has_been_set() {
        debug!("tracing subscriber already installed");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("failed to install test subscriber: {e}");
    }
}
