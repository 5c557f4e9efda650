use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Output is JSON with the current span attached; `LOG_FORMAT=compact` switches
/// to single-line text for local runs. Later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if compact_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        registry.with(fmt::layer().compact()).try_init()
    } else {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    };
}

fn compact_requested(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("compact"))
}
