//! Tracing setup. `RUST_LOG` wins over the `-v`/`-q` derived level.

use crate::config::Verbosity;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter for `verbosity` unless `RUST_LOG` is set
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()))
}

/// Install a stderr subscriber; later calls are no-ops
pub fn init_logging(verbosity: Verbosity, colors: bool) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_verbose())
        .with_ansi(colors)
        .without_time();

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(layer)
        .try_init()
    {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_a_no_op() {
        init_logging(Verbosity::Normal, false);
        init_logging(Verbosity::Debug, true);
        assert!(tracing::dispatcher::has_been_set());
    }
}
