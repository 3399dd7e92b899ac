use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber: `RUST_LOG` when set, `cashbook=info`
/// otherwise. Output goes to stderr so command output stays pipeable.
pub(crate) fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cashbook=info"));

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialized");
    }
}
