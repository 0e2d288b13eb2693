use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a verbosity level
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "gitmt=warn",
        1 => "gitmt=info",
        _ => "gitmt=debug",
    }
}

/// Initializes logging to stderr; `RUST_LOG` takes precedence over `-v`
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbosity).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "gitmt=warn");
        assert_eq!(default_directive(1), "gitmt=info");
        assert_eq!(default_directive(5), "gitmt=debug");
    }
}
