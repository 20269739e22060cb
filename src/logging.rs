use tracing_subscriber::EnvFilter;

/// Console logging on stderr; stdout carries command output. `RUST_LOG`
/// overrides the default `rpe_dashboard=info` filter.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "rpe_dashboard=debug"
    } else {
        "rpe_dashboard=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(false);
        init_logging(true);
        tracing::info!("logging initialised twice");
    }
}
