use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to stderr so it never mixes
/// with the break lines printed on stdout. `RUST_LOG` is only honoured when
/// debug logging is requested.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_is_harmless() {
        super::init(false);
        super::init(true);
        tracing::info!("logging initialised");
    }
}
