use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn,mailport=info",
        1 => "info,mailport=debug",
        _ => "info,mailport=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}
