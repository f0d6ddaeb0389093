use env_logger;

/// Default filter for a verbosity level (0=warn, 1=info, 2=debug, 3+=trace)
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "fdsync=warn",
        1 => "fdsync=info",
        2 => "fdsync=debug",
        _ => "fdsync=trace",
    }
}

/// Initialize the logger with the specified verbosity level
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn setup_logger(verbose: u8) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(verbose)),
    )
    .format_timestamp(None)
    .format_module_path(false)
    .format_target(false)
    .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(0), "fdsync=warn");
        assert_eq!(default_filter(1), "fdsync=info");
        assert_eq!(default_filter(2), "fdsync=debug");
        assert_eq!(default_filter(7), "fdsync=trace");
    }
}
