//! Integration tests for logging system

use core_runtime::logging::{
    default_filter_directives, init_logging, strip_path, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Json);
}

#[test]
fn test_level_ordering() {
    assert!(LogLevel::Trace < LogLevel::Debug);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(LogLevel::default(), LogLevel::Info);
}

#[test]
fn test_default_filter_quiets_transport() {
    let directives = default_filter_directives(LogLevel::Info);
    for quiet in ["h2=warn", "hyper=warn", "reqwest=warn"] {
        assert!(directives.contains(quiet), "missing {}", quiet);
    }
    assert!(directives.contains("core_service=info"));
}

#[test]
fn test_init_logging_once() {
    // Global subscriber: only the first installation in this process succeeds.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());

    tracing::warn!(error_kind = "timeout", "logged after init");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/docs/nfe.xml"), "nfe.xml");
    assert_eq!(strip_path("D:\\scans\\receipt.jpg"), "receipt.jpg");
    assert_eq!(strip_path(""), "");
}
