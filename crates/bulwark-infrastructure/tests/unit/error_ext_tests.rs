//! Error context extension

use bulwark_infrastructure::error_ext::ErrorContext;
use std::io;

fn io_failure() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::NotFound, "missing file"))
}

#[test]
fn test_context_produces_internal_error() {
    let err = io_failure().context("Failed to open").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Failed to open"));
    assert!(message.contains("missing file"));
    assert!(!err.is_configuration());
    assert!(!err.is_store());
}

#[test]
fn test_with_context_is_lazy_and_formats() {
    let ok: Result<u8, io::Error> = Ok(7);
    let value = ok
        .with_context(|| -> String { panic!("context built for a success") })
        .unwrap();
    assert_eq!(value, 7);

    let err = io_failure()
        .with_context(|| format!("Reading {}", "bulwark.toml"))
        .unwrap_err();
    assert!(err.to_string().contains("Reading bulwark.toml"));
}

#[test]
fn test_config_context_keeps_the_source() {
    let err = io_failure().config_context("Bad config").unwrap_err();
    assert!(err.is_configuration());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_store_context_marks_store_errors() {
    let err = io_failure().store_context("Redis GET").unwrap_err();
    assert!(err.is_store());
    assert!(err.to_string().contains("Redis GET"));
}
