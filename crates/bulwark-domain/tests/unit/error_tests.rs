//! Error classification

use bulwark_domain::Error;

#[test]
fn test_configuration_class() {
    assert!(Error::configuration("bad url").is_configuration());
    assert!(Error::unknown_job("missing").is_configuration());
    assert!(Error::DuplicateJob { name: "x".into() }.is_configuration());
    assert!(!Error::store("down").is_configuration());
}

#[test]
fn test_store_class_and_display() {
    let err = Error::store_with_source(
        "Redis GET failed",
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
    );
    assert!(err.is_store());
    assert_eq!(err.to_string(), "Backing store error: Redis GET failed");
    assert!(std::error::Error::source(&err).is_some());
}
