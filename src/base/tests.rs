use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Custom error
    let custom = NetError::CookiePublicSuffix;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -10001);
    assert!(matches!(
        NetError::from(custom_code),
        NetError::CookiePublicSuffix
    ));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_cancelled_uses_aborted_code() {
    assert_eq!(NetError::Cancelled.as_i32(), -3);
    assert!(!NetError::Cancelled.is_transport());
}

#[test]
fn test_transport_classification() {
    assert!(NetError::ConnectionReset.is_transport());
    assert!(NetError::connection_failed("boom").is_transport());
    assert!(!NetError::InvalidUrl.is_transport());
    assert!(!NetError::cookie_store("cache", "down").is_transport());
}

#[test]
fn test_io_error_mapping() {
    use std::io::{Error, ErrorKind};

    let err: NetError = Error::new(ErrorKind::ConnectionRefused, "refused").into();
    assert_eq!(err, NetError::ConnectionRefused);

    let err: NetError = Error::new(ErrorKind::Other, "weird").into();
    assert!(matches!(err, NetError::ConnectionFailed { .. }));
}
