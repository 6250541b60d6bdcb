use std::time::Duration;

/// Apple Root CA G3, the ECDSA P-384 root that anchors StoreKit transaction
/// signing certificates:
/// https://www.apple.com/certificateauthority/
pub(crate) const APPLE_ROOT_CA_G3_URL: &str =
    "https://www.apple.com/certificateauthority/AppleRootCA-G3.cer";

/// SHA-256 fingerprint (lowercase hex) the fetched root certificate must
/// match before it is ever used as a trust anchor.
pub(crate) const APPLE_ROOT_CA_G3_SHA256: &str =
    "63343abfb89a6a03ebb57e2b7b5338e9725e932753e2c18ce075d42cc6fa5870";

pub(crate) const ROOT_CA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
