use serde::Deserialize;

/// Data structure for the JOSE header of a StoreKit 2 signed transaction.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwsdecodedheader
///
/// Only the fields the verifier consumes are modeled. The `x5c` entries are
/// standard-base64 (not url-safe) DER certificates, leaf first.
#[derive(Debug, Deserialize)]
pub(crate) struct JwsHeaderModel {
    /// The certificate chain used to sign the token. An absent field is
    /// treated the same as an empty chain.
    #[serde(default)]
    pub(crate) x5c: Vec<String>,
}
