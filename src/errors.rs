use thiserror::Error;

/// Everything that can go wrong while verifying a StoreKit 2 signed
/// transaction. Every variant is terminal for the token being verified;
/// only [`VerificationError::AnchorFetchFailed`] is plausibly transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token is not a three-part `header.payload.signature` JWS.
    #[error("invalid JWS: expected header.payload.signature")]
    MalformedToken,

    /// The header segment is not base64url-encoded JSON.
    #[error("cannot decode JWS header")]
    MalformedHeader,

    /// The `x5c` header field is absent or holds fewer than two certificates.
    #[error("JWS missing certificate chain (x5c header)")]
    MissingCertificateChain,

    /// An `x5c` entry did not parse as a DER-encoded X.509 certificate.
    #[error("cannot parse certificate at chain position {0}")]
    MalformedCertificate(usize),

    /// The certificate at this position is not signed by its successor.
    #[error("certificate chain broken at position {0}")]
    ChainBrokenAt(usize),

    /// The outermost chain certificate is not signed by the pinned root.
    #[error("certificate chain does not trace to Apple Root CA G3")]
    ChainNotTrusted,

    /// A certificate carries a public key this verifier cannot check.
    #[error("unsupported public key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// The signature segment is not the 64-byte R||S form ES256 requires.
    #[error("unexpected ES256 signature length: {0} (expected 64)")]
    BadSignatureLength(usize),

    /// The ES256 signature does not verify under the leaf certificate's key.
    #[error("JWS signature is invalid")]
    InvalidSignature,

    /// The payload segment is not base64url-encoded JSON.
    #[error("cannot decode JWS payload")]
    MalformedPayload,

    /// The pinned root certificate could not be fetched.
    #[error("failed to fetch Apple root certificate: {0}")]
    AnchorFetchFailed(String),

    /// The fetched root certificate does not match the pinned fingerprint.
    /// Indicates a compromised fetch path or a stale pin, not a bad token.
    #[error("Apple root certificate fingerprint mismatch: got {actual}, expected {expected}")]
    AnchorFingerprintMismatch { actual: String, expected: String },
}

impl VerificationError {
    /// Whether retrying the same call could succeed. True only for transport
    /// failures while fetching the trust anchor; every other variant is a
    /// permanent rejection of the token it was returned for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AnchorFetchFailed(_))
    }

    /// Whether the error signals a problem with the verifier's own trust
    /// configuration rather than with the submitted token. Worth alerting on
    /// at the call site instead of being counted as a client error.
    pub fn is_configuration_alarm(&self) -> bool {
        matches!(self, Self::AnchorFingerprintMismatch { .. })
    }
}
