use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use openssl::{bn::BigNum, ecdsa::EcdsaSig};

use crate::errors::VerificationError;

/// base64url engine accepting segments with or without trailing padding.
/// JWS segments are unpadded per RFC 7515, but padded input shows up too.
const BASE64_URL_TOLERANT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes one base64url JWS segment.
pub(crate) fn decode_base64url_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_URL_TOLERANT.decode(segment)
}

/// Converts a raw JWS ES256 signature (R and S as 32-byte big-endian
/// unsigned integers) into the DER `SEQUENCE { INTEGER r, INTEGER s }`
/// structure that X.509 verification primitives expect.
pub(crate) fn ecdsa_sig_from_raw(raw: &[u8]) -> Result<EcdsaSig, VerificationError> {
    if raw.len() != 64 {
        return Err(VerificationError::BadSignatureLength(raw.len()));
    }
    let r = BigNum::from_slice(&raw[..32]).map_err(|_| VerificationError::InvalidSignature)?;
    let s = BigNum::from_slice(&raw[32..]).map_err(|_| VerificationError::InvalidSignature)?;
    EcdsaSig::from_private_components(r, s).map_err(|_| VerificationError::InvalidSignature)
}
