use std::fmt;

use openssl::{
    ec::EcKey,
    error::ErrorStack,
    hash::MessageDigest,
    pkey::{Id, PKey, Public},
    rsa::Rsa,
    x509::X509,
};

use crate::errors::VerificationError;

/// An X.509 certificate parsed from DER, either an `x5c` chain entry or the
/// pinned Apple root. Immutable once parsed; exposes only the operations
/// chain validation needs.
#[derive(Clone)]
pub struct Certificate {
    inner: X509,
}

/// Public key material of a certificate, tagged by algorithm.
///
/// Key types outside this set are rejected with
/// [`VerificationError::UnsupportedKeyAlgorithm`] instead of being handed to
/// a verification primitive.
pub enum CertificatePublicKey {
    /// Elliptic-curve key; the curve identifier travels with the key.
    EllipticCurve(EcKey<Public>),
    /// RSA key; modulus and exponent travel with the key.
    Rsa(Rsa<Public>),
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, ErrorStack> {
        Ok(Self {
            inner: X509::from_der(der)?,
        })
    }

    /// SHA-256 fingerprint of the certificate's DER encoding, lowercase hex.
    pub fn sha256_fingerprint(&self) -> Result<String, ErrorStack> {
        Ok(hex::encode(self.inner.digest(MessageDigest::sha256())?))
    }

    /// The certificate's public key, tagged by algorithm.
    pub fn public_key(&self) -> Result<CertificatePublicKey, VerificationError> {
        let pkey = self
            .inner
            .public_key()
            .map_err(|e| VerificationError::UnsupportedKeyAlgorithm(e.to_string()))?;
        match pkey.id() {
            Id::EC => Ok(CertificatePublicKey::EllipticCurve(
                pkey.ec_key().map_err(|_| unsupported(pkey.id()))?,
            )),
            Id::RSA => Ok(CertificatePublicKey::Rsa(
                pkey.rsa().map_err(|_| unsupported(pkey.id()))?,
            )),
            other => Err(unsupported(other)),
        }
    }

    /// Checks that this certificate's signature was produced by `issuer`'s
    /// key over this certificate's to-be-signed bytes, using the hash
    /// algorithm this certificate declares. EC issuer keys verify via ECDSA,
    /// RSA issuer keys via PKCS#1 v1.5; any other issuer key type is an
    /// error.
    ///
    /// Fail closed: any failure of the underlying primitive is `Ok(false)`,
    /// never silently treated as valid.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<bool, VerificationError> {
        let issuer_key = match issuer.public_key()? {
            CertificatePublicKey::EllipticCurve(key) => PKey::from_ec_key(key),
            CertificatePublicKey::Rsa(key) => PKey::from_rsa(key),
        };
        match issuer_key {
            Ok(key) => Ok(self.inner.verify(&key).unwrap_or(false)),
            Err(_) => Ok(false),
        }
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fingerprint = self
            .sha256_fingerprint()
            .unwrap_or_else(|_| "<undigestable>".to_string());
        f.debug_tuple("Certificate").field(&fingerprint).finish()
    }
}

fn unsupported(id: Id) -> VerificationError {
    VerificationError::UnsupportedKeyAlgorithm(format!("{:?}", id))
}

/// The certificate chain embedded in a JWS `x5c` header.
///
/// Index 0 is the leaf that signed the token; the last entry is the chain
/// root submitted by the client, which is still one hop below the pinned
/// Apple root (the root itself is never part of the chain). The token parser
/// guarantees at least two entries.
#[derive(Clone)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    pub(crate) fn new(certs: Vec<Certificate>) -> Self {
        debug_assert!(certs.len() >= 2);
        Self { certs }
    }

    /// The certificate whose key signed the token.
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    /// The client-submitted chain root, to be checked against the anchor.
    pub fn outermost(&self) -> &Certificate {
        &self.certs[self.certs.len() - 1]
    }

    pub fn certs(&self) -> &[Certificate] {
        &self.certs
    }
}
