//! Test-only helpers: a generated PKI mirroring Apple's chain shape (P-384
//! root, P-256 intermediate and leaf), ES256 JWS signing, and trust-anchor
//! datasource doubles.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use openssl::{
    asn1::{Asn1Integer, Asn1Time},
    bn::BigNum,
    ec::{EcGroup, EcKey},
    ecdsa::EcdsaSig,
    hash::{hash, MessageDigest},
    nid::Nid,
    pkey::{PKey, Private},
    x509::{X509Name, X509},
};

use crate::{
    data::datasources::trust_anchor_datasource::TrustAnchorDatasource, errors::VerificationError,
};

pub(crate) struct TestAuthority {
    pub(crate) key: PKey<Private>,
    pub(crate) cert: X509,
}

pub(crate) struct TestPki {
    pub(crate) root: TestAuthority,
    pub(crate) intermediate: TestAuthority,
    pub(crate) leaf: TestAuthority,
}

pub(crate) fn p256_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

pub(crate) fn p384_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::SECP384R1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Issues a certificate for `key`, signed by `issuer_key`.
pub(crate) fn issue_cert(
    subject_cn: &str,
    key: &PKey<Private>,
    issuer_cn: &str,
    issuer_key: &PKey<Private>,
    digest: MessageDigest,
) -> X509 {
    let mut subject = X509Name::builder().unwrap();
    subject.append_entry_by_text("CN", subject_cn).unwrap();
    let subject = subject.build();
    let mut issuer = X509Name::builder().unwrap();
    issuer.append_entry_by_text("CN", issuer_cn).unwrap();
    let issuer = issuer.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = Asn1Integer::from_bn(&BigNum::from_u32(1).unwrap()).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&subject).unwrap();
    builder.set_issuer_name(&issuer).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(issuer_key, digest).unwrap();
    builder.build()
}

/// A self-signed P-384 root, the shape of Apple Root CA G3.
pub(crate) fn self_signed(cn: &str) -> TestAuthority {
    let key = p384_key();
    let cert = issue_cert(cn, &key, cn, &key, MessageDigest::sha384());
    TestAuthority { key, cert }
}

pub(crate) fn test_pki() -> TestPki {
    let root = self_signed("Test Root CA");
    let intermediate_key = p256_key();
    let intermediate_cert = issue_cert(
        "Test Intermediate CA",
        &intermediate_key,
        "Test Root CA",
        &root.key,
        MessageDigest::sha384(),
    );
    let leaf_key = p256_key();
    let leaf_cert = issue_cert(
        "Test Leaf",
        &leaf_key,
        "Test Intermediate CA",
        &intermediate_key,
        MessageDigest::sha256(),
    );
    TestPki {
        root,
        intermediate: TestAuthority {
            key: intermediate_key,
            cert: intermediate_cert,
        },
        leaf: TestAuthority {
            key: leaf_key,
            cert: leaf_cert,
        },
    }
}

pub(crate) fn sha256_fingerprint(cert: &X509) -> String {
    hex::encode(cert.digest(MessageDigest::sha256()).unwrap())
}

pub(crate) fn b64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Builds a compact JWS over `payload`, signed ES256 with `signing_key` and
/// carrying `chain` as the `x5c` header, leaf first.
pub(crate) fn sign_token(
    payload: &serde_json::Value,
    chain: &[&X509],
    signing_key: &PKey<Private>,
) -> String {
    let x5c: Vec<String> = chain
        .iter()
        .map(|cert| STANDARD.encode(cert.to_der().unwrap()))
        .collect();
    let header = serde_json::json!({ "alg": "ES256", "x5c": x5c });
    sign_token_segments(
        &b64url(header.to_string().as_bytes()),
        &b64url(payload.to_string().as_bytes()),
        signing_key,
    )
}

/// Signs pre-encoded header and payload segments, producing the raw 64-byte
/// R||S signature form JWS uses.
pub(crate) fn sign_token_segments(
    header_b64: &str,
    payload_b64: &str,
    signing_key: &PKey<Private>,
) -> String {
    let signing_input = format!("{header_b64}.{payload_b64}");
    let digest = hash(MessageDigest::sha256(), signing_input.as_bytes()).unwrap();
    let ec_key = signing_key.ec_key().unwrap();
    let signature = EcdsaSig::sign(&digest, &ec_key).unwrap();
    let mut raw = [0u8; 64];
    let r = signature.r().to_vec();
    let s = signature.s().to_vec();
    raw[32 - r.len()..32].copy_from_slice(&r);
    raw[64 - s.len()..].copy_from_slice(&s);
    format!("{signing_input}.{}", b64url(&raw))
}

/// Serves a fixed DER blob, counting fetches.
pub(crate) struct StaticTrustAnchorDatasource {
    der: Vec<u8>,
    fetches: Arc<AtomicUsize>,
}

impl StaticTrustAnchorDatasource {
    pub(crate) fn new(der: Vec<u8>) -> Self {
        Self {
            der,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the fetch counter, usable after the datasource has been
    /// moved into a cache.
    pub(crate) fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl TrustAnchorDatasource for StaticTrustAnchorDatasource {
    async fn fetch_root_der(&self) -> Result<Vec<u8>, VerificationError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.der.clone())
    }
}

/// Always fails with a transport error.
pub(crate) struct FailingTrustAnchorDatasource;

#[async_trait]
impl TrustAnchorDatasource for FailingTrustAnchorDatasource {
    async fn fetch_root_der(&self) -> Result<Vec<u8>, VerificationError> {
        Err(VerificationError::AnchorFetchFailed(
            "connection refused".to_string(),
        ))
    }
}

/// Fails the first fetch, then serves the DER blob.
pub(crate) struct FlakyTrustAnchorDatasource {
    der: Vec<u8>,
    attempts: AtomicUsize,
}

impl FlakyTrustAnchorDatasource {
    pub(crate) fn new(der: Vec<u8>) -> Self {
        Self {
            der,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TrustAnchorDatasource for FlakyTrustAnchorDatasource {
    async fn fetch_root_der(&self) -> Result<Vec<u8>, VerificationError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(VerificationError::AnchorFetchFailed(
                "connection reset by peer".to_string(),
            ))
        } else {
            Ok(self.der.clone())
        }
    }
}
