use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use openssl::hash::{hash, MessageDigest};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    data::{
        datasources::{
            trust_anchor_datasource::{
                TrustAnchorCache, TrustAnchorDatasource, TrustAnchorDatasourceImpl,
            },
            utils::{decode_base64url_segment, ecdsa_sig_from_raw},
        },
        models::jws_header_model::JwsHeaderModel,
    },
    domain::{
        entities::{
            certificate::{Certificate, CertificateChain, CertificatePublicKey},
            verified_transaction::VerifiedTransaction,
        },
        repositories::jws_transaction_repository::JwsTransactionRepository,
    },
    errors::VerificationError,
};

pub(crate) struct JwsTransactionRepositoryImpl<A: TrustAnchorDatasource> {
    trust_anchor_cache: TrustAnchorCache<A>,
}

#[async_trait]
impl<A: TrustAnchorDatasource> JwsTransactionRepository for JwsTransactionRepositoryImpl<A> {
    /// Verification pipeline:
    ///   1. Split the token and decode the x5c chain from its header.
    ///   2. Verify each chain certificate against its successor.
    ///   3. Verify the outermost certificate against the pinned root.
    ///   4. Verify the ES256 token signature with the leaf's public key.
    ///   5. Decode and return the payload.
    /// Any stage failure short-circuits with that stage's error.
    async fn verify_transaction(
        &self,
        token: &str,
    ) -> Result<VerifiedTransaction, VerificationError> {
        let (header_b64, payload_b64, signature_b64) = split_segments(token)?;
        let chain = parse_certificate_chain(header_b64)?;
        let anchor = self.trust_anchor_cache.get_trust_anchor().await?;
        validate_chain(&chain, anchor)?;
        verify_token_signature(header_b64, payload_b64, signature_b64, chain.leaf())?;
        let claims = decode_payload(payload_b64)?;
        debug!("StoreKit transaction verified");
        Ok(VerifiedTransaction::new(claims))
    }
}

impl JwsTransactionRepositoryImpl<TrustAnchorDatasourceImpl> {
    pub(crate) fn new() -> Self {
        Self {
            trust_anchor_cache: TrustAnchorCache::new(),
        }
    }
}

#[cfg(test)]
impl<A: TrustAnchorDatasource> JwsTransactionRepositoryImpl<A> {
    pub(crate) fn with_trust_anchor_cache(trust_anchor_cache: TrustAnchorCache<A>) -> Self {
        Self { trust_anchor_cache }
    }
}

/// Splits a compact JWS into its three dot-separated segments.
fn split_segments(token: &str) -> Result<(&str, &str, &str), VerificationError> {
    let mut segments = token.split('.');
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => Err(VerificationError::MalformedToken),
    }
}

/// Decodes the JWS header and parses its `x5c` field into a certificate
/// chain. The chain must hold at least the leaf and one intermediate; the
/// pinned root is never part of it.
fn parse_certificate_chain(header_b64: &str) -> Result<CertificateChain, VerificationError> {
    let header_bytes =
        decode_base64url_segment(header_b64).map_err(|_| VerificationError::MalformedHeader)?;
    let header: JwsHeaderModel =
        serde_json::from_slice(&header_bytes).map_err(|_| VerificationError::MalformedHeader)?;
    if header.x5c.len() < 2 {
        return Err(VerificationError::MissingCertificateChain);
    }
    let certs = header
        .x5c
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let der = STANDARD
                .decode(entry)
                .map_err(|_| VerificationError::MalformedCertificate(i))?;
            Certificate::from_der(&der).map_err(|_| VerificationError::MalformedCertificate(i))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CertificateChain::new(certs))
}

/// Walks the chain leaf-first, checking every certificate against its
/// successor, then checks the outermost certificate against the anchor.
fn validate_chain(chain: &CertificateChain, anchor: &Certificate) -> Result<(), VerificationError> {
    for (i, pair) in chain.certs().windows(2).enumerate() {
        if !pair[0].verify_signed_by(&pair[1])? {
            return Err(VerificationError::ChainBrokenAt(i));
        }
    }
    if !chain.outermost().verify_signed_by(anchor)? {
        return Err(VerificationError::ChainNotTrusted);
    }
    Ok(())
}

/// Verifies the token's ES256 signature against the leaf certificate.
///
/// The signing input is the two original base64url segments joined by a
/// literal dot, not their decoded bytes.
fn verify_token_signature(
    header_b64: &str,
    payload_b64: &str,
    signature_b64: &str,
    leaf: &Certificate,
) -> Result<(), VerificationError> {
    let raw_signature =
        decode_base64url_segment(signature_b64).map_err(|_| VerificationError::InvalidSignature)?;
    let signature = ecdsa_sig_from_raw(&raw_signature)?;
    let leaf_key = match leaf.public_key()? {
        CertificatePublicKey::EllipticCurve(key) => key,
        CertificatePublicKey::Rsa(_) => {
            return Err(VerificationError::UnsupportedKeyAlgorithm(
                "RSA leaf key (ES256 requires P-256)".to_string(),
            ))
        }
    };
    let signing_input = format!("{header_b64}.{payload_b64}");
    let digest = hash(MessageDigest::sha256(), signing_input.as_bytes())
        .map_err(|_| VerificationError::InvalidSignature)?;
    match signature.verify(&digest, &leaf_key) {
        Ok(true) => Ok(()),
        // Fail closed: primitive errors count as verification failure.
        Ok(false) | Err(_) => Err(VerificationError::InvalidSignature),
    }
}

/// Decodes the payload segment into its claims map.
fn decode_payload(payload_b64: &str) -> Result<Map<String, Value>, VerificationError> {
    let payload_bytes =
        decode_base64url_segment(payload_b64).map_err(|_| VerificationError::MalformedPayload)?;
    match serde_json::from_slice(&payload_bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        _ => Err(VerificationError::MalformedPayload),
    }
}
