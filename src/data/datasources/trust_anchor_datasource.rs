use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    constants::{APPLE_ROOT_CA_G3_SHA256, APPLE_ROOT_CA_G3_URL, ROOT_CA_FETCH_TIMEOUT},
    domain::entities::certificate::Certificate,
    errors::VerificationError,
};

#[async_trait]
pub(crate) trait TrustAnchorDatasource: Send + Sync {
    /// Fetches the DER bytes of the pinned root certificate.
    async fn fetch_root_der(&self) -> Result<Vec<u8>, VerificationError>;
}

pub(crate) struct TrustAnchorDatasourceImpl;

#[async_trait]
impl TrustAnchorDatasource for TrustAnchorDatasourceImpl {
    async fn fetch_root_der(&self) -> Result<Vec<u8>, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(ROOT_CA_FETCH_TIMEOUT)
            .build()
            .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?;
        let response = client
            .get(APPLE_ROOT_CA_G3_URL)
            .send()
            .await
            .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl TrustAnchorDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

/// Process-lifetime cache of the pinned Apple root certificate.
///
/// The first caller triggers the network fetch; callers arriving while that
/// fetch is in flight wait on it instead of issuing their own, so at most
/// one fetch is in flight at any time. The certificate is cached only after
/// its SHA-256 fingerprint matches the pin, and once cached is never
/// refreshed. A failed or rejected fetch leaves the cache empty; the next
/// caller starts the fetch over.
pub(crate) struct TrustAnchorCache<A: TrustAnchorDatasource> {
    datasource: A,
    expected_sha256: String,
    anchor: OnceCell<Certificate>,
}

impl TrustAnchorCache<TrustAnchorDatasourceImpl> {
    pub(crate) fn new() -> Self {
        Self::with_pin(TrustAnchorDatasourceImpl::new(), APPLE_ROOT_CA_G3_SHA256)
    }
}

impl<A: TrustAnchorDatasource> TrustAnchorCache<A> {
    /// The pin is a constructor argument only so tests can seed a generated
    /// root; production code always goes through `new()` and the hard
    /// constants.
    pub(crate) fn with_pin(datasource: A, expected_sha256: &str) -> Self {
        Self {
            datasource,
            expected_sha256: expected_sha256.to_ascii_lowercase(),
            anchor: OnceCell::new(),
        }
    }

    /// Returns the pinned root certificate, fetching and fingerprint-checking
    /// it on first use. Idempotent and safe to call concurrently.
    pub(crate) async fn get_trust_anchor(&self) -> Result<&Certificate, VerificationError> {
        self.anchor
            .get_or_try_init(|| async {
                debug!("fetching root certificate trust anchor");
                let der = self.datasource.fetch_root_der().await?;
                let cert = Certificate::from_der(&der)
                    .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?;
                let fingerprint = cert
                    .sha256_fingerprint()
                    .map_err(|e| VerificationError::AnchorFetchFailed(e.to_string()))?;
                if fingerprint != self.expected_sha256 {
                    warn!(%fingerprint, "fetched root certificate failed the fingerprint pin");
                    return Err(VerificationError::AnchorFingerprintMismatch {
                        actual: fingerprint,
                        expected: self.expected_sha256.clone(),
                    });
                }
                debug!("trust anchor cached for process lifetime");
                Ok(cert)
            })
            .await
    }
}
