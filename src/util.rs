use crate::{
    data::{
        datasources::trust_anchor_datasource::TrustAnchorDatasourceImpl,
        repositories::jws_transaction_repository_impl::JwsTransactionRepositoryImpl,
    },
    domain::{
        entities::verified_transaction::VerifiedTransaction,
        repositories::jws_transaction_repository::JwsTransactionRepository,
    },
    errors::VerificationError,
};

/// Entry point for verifying StoreKit 2 signed transactions.
///
/// One instance should live for the process lifetime so the trust anchor is
/// fetched at most once; individual verifications share it freely.
pub struct StoreKitJwsUtil<R: JwsTransactionRepository> {
    jws_transaction_repository: R,
}

impl<R: JwsTransactionRepository> StoreKitJwsUtil<R> {
    pub async fn verify_transaction(
        &self,
        token: &str,
    ) -> Result<VerifiedTransaction, VerificationError> {
        self.jws_transaction_repository
            .verify_transaction(token)
            .await
    }
}

impl StoreKitJwsUtil<JwsTransactionRepositoryImpl<TrustAnchorDatasourceImpl>> {
    pub fn new() -> Self {
        Self {
            jws_transaction_repository: JwsTransactionRepositoryImpl::new(),
        }
    }
}

impl Default for StoreKitJwsUtil<JwsTransactionRepositoryImpl<TrustAnchorDatasourceImpl>> {
    fn default() -> Self {
        Self::new()
    }
}
