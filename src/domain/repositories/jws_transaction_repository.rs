use async_trait::async_trait;

use crate::{
    domain::entities::verified_transaction::VerifiedTransaction, errors::VerificationError,
};

#[async_trait]
pub trait JwsTransactionRepository: Send + Sync {
    /// Verify a StoreKit 2 signed transaction:
    /// https://developer.apple.com/documentation/appstoreserverapi/jwstransaction
    ///
    /// token:
    ///   The compact JWS string (`header.payload.signature`) as produced by
    ///   StoreKit 2 on the device or by the App Store Server API.
    async fn verify_transaction(
        &self,
        token: &str,
    ) -> Result<VerifiedTransaction, VerificationError>;
}
