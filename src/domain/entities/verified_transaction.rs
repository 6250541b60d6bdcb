use serde_json::{Map, Value};

/// The App Store server environment a transaction was signed in.
///
/// Values outside the two documented environments are preserved, not
/// rejected; deciding which environments to accept is the caller's policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
    Unknown(String),
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value {
            "Sandbox" => Self::Sandbox,
            "Production" => Self::Production,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Decoded payload of a verified StoreKit 2 transaction, produced only after
/// the certificate chain and the token signature have both checked out.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
///
/// The accessors are conveniences over the raw claims; nothing about field
/// presence is enforced here. Requiring e.g. `appAccountToken` is business
/// policy and belongs to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    claims: Map<String, Value>,
}

impl VerifiedTransaction {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// All claims of the signed payload.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }

    /// UUID associating the transaction with an account on the caller's own
    /// service. Absent if the app did not set one at purchase time.
    pub fn app_account_token(&self) -> Option<&str> {
        self.str_claim("appAccountToken")
    }

    /// The transaction identifier of the original purchase.
    pub fn original_transaction_id(&self) -> Option<&str> {
        self.str_claim("originalTransactionId")
    }

    /// The unique identifier of this transaction.
    pub fn transaction_id(&self) -> Option<&str> {
        self.str_claim("transactionId")
    }

    /// The bundle identifier of the app.
    pub fn bundle_id(&self) -> Option<&str> {
        self.str_claim("bundleId")
    }

    /// The unique identifier of the product.
    pub fn product_id(&self) -> Option<&str> {
        self.str_claim("productId")
    }

    /// UNIX time, in milliseconds, that the subscription expires or renews.
    pub fn expires_date_ms(&self) -> Option<u64> {
        self.u64_claim("expiresDate")
    }

    /// UNIX time, in milliseconds, of the purchase.
    pub fn purchase_date_ms(&self) -> Option<u64> {
        self.u64_claim("purchaseDate")
    }

    pub fn environment(&self) -> Option<Environment> {
        self.str_claim("environment").map(Environment::from)
    }

    fn str_claim(&self, key: &str) -> Option<&str> {
        self.claims.get(key).and_then(Value::as_str)
    }

    fn u64_claim(&self, key: &str) -> Option<u64> {
        self.claims.get(key).and_then(Value::as_u64)
    }
}
