//! Verifier for Apple StoreKit 2 signed transactions (compact JWS strings
//! carrying an `x5c` certificate chain). Establishes a chain of trust from
//! the token's leaf certificate up to the pinned Apple Root CA G3, checks the
//! ES256 token signature against the leaf, and exposes the decoded payload.

pub(crate) mod constants;

pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod trust_anchor_datasource;
        pub(crate) mod utils;
    }
    pub(crate) mod models {
        pub(crate) mod jws_header_model;
    }
    pub(crate) mod repositories {
        pub(crate) mod jws_transaction_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod certificate;
        pub mod verified_transaction;
    }
    pub mod repositories {
        pub mod jws_transaction_repository;
    }
}

pub mod errors;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;
