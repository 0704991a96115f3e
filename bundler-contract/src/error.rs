//! Error types for the bundler contract and the capabilities it consumes.

use bundler_common::{Address, Amount, Field, Nullifier};
use thiserror::Error;

/// Failure reported by a token component's transfer capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("unknown asset {0}")]
    UnknownAsset(Address),

    #[error("insufficient balance for {owner} in {asset}: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: Address,
        owner: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("balance overflow for {owner} in {asset}")]
    Overflow { asset: Address, owner: Address },

    /// Any other refusal by the token component.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Failure reported by the authorization-witness subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthwitError {
    #[error("no authorization witness for inner hash {inner_hash}")]
    Missing { inner_hash: Field },

    #[error("authorization witness for inner hash {inner_hash} has been nullified")]
    Nullified { inner_hash: Field },

    #[error("operation does not accept delegated callers")]
    NotDelegatable,
}

/// Failure reported by the global nullifier set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NullifierError {
    #[error("nullifier {0} already recorded")]
    AlreadyRecorded(Nullifier),
}

/// Aggregated error type for contract calls.
///
/// Every variant aborts the enclosing call; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The admin supplied at initialization is the null address.
    #[error("invalid admin: admin address must be non-zero")]
    InvalidAdmin,

    #[error("contract already initialized with admin {admin}")]
    AlreadyInitialized { admin: Address },

    #[error("contract not initialized")]
    NotInitialized,

    /// A self-initiated action carried a nonzero nonce.
    #[error("invalid nonce {nonce}: self-initiated actions must use nonce 0")]
    InvalidNonce { nonce: Field },

    #[error("authorization from {authorizer} failed: {source}")]
    Authorization {
        authorizer: Address,
        #[source]
        source: AuthwitError,
    },

    /// Propagated verbatim from the token component.
    #[error("transfer of {asset} failed: {source}")]
    Transfer {
        asset: Address,
        #[source]
        source: TransferError,
    },

    #[error(transparent)]
    Nullifier(#[from] NullifierError),
}
