//! Error types for the sandbox host.

use bundler_common::Address;
use bundler_contract::TransferError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("asset {0} registered twice")]
    DuplicateAsset(Address),

    #[error("asset address {0} is not usable")]
    InvalidAsset(Address),

    #[error("genesis balance rejected: {0}")]
    Genesis(#[from] TransferError),
}
