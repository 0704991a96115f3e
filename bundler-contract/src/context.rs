//! The capability surface a host provides to each contract call.

use bundler_common::{compute_authwit_nullifier, Address, Amount, Field, Nullifier, Visibility};
use serde::{Deserialize, Serialize};

use crate::error::{AuthwitError, NullifierError, TransferError};

/// One call into a token component's transfer entry point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub visibility: Visibility,
    pub asset: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub nonce: Field,
}

/// Execution context of a single contract call.
///
/// The host owns the transaction boundary: if the contract returns an error,
/// every effect produced through this context during the call is discarded.
pub trait CallContext {
    /// Party that invoked the operation.
    fn caller(&self) -> Address;

    /// Address of the executing contract instance.
    fn contract_address(&self) -> Address;

    /// Issue `asset.transfer_{public|private}(from, to, amount, nonce)`.
    fn transfer(&mut self, request: &TransferRequest) -> Result<(), TransferError>;

    /// Validate and consume the witness `authorizer` granted for `inner_hash`.
    fn validate_authwit(
        &mut self,
        visibility: Visibility,
        authorizer: &Address,
        inner_hash: &Field,
    ) -> Result<(), AuthwitError>;

    fn nullifier_for(&self, authorizer: &Address, inner_hash: &Field) -> Nullifier {
        compute_authwit_nullifier(authorizer, inner_hash)
    }

    /// Append to the global nullifier set.
    fn record_nullifier(&mut self, nullifier: Nullifier) -> Result<(), NullifierError>;
}
