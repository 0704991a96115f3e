//! bundler-contract
//!
//! Moves a stable-token balance and a reward-token balance between two parties
//! in one atomic call, over public or private balances, optionally on behalf of
//! another party who granted an authorization witness.
//!
//! # Entry points
//!
//! | entry point               | funds owner      | authorization                          |
//! |---------------------------|------------------|----------------------------------------|
//! | `send_tokens_public`      | caller           | none, nonce fixed to 0                 |
//! | `send_tokens_private`     | caller           | none, nonce fixed to 0                 |
//! | `exchange_tokens_public`  | `from` / caller  | witness whenever `from != caller`      |
//! | `exchange_tokens_private` | `from` / caller  | witness when `from != caller` and the stable amount is nonzero |
//! | `cancel_stable_authwit`   | caller           | records `nullifier(caller, inner_hash)` |
//! | `cancel_reward_authwit`   | caller           | records `nullifier(caller, inner_hash)` |
//!
//! The contract holds no ledger. Transfers, witness validation and the
//! nullifier set are reached through a [`CallContext`] supplied by the host,
//! which also owns the all-or-nothing transaction boundary.

pub mod admin;
pub mod context;
pub mod contract;
pub mod error;
pub mod msg;
pub mod orchestrator;

pub use admin::AdminRegistry;
pub use context::{CallContext, TransferRequest};
pub use contract::TokenBundler;
pub use error::{AuthwitError, ContractError, NullifierError, TransferError};
pub use msg::{AdminResponse, Attribute, ExecuteMsg, InstantiateMsg, QueryMsg, Response};
pub use orchestrator::{
    cancel_authwit, exchange_tokens, execute_bundle, send_tokens, AuthPolicy, Authorization,
    AuthwitTrack, BundleReceipt, BundledTransfer, ExchangeTokens, Leg, OperationConfig,
    SendTokens, WitnessRequirement, EXCHANGE_TOKENS_PRIVATE, EXCHANGE_TOKENS_PUBLIC,
    SEND_TOKENS_PRIVATE, SEND_TOKENS_PUBLIC,
};

pub use bundler_common::{
    compute_authwit_nullifier, compute_inner_hash, Action, Address, Amount, Field,
    FunctionSelector, Nullifier, Visibility,
};
