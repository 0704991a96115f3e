//! Transactional host.
//!
//! [`Sandbox::call`] is the enclosing transaction: the contract runs against a
//! [`CallFrame`], and if it returns an error the whole host state is restored
//! to the pre-call snapshot. Every capability invocation is traced, whether or
//! not the call commits.

use bundler_common::{compute_inner_hash, Address, Field, Nullifier, Visibility};
use bundler_contract::{
    AuthwitError, CallContext, ContractError, ExecuteMsg, NullifierError, Response, TokenBundler,
    TransferError, TransferRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    authwit::{AuthwitRegistry, NullifierSet},
    config::SandboxConfig,
    error::SandboxError,
    ledger::TokenLedger,
};

/// A capability invocation observed during a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalCall {
    Transfer(TransferRequest),
    ValidateAuthwit {
        visibility: Visibility,
        authorizer: Address,
        inner_hash: Field,
    },
    RecordNullifier {
        nullifier: Nullifier,
    },
}

#[derive(Clone, Debug, Default)]
struct HostState {
    ledger: TokenLedger,
    authwits: AuthwitRegistry,
    nullifiers: NullifierSet,
}

/// Context handed to the contract for one call.
pub struct CallFrame<'a> {
    caller: Address,
    contract_address: Address,
    state: &'a mut HostState,
    trace: Vec<ExternalCall>,
}

impl CallContext for CallFrame<'_> {
    fn caller(&self) -> Address {
        self.caller
    }

    fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn transfer(&mut self, request: &TransferRequest) -> Result<(), TransferError> {
        self.trace.push(ExternalCall::Transfer(request.clone()));
        self.state.ledger.transfer(request)
    }

    fn validate_authwit(
        &mut self,
        visibility: Visibility,
        authorizer: &Address,
        inner_hash: &Field,
    ) -> Result<(), AuthwitError> {
        self.trace.push(ExternalCall::ValidateAuthwit {
            visibility,
            authorizer: *authorizer,
            inner_hash: *inner_hash,
        });

        if !self.state.authwits.is_granted(visibility, authorizer, inner_hash) {
            return Err(AuthwitError::Missing {
                inner_hash: *inner_hash,
            });
        }

        // Consuming the witness is what makes it single use.
        let nullifier = self.nullifier_for(authorizer, inner_hash);
        self.state
            .nullifiers
            .record(nullifier)
            .map_err(|_| AuthwitError::Nullified {
                inner_hash: *inner_hash,
            })
    }

    fn record_nullifier(&mut self, nullifier: Nullifier) -> Result<(), NullifierError> {
        self.trace.push(ExternalCall::RecordNullifier { nullifier });
        self.state.nullifiers.record(nullifier)
    }
}

/// In-memory host for one contract deployment.
#[derive(Debug)]
pub struct Sandbox {
    contract_address: Address,
    state: HostState,
    last_trace: Vec<ExternalCall>,
}

impl Sandbox {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            state: HostState::default(),
            last_trace: Vec::new(),
        }
    }

    /// Build a host with registered assets and genesis balances.
    pub fn from_config(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let mut sandbox = Self::new(config.contract_address);
        for asset in &config.assets {
            sandbox
                .state
                .ledger
                .register_asset(asset.address, asset.symbol.clone())?;
        }
        for entry in &config.balances {
            if entry.public > 0 {
                sandbox
                    .state
                    .ledger
                    .mint(Visibility::Public, &entry.asset, &entry.owner, entry.public)?;
            }
            if entry.private > 0 {
                sandbox
                    .state
                    .ledger
                    .mint(Visibility::Private, &entry.asset, &entry.owner, entry.private)?;
            }
        }
        debug!(
            contract = %config.contract_address,
            assets = config.assets.len(),
            balances = config.balances.len(),
            "sandbox initialized"
        );
        Ok(sandbox)
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.state.ledger
    }

    /// Direct ledger access, outside any call.
    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.state.ledger
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.state.nullifiers
    }

    pub fn authwits(&self) -> &AuthwitRegistry {
        &self.state.authwits
    }

    pub fn balance(&self, visibility: Visibility, asset: &Address, owner: &Address) -> u128 {
        self.state.ledger.balance(visibility, asset, owner)
    }

    /// Register a witness out of band.
    pub fn grant_authwit(&mut self, visibility: Visibility, authorizer: Address, inner_hash: Field) {
        self.state.authwits.grant(visibility, authorizer, inner_hash);
    }

    /// `authorizer` lets `caller` execute `msg` once. Returns the inner hash,
    /// or `None` if the message cannot be delegated.
    pub fn grant_for_message(
        &mut self,
        authorizer: Address,
        caller: Address,
        msg: &ExecuteMsg,
    ) -> Option<Field> {
        let (visibility, action) = msg.authwit_action()?;
        let inner_hash = compute_inner_hash(&self.contract_address, &caller, &action);
        self.grant_authwit(visibility, authorizer, inner_hash);
        Some(inner_hash)
    }

    /// Run `f` as one all-or-nothing transaction on behalf of `caller`.
    pub fn call<T, E, F>(&mut self, caller: Address, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut CallFrame<'_>) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let snapshot = self.state.clone();

        let (result, trace) = {
            let mut frame = CallFrame {
                caller,
                contract_address: self.contract_address,
                state: &mut self.state,
                trace: Vec::new(),
            };
            let result = f(&mut frame);
            (result, frame.trace)
        };

        if let Err(err) = &result {
            warn!(%caller, error = %err, external_calls = trace.len(), "call reverted");
            self.state = snapshot;
        }
        self.last_trace = trace;
        result
    }

    pub fn execute(
        &mut self,
        contract: &TokenBundler,
        caller: Address,
        msg: &ExecuteMsg,
    ) -> Result<Response, ContractError> {
        self.call(caller, |ctx| contract.execute(ctx, msg))
    }

    /// Capability calls attempted by the most recent call, committed or not.
    pub fn last_trace(&self) -> &[ExternalCall] {
        &self.last_trace
    }

    /// Transfer calls attempted by the most recent call.
    pub fn last_transfers(&self) -> Vec<&TransferRequest> {
        self.last_trace
            .iter()
            .filter_map(|call| match call {
                ExternalCall::Transfer(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}
