//! Bundled transfer orchestration.
//!
//! Every transfer entry point is described by an [`OperationConfig`] and runs
//! through [`execute_bundle`]:
//!
//! 1. resolve the funds owner of the pull leg against the caller,
//! 2. self-initiated: require nonce 0; delegated: validate a witness scoped to
//!    `(owner, inner_hash(caller, action))` according to the config's policy,
//! 3. issue the stable leg, then the reward leg, skipping zero amounts.
//!
//! Any error aborts the call. Legs already issued are discarded by the host's
//! transaction boundary, not compensated here.

use bundler_common::{
    compute_inner_hash, Action, Address, Amount, Field, FunctionSelector, Nullifier, Visibility,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    context::{CallContext, TransferRequest},
    error::{AuthwitError, ContractError},
};

/// When a delegated caller has to present a witness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WitnessRequirement {
    /// Whenever owner and caller differ.
    Always,
    /// Only when the pull leg moves a nonzero amount.
    WhenPulling,
}

/// Caller-resolution rule of an entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPolicy {
    /// The caller can only move their own funds.
    SelfOnly,
    /// The pull leg may debit another party under a witness.
    Delegated(WitnessRequirement),
}

/// Static description of one entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationConfig {
    pub name: &'static str,
    pub visibility: Visibility,
    pub auth: AuthPolicy,
}

impl OperationConfig {
    pub fn selector(&self) -> FunctionSelector {
        FunctionSelector::from_name(self.name)
    }
}

pub const SEND_TOKENS_PUBLIC: OperationConfig = OperationConfig {
    name: "send_tokens_public",
    visibility: Visibility::Public,
    auth: AuthPolicy::SelfOnly,
};

pub const SEND_TOKENS_PRIVATE: OperationConfig = OperationConfig {
    name: "send_tokens_private",
    visibility: Visibility::Private,
    auth: AuthPolicy::SelfOnly,
};

pub const EXCHANGE_TOKENS_PUBLIC: OperationConfig = OperationConfig {
    name: "exchange_tokens_public",
    visibility: Visibility::Public,
    auth: AuthPolicy::Delegated(WitnessRequirement::Always),
};

// The private witness only guards the pull, so no stable amount means no check.
pub const EXCHANGE_TOKENS_PRIVATE: OperationConfig = OperationConfig {
    name: "exchange_tokens_private",
    visibility: Visibility::Private,
    auth: AuthPolicy::Delegated(WitnessRequirement::WhenPulling),
};

pub fn send_config(visibility: Visibility) -> &'static OperationConfig {
    match visibility {
        Visibility::Public => &SEND_TOKENS_PUBLIC,
        Visibility::Private => &SEND_TOKENS_PRIVATE,
    }
}

pub fn exchange_config(visibility: Visibility) -> &'static OperationConfig {
    match visibility {
        Visibility::Public => &EXCHANGE_TOKENS_PUBLIC,
        Visibility::Private => &EXCHANGE_TOKENS_PRIVATE,
    }
}

/// Arguments of `send_tokens_{public|private}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTokens {
    pub to: Address,
    pub reward_token: Address,
    pub stable_token: Address,
    pub stable_amount: Amount,
    pub reward_amount: Amount,
}

/// Arguments of `exchange_tokens_{public|private}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTokens {
    pub from: Address,
    pub stable_token: Address,
    pub reward_token: Address,
    pub stable_amount: Amount,
    pub reward_amount: Amount,
    #[serde(default)]
    pub nonce: Field,
}

impl ExchangeTokens {
    /// The action a witness for this exchange must be scoped to.
    pub fn action(&self, visibility: Visibility) -> Action {
        Action::new(
            exchange_config(visibility).selector(),
            vec![
                Field::from(self.from),
                Field::from(self.stable_token),
                Field::from(self.reward_token),
                Field::from(self.stable_amount),
                Field::from(self.reward_amount),
                self.nonce,
            ],
        )
    }
}

/// One transfer of a bundle, before the zero-amount filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leg {
    pub asset: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub nonce: Field,
}

/// A fully resolved bundle: stable leg first, reward leg second.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundledTransfer {
    /// Party debited by the stable leg.
    pub owner: Address,
    /// Nonce supplied for the stable leg.
    pub nonce: Field,
    pub stable: Leg,
    pub reward: Leg,
    pub action: Action,
}

/// How the caller was allowed to move the owner's funds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authorization {
    SelfInitiated,
    Witness { inner_hash: Field },
    /// Delegated call whose policy did not require a witness.
    NotRequired,
}

/// Outcome of a successful bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleReceipt {
    pub authorization: Authorization,
    pub transfers: Vec<TransferRequest>,
}

fn authorize<C: CallContext + ?Sized>(
    ctx: &mut C,
    config: &OperationConfig,
    bundle: &BundledTransfer,
) -> Result<Authorization, ContractError> {
    let caller = ctx.caller();

    if bundle.owner == caller {
        if !bundle.nonce.is_zero() {
            warn!(op = config.name, %caller, nonce = %bundle.nonce, "nonzero nonce on self-initiated call");
            return Err(ContractError::InvalidNonce { nonce: bundle.nonce });
        }
        debug!(op = config.name, %caller, "self-initiated");
        return Ok(Authorization::SelfInitiated);
    }

    let requirement = match config.auth {
        AuthPolicy::SelfOnly => {
            return Err(ContractError::Authorization {
                authorizer: bundle.owner,
                source: AuthwitError::NotDelegatable,
            })
        }
        AuthPolicy::Delegated(requirement) => requirement,
    };

    if requirement == WitnessRequirement::WhenPulling && bundle.stable.amount == 0 {
        debug!(op = config.name, owner = %bundle.owner, %caller, "no pull, witness not required");
        return Ok(Authorization::NotRequired);
    }

    let inner_hash = compute_inner_hash(&ctx.contract_address(), &caller, &bundle.action);
    ctx.validate_authwit(config.visibility, &bundle.owner, &inner_hash)
        .map_err(|source| {
            warn!(op = config.name, owner = %bundle.owner, %caller, error = %source, "authorization failed");
            ContractError::Authorization {
                authorizer: bundle.owner,
                source,
            }
        })?;

    debug!(op = config.name, owner = %bundle.owner, %caller, %inner_hash, "witness consumed");
    Ok(Authorization::Witness { inner_hash })
}

/// Authorize, then issue the nonzero legs in order.
pub fn execute_bundle<C: CallContext + ?Sized>(
    ctx: &mut C,
    config: &OperationConfig,
    bundle: &BundledTransfer,
) -> Result<BundleReceipt, ContractError> {
    let authorization = authorize(ctx, config, bundle)?;

    let mut transfers = Vec::with_capacity(2);
    for (label, leg) in [("stable", &bundle.stable), ("reward", &bundle.reward)] {
        if leg.amount == 0 {
            debug!(op = config.name, leg = label, "zero amount, skipped");
            continue;
        }

        let request = TransferRequest {
            visibility: config.visibility,
            asset: leg.asset,
            from: leg.from,
            to: leg.to,
            amount: leg.amount,
            nonce: leg.nonce,
        };
        ctx.transfer(&request)
            .map_err(|source| ContractError::Transfer {
                asset: leg.asset,
                source,
            })?;
        transfers.push(request);
    }

    info!(
        op = config.name,
        caller = %ctx.caller(),
        transfers = transfers.len(),
        "bundle executed"
    );
    Ok(BundleReceipt {
        authorization,
        transfers,
    })
}

/// Push the caller's own stable and reward funds to `to`.
pub fn send_tokens<C: CallContext + ?Sized>(
    ctx: &mut C,
    visibility: Visibility,
    args: &SendTokens,
) -> Result<BundleReceipt, ContractError> {
    let config = send_config(visibility);
    let caller = ctx.caller();

    let bundle = BundledTransfer {
        owner: caller,
        nonce: Field::ZERO,
        stable: Leg {
            asset: args.stable_token,
            from: caller,
            to: args.to,
            amount: args.stable_amount,
            nonce: Field::ZERO,
        },
        reward: Leg {
            asset: args.reward_token,
            from: caller,
            to: args.to,
            amount: args.reward_amount,
            nonce: Field::ZERO,
        },
        action: Action::new(config.selector(), Vec::new()),
    };

    execute_bundle(ctx, config, &bundle)
}

/// Pull stable funds `from -> caller`, push reward funds `caller -> from`.
pub fn exchange_tokens<C: CallContext + ?Sized>(
    ctx: &mut C,
    visibility: Visibility,
    args: &ExchangeTokens,
) -> Result<BundleReceipt, ContractError> {
    let config = exchange_config(visibility);
    let caller = ctx.caller();

    let bundle = BundledTransfer {
        owner: args.from,
        nonce: args.nonce,
        stable: Leg {
            asset: args.stable_token,
            from: args.from,
            to: caller,
            amount: args.stable_amount,
            nonce: args.nonce,
        },
        // Always the caller's own funds.
        reward: Leg {
            asset: args.reward_token,
            from: caller,
            to: args.from,
            amount: args.reward_amount,
            nonce: Field::ZERO,
        },
        action: args.action(visibility),
    };

    execute_bundle(ctx, config, &bundle)
}

/// Which asset track a revoked witness belonged to. Both burn the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthwitTrack {
    Stable,
    Reward,
}

impl AuthwitTrack {
    pub fn entry_point(&self) -> &'static str {
        match self {
            AuthwitTrack::Stable => "cancel_stable_authwit",
            AuthwitTrack::Reward => "cancel_reward_authwit",
        }
    }
}

/// Burn the caller's own witness for `inner_hash`.
///
/// The nullifier is derived from the caller's identity, so only the party who
/// granted a witness can revoke it.
pub fn cancel_authwit<C: CallContext + ?Sized>(
    ctx: &mut C,
    track: AuthwitTrack,
    inner_hash: &Field,
) -> Result<Nullifier, ContractError> {
    let on_behalf_of = ctx.caller();
    let nullifier = ctx.nullifier_for(&on_behalf_of, inner_hash);
    ctx.record_nullifier(nullifier)?;

    info!(op = track.entry_point(), %on_behalf_of, %nullifier, "authwit cancelled");
    Ok(nullifier)
}
