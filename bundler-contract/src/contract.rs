//! Contract entry points.

use bundler_common::{Address, Field, Nullifier, Visibility};
use serde::{Deserialize, Serialize};

use crate::{
    admin::AdminRegistry,
    context::CallContext,
    error::ContractError,
    msg::{AdminResponse, ExecuteMsg, InstantiateMsg, QueryMsg, Response},
    orchestrator::{
        cancel_authwit, exchange_tokens, send_tokens, Authorization, AuthwitTrack, BundleReceipt,
        ExchangeTokens, SendTokens,
    },
};

/// The token bundler contract. Its only persistent state is the admin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundler {
    registry: AdminRegistry,
}

impl TokenBundler {
    /// A deployed but uninitialized instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy and initialize in one step.
    pub fn instantiate(msg: InstantiateMsg) -> Result<Self, ContractError> {
        let mut contract = Self::new();
        contract.initialize(msg.admin)?;
        Ok(contract)
    }

    pub fn initialize(&mut self, admin: Address) -> Result<(), ContractError> {
        self.registry.initialize(admin)
    }

    pub fn registry(&self) -> &AdminRegistry {
        &self.registry
    }

    pub fn send_tokens_public<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        args: &SendTokens,
    ) -> Result<BundleReceipt, ContractError> {
        self.registry.ensure_initialized()?;
        send_tokens(ctx, Visibility::Public, args)
    }

    pub fn send_tokens_private<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        args: &SendTokens,
    ) -> Result<BundleReceipt, ContractError> {
        self.registry.ensure_initialized()?;
        send_tokens(ctx, Visibility::Private, args)
    }

    pub fn exchange_tokens_public<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        args: &ExchangeTokens,
    ) -> Result<BundleReceipt, ContractError> {
        self.registry.ensure_initialized()?;
        exchange_tokens(ctx, Visibility::Public, args)
    }

    pub fn exchange_tokens_private<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        args: &ExchangeTokens,
    ) -> Result<BundleReceipt, ContractError> {
        self.registry.ensure_initialized()?;
        exchange_tokens(ctx, Visibility::Private, args)
    }

    pub fn cancel_stable_authwit<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        inner_hash: &Field,
    ) -> Result<Nullifier, ContractError> {
        self.registry.ensure_initialized()?;
        cancel_authwit(ctx, AuthwitTrack::Stable, inner_hash)
    }

    pub fn cancel_reward_authwit<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        inner_hash: &Field,
    ) -> Result<Nullifier, ContractError> {
        self.registry.ensure_initialized()?;
        cancel_authwit(ctx, AuthwitTrack::Reward, inner_hash)
    }

    pub fn execute<C: CallContext + ?Sized>(
        &self,
        ctx: &mut C,
        msg: &ExecuteMsg,
    ) -> Result<Response, ContractError> {
        let action = msg.entry_point();
        let caller = ctx.caller();

        match msg {
            ExecuteMsg::SendTokensPublic(args) => {
                let receipt = self.send_tokens_public(ctx, args)?;
                Ok(bundle_response(action, caller, receipt).add_attribute("to", args.to))
            }
            ExecuteMsg::SendTokensPrivate(args) => {
                let receipt = self.send_tokens_private(ctx, args)?;
                Ok(bundle_response(action, caller, receipt).add_attribute("to", args.to))
            }
            ExecuteMsg::ExchangeTokensPublic(args) => {
                let receipt = self.exchange_tokens_public(ctx, args)?;
                Ok(bundle_response(action, caller, receipt).add_attribute("from", args.from))
            }
            ExecuteMsg::ExchangeTokensPrivate(args) => {
                let receipt = self.exchange_tokens_private(ctx, args)?;
                Ok(bundle_response(action, caller, receipt).add_attribute("from", args.from))
            }
            ExecuteMsg::CancelStableAuthwit { inner_hash } => {
                let nullifier = self.cancel_stable_authwit(ctx, inner_hash)?;
                Ok(cancel_response(action, caller, inner_hash, nullifier))
            }
            ExecuteMsg::CancelRewardAuthwit { inner_hash } => {
                let nullifier = self.cancel_reward_authwit(ctx, inner_hash)?;
                Ok(cancel_response(action, caller, inner_hash, nullifier))
            }
        }
    }

    pub fn query(&self, msg: &QueryMsg) -> AdminResponse {
        match msg {
            QueryMsg::Admin {} => AdminResponse {
                admin: self.registry.admin(),
            },
        }
    }
}

fn bundle_response(
    action: &str,
    caller: Address,
    receipt: BundleReceipt,
) -> Response {
    let authorization = match &receipt.authorization {
        Authorization::SelfInitiated => "self".to_string(),
        Authorization::Witness { inner_hash } => format!("witness:{inner_hash}"),
        Authorization::NotRequired => "not_required".to_string(),
    };

    Response::new()
        .add_attribute("action", action)
        .add_attribute("caller", caller)
        .add_attribute("authorization", authorization)
        .add_attribute("transfers", receipt.transfers.len())
        .add_transfers(receipt.transfers)
}

fn cancel_response(
    action: &str,
    caller: Address,
    inner_hash: &Field,
    nullifier: Nullifier,
) -> Response {
    Response::new()
        .add_attribute("action", action)
        .add_attribute("on_behalf_of", caller)
        .add_attribute("inner_hash", inner_hash)
        .add_attribute("nullifier", nullifier)
}
