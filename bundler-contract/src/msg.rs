//! Messages accepted by the contract and the responses it returns.

use bundler_common::{Action, Address, Field, Visibility};
use serde::{Deserialize, Serialize};

use crate::{
    context::TransferRequest,
    orchestrator::{AuthwitTrack, ExchangeTokens, SendTokens},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiateMsg {
    pub admin: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Push own stable and reward funds to a recipient, public balances.
    SendTokensPublic(SendTokens),
    /// Push own stable and reward funds to a recipient, private balances.
    SendTokensPrivate(SendTokens),
    ExchangeTokensPublic(ExchangeTokens),
    ExchangeTokensPrivate(ExchangeTokens),
    /// Revoke a witness the caller granted on the stable track.
    CancelStableAuthwit { inner_hash: Field },
    /// Revoke a witness the caller granted on the reward track.
    CancelRewardAuthwit { inner_hash: Field },
}

impl ExecuteMsg {
    pub fn entry_point(&self) -> &'static str {
        match self {
            ExecuteMsg::SendTokensPublic(_) => "send_tokens_public",
            ExecuteMsg::SendTokensPrivate(_) => "send_tokens_private",
            ExecuteMsg::ExchangeTokensPublic(_) => "exchange_tokens_public",
            ExecuteMsg::ExchangeTokensPrivate(_) => "exchange_tokens_private",
            ExecuteMsg::CancelStableAuthwit { .. } => AuthwitTrack::Stable.entry_point(),
            ExecuteMsg::CancelRewardAuthwit { .. } => AuthwitTrack::Reward.entry_point(),
        }
    }

    /// Action an authorizer must scope a witness to, for messages that can
    /// be executed on someone else's behalf.
    pub fn authwit_action(&self) -> Option<(Visibility, Action)> {
        match self {
            ExecuteMsg::ExchangeTokensPublic(args) => {
                Some((Visibility::Public, args.action(Visibility::Public)))
            }
            ExecuteMsg::ExchangeTokensPrivate(args) => {
                Some((Visibility::Private, args.action(Visibility::Private)))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Admin {},
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminResponse {
    pub admin: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// Result of a successful execute call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub attributes: Vec<Attribute>,
    /// Transfers issued, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<TransferRequest>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn add_transfers(mut self, transfers: impl IntoIterator<Item = TransferRequest>) -> Self {
        self.transfers.extend(transfers);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}
