//! Public and private balance books per registered asset.

use std::collections::BTreeMap;

use bundler_common::{Address, Amount, Visibility};
use bundler_contract::{TransferError, TransferRequest};
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;

/// Balances of one token component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBooks {
    pub symbol: String,
    pub public: BTreeMap<Address, Amount>,
    pub private: BTreeMap<Address, Amount>,
}

impl AssetBooks {
    fn book(&self, visibility: Visibility) -> &BTreeMap<Address, Amount> {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }

    fn book_mut(&mut self, visibility: Visibility) -> &mut BTreeMap<Address, Amount> {
        match visibility {
            Visibility::Public => &mut self.public,
            Visibility::Private => &mut self.private,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    assets: BTreeMap<Address, AssetBooks>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_asset(
        &mut self,
        asset: Address,
        symbol: impl Into<String>,
    ) -> Result<(), SandboxError> {
        if asset.is_zero() {
            return Err(SandboxError::InvalidAsset(asset));
        }
        if self.assets.contains_key(&asset) {
            return Err(SandboxError::DuplicateAsset(asset));
        }
        self.assets.insert(
            asset,
            AssetBooks {
                symbol: symbol.into(),
                ..Default::default()
            },
        );
        Ok(())
    }

    pub fn assets(&self) -> impl Iterator<Item = (&Address, &AssetBooks)> {
        self.assets.iter()
    }

    pub fn balance(&self, visibility: Visibility, asset: &Address, owner: &Address) -> Amount {
        self.assets
            .get(asset)
            .and_then(|books| books.book(visibility).get(owner).copied())
            .unwrap_or(0)
    }

    /// Sum of both books for `asset`.
    pub fn total_supply(&self, asset: &Address) -> Amount {
        self.assets
            .get(asset)
            .map(|books| {
                books
                    .public
                    .values()
                    .chain(books.private.values())
                    .fold(0u128, |acc, v| acc.saturating_add(*v))
            })
            .unwrap_or(0)
    }

    pub fn mint(
        &mut self,
        visibility: Visibility,
        asset: &Address,
        owner: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let books = self
            .assets
            .get_mut(asset)
            .ok_or(TransferError::UnknownAsset(*asset))?;
        credit(books.book_mut(visibility), asset, owner, amount)
    }

    /// Move `amount` between two balances of the same book.
    ///
    /// The nonce is the token component's concern and is not checked here.
    pub fn transfer(&mut self, request: &TransferRequest) -> Result<(), TransferError> {
        let asset = request.asset;
        let books = self
            .assets
            .get_mut(&asset)
            .ok_or(TransferError::UnknownAsset(asset))?;
        let book = books.book_mut(request.visibility);

        let available = book.get(&request.from).copied().unwrap_or(0);
        if available < request.amount {
            return Err(TransferError::InsufficientBalance {
                asset,
                owner: request.from,
                available,
                requested: request.amount,
            });
        }

        let remaining = available - request.amount;
        if remaining == 0 {
            book.remove(&request.from);
        } else {
            book.insert(request.from, remaining);
        }
        credit(book, &asset, &request.to, request.amount)
    }
}

fn credit(
    book: &mut BTreeMap<Address, Amount>,
    asset: &Address,
    owner: &Address,
    amount: Amount,
) -> Result<(), TransferError> {
    if amount == 0 {
        return Ok(());
    }
    let current = book.get(owner).copied().unwrap_or(0);
    let next = current.checked_add(amount).ok_or(TransferError::Overflow {
        asset: *asset,
        owner: *owner,
    })?;
    book.insert(*owner, next);
    Ok(())
}
