//! Witness grants and the global nullifier set.

use std::collections::{BTreeSet, HashSet};

use bundler_common::{Address, Field, Nullifier, Visibility};
use bundler_contract::NullifierError;

/// Witnesses granted by funds owners, keyed by flavour, authorizer and
/// inner hash. Grants are never removed; consumption is tracked by nullifier.
#[derive(Clone, Debug, Default)]
pub struct AuthwitRegistry {
    grants: HashSet<(Visibility, Address, Field)>,
}

impl AuthwitRegistry {
    pub fn grant(&mut self, visibility: Visibility, authorizer: Address, inner_hash: Field) {
        self.grants.insert((visibility, authorizer, inner_hash));
    }

    pub fn is_granted(&self, visibility: Visibility, authorizer: &Address, inner_hash: &Field) -> bool {
        self.grants.contains(&(visibility, *authorizer, *inner_hash))
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Append-only.
#[derive(Clone, Debug, Default)]
pub struct NullifierSet {
    entries: BTreeSet<Nullifier>,
}

impl NullifierSet {
    pub fn record(&mut self, nullifier: Nullifier) -> Result<(), NullifierError> {
        if !self.entries.insert(nullifier) {
            return Err(NullifierError::AlreadyRecorded(nullifier));
        }
        Ok(())
    }

    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.entries.contains(nullifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nullifier> {
        self.entries.iter()
    }
}
