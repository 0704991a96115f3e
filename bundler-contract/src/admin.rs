//! Deploy-time admin registry.

use bundler_common::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ContractError;

/// Holds the admin address, set exactly once.
///
/// The bundling logic never reads it; it is a placeholder authority for
/// future access control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRegistry {
    admin: Option<Address>,
}

impl AdminRegistry {
    pub fn new() -> Self {
        Self { admin: None }
    }

    /// `Uninitialized -> Initialized`. A second call fails and keeps the
    /// stored admin.
    pub fn initialize(&mut self, admin: Address) -> Result<(), ContractError> {
        if let Some(existing) = self.admin {
            return Err(ContractError::AlreadyInitialized { admin: existing });
        }
        if admin.is_zero() {
            return Err(ContractError::InvalidAdmin);
        }

        self.admin = Some(admin);
        info!(%admin, "admin registry initialized");
        Ok(())
    }

    pub fn admin(&self) -> Option<Address> {
        self.admin
    }

    pub fn is_initialized(&self) -> bool {
        self.admin.is_some()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<Address, ContractError> {
        self.admin.ok_or(ContractError::NotInitialized)
    }
}
