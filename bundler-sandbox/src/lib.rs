//! bundler-sandbox
//!
//! In-memory implementation of everything the bundler contract treats as
//! external: token ledgers with public and private books, out-of-band witness
//! grants, the append-only nullifier set, and the transaction boundary that
//! discards every effect of a failed call.

pub mod authwit;
pub mod config;
pub mod error;
pub mod host;
pub mod ledger;

pub use authwit::{AuthwitRegistry, NullifierSet};
pub use config::{AssetConfig, GenesisBalance, SandboxConfig};
pub use error::SandboxError;
pub use host::{CallFrame, ExternalCall, Sandbox};
pub use ledger::{AssetBooks, TokenLedger};
