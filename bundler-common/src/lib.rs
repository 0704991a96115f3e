//! bundler-common
//!
//! Primitive types shared by the bundler contract, the in-memory host and the
//! tooling: 32-byte addresses, field-sized nonces, nullifiers, function
//! selectors and the authorization-witness hashing scheme.
//!
//! # Authorization witnesses
//!
//! A funds owner grants a caller permission for exactly one action. The action
//! is identified by its *inner hash*:
//!
//! ```text
//! inner_hash = H(domain | contract | caller | selector | H(args))
//! nullifier  = H(domain | authorizer | inner_hash)
//! ```
//!
//! Consuming or cancelling a witness records its nullifier; a recorded
//! nullifier can never be recorded again, so each witness validates at most
//! once.

use std::{fmt, str::FromStr};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const INNER_HASH_DOMAIN: &str = "bundler:authwit:inner:v1";
const NULLIFIER_DOMAIN: &str = "bundler:authwit:nullifier:v1";
const ARGS_HASH_DOMAIN: &str = "bundler:authwit:args:v1";
const SELECTOR_DOMAIN: &str = "bundler:selector:v1";

/// Token amount. Zero is a valid, no-op amount.
pub type Amount = u128;

/// Errors raised while parsing hex-encoded 32-byte values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("value is empty")]
    Empty,
    #[error("value exceeds 32 bytes ({0} hex digits)")]
    TooLong(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Parse `0x`-prefixed (or bare) hex into 32 big-endian bytes, left-padding
/// short input with zeros.
pub fn parse_hex32(value: &str) -> Result<[u8; 32], AddressParseError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(AddressParseError::Empty);
    }
    if digits.len() > 64 {
        return Err(AddressParseError::TooLong(digits.len()));
    }

    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(&padded).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;

    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

mod serde_hex32 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hex32(&raw).map_err(D::Error::custom)
    }
}

/// Opaque account or contract address.
///
/// Used both for parties (callers, funds owners, admins) and for asset
/// references (the token component a transfer is routed to).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(#[serde(with = "serde_hex32")] [u8; 32]);

impl Address {
    /// The null identifier.
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Address whose low 8 bytes hold `value`; handy for fixtures.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Field-sized integer, big-endian.
///
/// Carries authorization nonces and hash outputs. The canonical zero is the
/// only nonce a self-initiated action may carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Field(#[serde(with = "serde_hex32")] [u8; 32]);

impl Field {
    pub const ZERO: Field = Field([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The value as `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }
}

impl From<u128> for Field {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::from(value as u128)
    }
}

impl From<Address> for Field {
    fn from(address: Address) -> Self {
        Self(address.0)
    }
}

impl FromStr for Field {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u128() {
            Some(small) => write!(f, "{small:#x}"),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

/// One-way value that permanently invalidates an authorization witness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nullifier(#[serde(with = "serde_hex32")] [u8; 32]);

impl Nullifier {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Which balance book a transfer touches and which witness flavour guards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Balances and amounts visible to outside observers.
    Public,
    /// Confidential balances.
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 4-byte function selector derived from an entry point name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSelector([u8; 4]);

impl FunctionSelector {
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(SELECTOR_DOMAIN.as_bytes());
        hasher.update(b"|");
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest.as_bytes()[..4]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A concrete call a witness can be scoped to: entry point plus arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub selector: FunctionSelector,
    pub args: Vec<Field>,
}

impl Action {
    pub fn new(selector: FunctionSelector, args: Vec<Field>) -> Self {
        Self { selector, args }
    }

    pub fn args_hash(&self) -> Field {
        let mut hasher = Hasher::new();
        hasher.update(ARGS_HASH_DOMAIN.as_bytes());
        hasher.update(&(self.args.len() as u64).to_be_bytes());
        for arg in &self.args {
            hasher.update(arg.as_bytes());
        }
        Field(*hasher.finalize().as_bytes())
    }
}

/// Inner hash of an action performed by `caller` against `contract`.
///
/// Binding the contract address keeps a witness granted to one deployment
/// from validating on another.
pub fn compute_inner_hash(contract: &Address, caller: &Address, action: &Action) -> Field {
    let mut hasher = Hasher::new();
    hasher.update(INNER_HASH_DOMAIN.as_bytes());
    hasher.update(b"|");
    hasher.update(contract.as_bytes());
    hasher.update(b"|");
    hasher.update(caller.as_bytes());
    hasher.update(b"|");
    hasher.update(action.selector.as_bytes());
    hasher.update(b"|");
    hasher.update(action.args_hash().as_bytes());
    Field(*hasher.finalize().as_bytes())
}

/// Nullifier that burns the witness `(authorizer, inner_hash)`.
pub fn compute_authwit_nullifier(authorizer: &Address, inner_hash: &Field) -> Nullifier {
    let mut hasher = Hasher::new();
    hasher.update(NULLIFIER_DOMAIN.as_bytes());
    hasher.update(b"|");
    hasher.update(authorizer.as_bytes());
    hasher.update(b"|");
    hasher.update(inner_hash.as_bytes());
    Nullifier(*hasher.finalize().as_bytes())
}
