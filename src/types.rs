//! Value types shared by the session, the gateways and the CLI.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::{self, NATIVE_DECIMALS};

/// Account identifier as issued by the wallet (opaque to us)
pub type Account = String;

/// Transaction hash as returned by the provider
pub type TxHash = String;

/// An amount in smallest units together with its display precision.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn native(raw: U256) -> Self {
        Self::new(raw, NATIVE_DECIMALS)
    }

    /// Parse a decimal string in native precision ("1.5" ether).
    pub fn parse_native(value: &str) -> Result<Self, units::UnitError> {
        Ok(Self::native(units::parse_units(value, NATIVE_DECIMALS)?))
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", units::format_units(self.raw, self.decimals))
    }
}

/// A historical transaction touching the active account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub hash: TxHash,
    pub value: Amount,
    pub from: Account,
    pub to: Option<Account>,
    /// The other side of the transfer relative to the account the history was fetched for
    pub counterpart: Account,
    pub block_number: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Hash shortened to 20 characters for list display.
    pub fn short_hash(&self) -> String {
        let mut chars = self.hash.chars();
        let head: String = chars.by_ref().take(20).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Outbound native transfer handed to the provider for signing and broadcast.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Account,
    pub to: Account,
    pub value: Amount,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// Confirmation of a mined transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    pub status: TxStatus,
    pub gas_used: U256,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }
}
