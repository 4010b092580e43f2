//! Core type definitions for ledger transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MINING_REWARD_AMOUNT, MINING_REWARD_SENDER};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A value transfer waiting for, or included in, a block.
///
/// `amount` is an opaque integral quantity in the smallest unit. The ledger
/// never interprets it beyond hashing it into the block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier of the paying party.
    pub sender: String,
    /// Identifier of the receiving party.
    pub recipient: String,
    /// Transferred quantity.
    pub amount: u64,
}

impl Transaction {
    /// Creates a transaction from its three fields.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// The reward a node pays itself for forging a block. The sender is the
    /// `"0"` sentinel, meaning the amount is newly minted.
    pub fn mining_reward(recipient: impl Into<String>) -> Self {
        Self::new(MINING_REWARD_SENDER, recipient, MINING_REWARD_AMOUNT)
    }

    /// Returns `true` if this is a reward transaction.
    pub fn is_mining_reward(&self) -> bool {
        self.sender == MINING_REWARD_SENDER
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.sender, self.recipient, self.amount)
    }
}
