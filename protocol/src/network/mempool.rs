//! Pending transaction pool.
//!
//! Transactions wait here, in arrival order, until the next block is forged.
//! Forging drains the whole pool into the block. There is no fee ordering,
//! no deduplication and no expiry: duplicates are legal and order is part of
//! the block hash.
//!
//! The pool itself is not synchronized. The [`crate::ledger::Ledger`] keeps
//! it under the same lock as the chain so draining and appending a block are
//! one atomic step.

use std::fmt;

use crate::transaction::Transaction;

/// Ordered pending transactions.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl fmt::Debug for TransactionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionPool")
            .field("size", &self.pending.len())
            .finish()
    }
}

impl TransactionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction at the back of the queue.
    pub fn push(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Removes and returns every pending transaction, oldest first.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Borrow the pending transactions in arrival order.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order_and_duplicates() {
        let mut pool = TransactionPool::new();
        let a = Transaction::new("alice", "bob", 1);
        let b = Transaction::new("bob", "carol", 2);
        pool.push(a.clone());
        pool.push(b.clone());
        pool.push(a.clone());

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.pending(), &[a.clone(), b, a][..]);
    }

    #[test]
    fn drain_empties_pool() {
        let mut pool = TransactionPool::new();
        pool.push(Transaction::new("alice", "bob", 1));
        pool.push(Transaction::new("alice", "bob", 2));

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].amount, 1);
        assert!(pool.is_empty());
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn debug_shows_size_only() {
        let mut pool = TransactionPool::new();
        pool.push(Transaction::new("alice", "bob", 1));
        assert_eq!(format!("{:?}", pool), "TransactionPool { size: 1 }");
    }
}
