//! Pending transaction pool.
//!
//! The pool stores admitted transactions, in arrival order, until they are
//! sealed into a block.

use powchain_core::Transaction;

/// Transaction mempool.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    /// Pending transactions in arrival order.
    transactions: Vec<Transaction>,
}

impl Mempool {
    /// Create an empty mempool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction.
    pub fn add(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Copy of the pending transactions, in order.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Borrow the pending transactions.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Remove transactions that were sealed into a block.
    ///
    /// `sealed` is normally a prefix of the pool (the snapshot mining took);
    /// anything admitted after the snapshot stays. If the pool was rewritten in
    /// the meantime, each sealed transaction removes its first structural match.
    pub fn remove_sealed(&mut self, sealed: &[Transaction]) {
        if self.transactions.starts_with(sealed) {
            self.transactions.drain(..sealed.len());
            return;
        }
        for tx in sealed {
            if let Some(pos) = self.transactions.iter().position(|t| t == tx) {
                self.transactions.remove(pos);
            }
        }
    }

    /// Clear all transactions from the mempool.
    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}
