//! Transaction records produced by message delivery

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::coins::Coins;

/// Outcome of delivering one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub value: Coins,
    /// Op code of the body, `None` for plain transfers.
    pub op: Option<u32>,
    pub success: bool,
    /// Exit code of a failed transaction.
    pub exit_code: Option<u32>,
    /// Messages emitted by the recipient.
    pub outbound: usize,
    /// The message is a bounce of an earlier failure.
    pub bounced: bool,
    pub now: u64,
}

/// Expected transaction fields; unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<Coins>,
    pub op: Option<u32>,
    pub success: Option<bool>,
    pub exit_code: Option<u32>,
}

impl TxFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.from.map_or(true, |a| a == tx.from)
            && self.to.map_or(true, |a| a == tx.to)
            && self.value.map_or(true, |v| v == tx.value)
            && self.op.map_or(true, |op| tx.op == Some(op))
            && self.success.map_or(true, |s| s == tx.success)
            && self.exit_code.map_or(true, |c| tx.exit_code == Some(c))
    }
}

/// All transactions caused by one external message, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub transactions: Vec<Transaction>,
}

impl SendResult {
    pub fn has_transaction(&self, filter: &TxFilter) -> bool {
        self.transactions.iter().any(|tx| filter.matches(tx))
    }

    pub fn count(&self, filter: &TxFilter) -> usize {
        self.transactions.iter().filter(|tx| filter.matches(tx)).count()
    }

    /// The first transaction, i.e. the external message itself.
    pub fn head(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| !tx.success)
    }

    /// Sum of successful value deliveries to `to`, `None` on overflow.
    pub fn received_by(&self, to: &Address) -> Option<Coins> {
        Coins::checked_sum(
            self.transactions
                .iter()
                .filter(|tx| tx.success && tx.to == *to)
                .map(|tx| tx.value),
        )
    }

    pub(crate) fn extend(&mut self, other: SendResult) {
        self.transactions.extend(other.transactions);
    }
}
