//! Per-invocation execution context supplied by the transaction processor.

use ledgervm_common::Address;

/// Who signed and who called, and when.
///
/// Every field is optional; opcodes that need a missing field fail with an
/// uninitialized-state error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    pub signer: Option<Address>,
    pub caller: Option<Address>,
    pub timestamp: Option<i64>,
}

impl Context {
    /// A context where `account` both signed and called.
    pub fn signed_by(account: Address) -> Self {
        Self {
            signer: Some(account),
            caller: Some(account),
            timestamp: None,
        }
    }

    pub fn with_caller(mut self, caller: Address) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
