//! Persistent contract state and the per-invocation overlay.
//!
//! A [`StateStore`] holds committed state: state var slots, state map
//! entries, token definitions and token balances. During an invocation all
//! reads and writes go through an [`Overlay`], which buffers writes in a
//! [`WriteSet`] and reads through to the base for anything not yet
//! written. The write set reaches the store in one [`StateStore::apply`]
//! call only when the invocation succeeds; on failure it is dropped.

use std::collections::BTreeMap;

use ledgervm_common::{Address, DataValue, SlotIndex};

/// A token defined by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub max_supply: i64,
    pub unit: i64,
    pub description: String,
    /// Units deposited so far. Never exceeds `max_supply`.
    pub issued: i64,
}

/// Committed state of one contract.
pub trait StateStore {
    /// Value of state var `index`, if it has been written.
    fn var(&self, index: SlotIndex) -> Option<DataValue>;
    /// Entry `key` of state map `index`, if it has been written.
    fn map_entry(&self, index: SlotIndex, key: &DataValue) -> Option<DataValue>;
    /// Definition of token `index`.
    fn token(&self, index: u32) -> Option<TokenInfo>;
    /// Number of tokens defined so far. Token indices are `0..token_count()`.
    fn token_count(&self) -> u32;
    /// Balance of `holder` in token `index`. Absent balances are zero.
    fn balance(&self, index: u32, holder: &Address) -> i64;
    /// Apply a committed write set as a single unit.
    fn apply(&mut self, writes: WriteSet);
}

/// Buffered writes of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    pub vars: BTreeMap<SlotIndex, DataValue>,
    pub map_entries: BTreeMap<(SlotIndex, DataValue), DataValue>,
    pub tokens: BTreeMap<u32, TokenInfo>,
    pub balances: BTreeMap<(u32, Address), i64>,
    pub token_count: Option<u32>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buffered writes.
    pub fn len(&self) -> usize {
        self.vars.len()
            + self.map_entries.len()
            + self.tokens.len()
            + self.balances.len()
            + usize::from(self.token_count.is_some())
    }
}

/// In-memory state store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    vars: BTreeMap<SlotIndex, DataValue>,
    map_entries: BTreeMap<(SlotIndex, DataValue), DataValue>,
    tokens: Vec<TokenInfo>,
    balances: BTreeMap<(u32, Address), i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every written entry of state map `index`, in key order.
    pub fn map_entries(&self, index: SlotIndex) -> impl Iterator<Item = (&DataValue, &DataValue)> {
        self.map_entries
            .iter()
            .filter(move |((i, _), _)| *i == index)
            .map(|((_, k), v)| (k, v))
    }
}

impl StateStore for MemoryStore {
    fn var(&self, index: SlotIndex) -> Option<DataValue> {
        self.vars.get(&index).cloned()
    }

    fn map_entry(&self, index: SlotIndex, key: &DataValue) -> Option<DataValue> {
        self.map_entries.get(&(index, key.clone())).cloned()
    }

    fn token(&self, index: u32) -> Option<TokenInfo> {
        self.tokens.get(index as usize).cloned()
    }

    fn token_count(&self) -> u32 {
        self.tokens.len() as u32
    }

    fn balance(&self, index: u32, holder: &Address) -> i64 {
        self.balances.get(&(index, *holder)).copied().unwrap_or(0)
    }

    fn apply(&mut self, writes: WriteSet) {
        self.vars.extend(writes.vars);
        self.map_entries.extend(writes.map_entries);
        for (index, info) in writes.tokens {
            let index = index as usize;
            if index < self.tokens.len() {
                self.tokens[index] = info;
            } else {
                self.tokens.push(info);
            }
        }
        self.balances.extend(writes.balances);
    }
}

/// Write-buffering overlay on top of a base store.
pub struct Overlay<'a> {
    base: &'a dyn StateStore,
    pub(crate) writes: WriteSet,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a dyn StateStore) -> Self {
        Self {
            base,
            writes: WriteSet::default(),
        }
    }

    /// Consume the overlay, returning the pending writes.
    pub fn into_writes(self) -> WriteSet {
        self.writes
    }

    pub fn var(&self, index: SlotIndex) -> Option<DataValue> {
        match self.writes.vars.get(&index) {
            Some(v) => Some(v.clone()),
            None => self.base.var(index),
        }
    }

    pub fn set_var(&mut self, index: SlotIndex, value: DataValue) {
        self.writes.vars.insert(index, value);
    }

    pub fn map_entry(&self, index: SlotIndex, key: &DataValue) -> Option<DataValue> {
        match self.writes.map_entries.get(&(index, key.clone())) {
            Some(v) => Some(v.clone()),
            None => self.base.map_entry(index, key),
        }
    }

    pub fn set_map_entry(&mut self, index: SlotIndex, key: DataValue, value: DataValue) {
        self.writes.map_entries.insert((index, key), value);
    }

    pub fn token(&self, index: u32) -> Option<TokenInfo> {
        match self.writes.tokens.get(&index) {
            Some(t) => Some(t.clone()),
            None => self.base.token(index),
        }
    }

    pub(crate) fn put_token(&mut self, index: u32, info: TokenInfo) {
        self.writes.tokens.insert(index, info);
    }

    pub fn token_count(&self) -> u32 {
        self.writes
            .token_count
            .unwrap_or_else(|| self.base.token_count())
    }

    pub(crate) fn set_token_count(&mut self, count: u32) {
        self.writes.token_count = Some(count);
    }

    pub fn balance(&self, index: u32, holder: &Address) -> i64 {
        match self.writes.balances.get(&(index, *holder)) {
            Some(b) => *b,
            None => self.base.balance(index, holder),
        }
    }

    pub(crate) fn set_balance(&mut self, index: u32, holder: Address, balance: i64) {
        self.writes.balances.insert((index, holder), balance);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 26])
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        let mut w = WriteSet::default();
        w.vars.insert(0, DataValue::Amount(10));
        w.map_entries
            .insert((0, DataValue::Address(addr(1))), DataValue::Boolean(true));
        w.balances.insert((0, addr(1)), 5);
        store.apply(w);
        store
    }

    #[test]
    fn overlay_reads_through_to_base() {
        let base = seeded();
        let overlay = Overlay::new(&base);
        assert_eq!(overlay.var(0), Some(DataValue::Amount(10)));
        assert_eq!(overlay.var(1), None);
        assert_eq!(
            overlay.map_entry(0, &DataValue::Address(addr(1))),
            Some(DataValue::Boolean(true))
        );
        assert_eq!(overlay.balance(0, &addr(1)), 5);
        assert_eq!(overlay.balance(0, &addr(2)), 0);
    }

    #[test]
    fn overlay_write_shadows_base() {
        let base = seeded();
        let mut overlay = Overlay::new(&base);
        overlay.set_var(0, DataValue::Amount(11));
        overlay.set_balance(0, addr(1), 4);
        assert_eq!(overlay.var(0), Some(DataValue::Amount(11)));
        assert_eq!(overlay.balance(0, &addr(1)), 4);
        // Base is untouched until apply.
        assert_eq!(base.var(0), Some(DataValue::Amount(10)));
    }

    #[test]
    fn map_keys_are_typed() {
        let base = seeded();
        let overlay = Overlay::new(&base);
        assert_eq!(overlay.map_entry(0, &DataValue::Account(addr(1))), None);
    }

    #[test]
    fn apply_commits_every_write() {
        let mut base = seeded();
        let writes = {
            let mut overlay = Overlay::new(&base);
            overlay.set_var(3, DataValue::Boolean(false));
            overlay.put_token(
                0,
                TokenInfo {
                    max_supply: 1,
                    unit: 1,
                    description: "deed".to_string(),
                    issued: 0,
                },
            );
            overlay.set_token_count(1);
            overlay.into_writes()
        };
        assert_eq!(writes.len(), 3);
        base.apply(writes);
        assert_eq!(base.var(3), Some(DataValue::Boolean(false)));
        assert_eq!(base.token_count(), 1);
        assert_eq!(base.token(0).map(|t| t.description), Some("deed".to_string()));
    }

    #[test]
    fn dropped_overlay_leaves_base_untouched() {
        let base = seeded();
        let before = base.clone();
        {
            let mut overlay = Overlay::new(&base);
            overlay.set_var(0, DataValue::Amount(0));
        }
        assert_eq!(base, before);
    }

    #[test]
    fn map_entries_iterates_one_map() {
        let mut store = seeded();
        let mut w = WriteSet::default();
        w.map_entries
            .insert((1, DataValue::Int32(0)), DataValue::Int32(1));
        store.apply(w);
        assert_eq!(store.map_entries(0).count(), 1);
        assert_eq!(store.map_entries(1).count(), 1);
    }
}
