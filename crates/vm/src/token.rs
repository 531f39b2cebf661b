//! Token ledger operations on the invocation overlay.
//!
//! Tokens are numbered from zero in creation order. Amounts must be
//! positive; a deposit mints new units and may not push the issued supply
//! past the maximum.

use crate::error::TokenError;
use crate::state::{Overlay, TokenInfo};
use ledgervm_common::Address;

impl Overlay<'_> {
    /// Define a new token and return its index.
    pub fn new_token(
        &mut self,
        max_supply: i64,
        unit: i64,
        description: String,
    ) -> Result<u32, TokenError> {
        if max_supply <= 0 || unit <= 0 {
            return Err(TokenError::InvalidDefinition { max_supply, unit });
        }
        let index = self.token_count();
        let next = index.checked_add(1).ok_or(TokenError::Overflow)?;
        self.put_token(
            index,
            TokenInfo {
                max_supply,
                unit,
                description,
                issued: 0,
            },
        );
        self.set_token_count(next);
        Ok(index)
    }

    /// Mint `amount` units of token `index` to `holder`.
    pub fn deposit(&mut self, index: i64, holder: Address, amount: i64) -> Result<(), TokenError> {
        check_amount(amount)?;
        let (index, mut info) = self.known_token(index)?;
        let issued = info
            .issued
            .checked_add(amount)
            .filter(|issued| *issued <= info.max_supply)
            .ok_or(TokenError::SupplyExceeded {
                amount,
                issued: info.issued,
                max_supply: info.max_supply,
            })?;
        let balance = self
            .balance(index, &holder)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        info.issued = issued;
        self.put_token(index, info);
        self.set_balance(index, holder, balance);
        Ok(())
    }

    /// Move `amount` units of token `index` from `from` to `to`.
    pub fn transfer(
        &mut self,
        index: i64,
        from: Address,
        to: Address,
        amount: i64,
    ) -> Result<(), TokenError> {
        check_amount(amount)?;
        let (index, _) = self.known_token(index)?;
        let from_balance = self.balance(index, &from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                balance: from_balance,
                amount,
            });
        }
        self.set_balance(index, from, from_balance - amount);
        let to_balance = self
            .balance(index, &to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.set_balance(index, to, to_balance);
        Ok(())
    }

    /// Balance of `holder` in token `index`.
    pub fn balance_of(&self, index: i64, holder: &Address) -> Result<i64, TokenError> {
        let (index, _) = self.known_token(index)?;
        Ok(self.balance(index, holder))
    }

    fn known_token(&self, index: i64) -> Result<(u32, TokenInfo), TokenError> {
        u32::try_from(index)
            .ok()
            .and_then(|i| self.token(i).map(|info| (i, info)))
            .ok_or(TokenError::UnknownToken { index })
    }
}

fn check_amount(amount: i64) -> Result<(), TokenError> {
    if amount <= 0 {
        return Err(TokenError::NonPositiveAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MemoryStore, StateStore};

    fn addr(b: u8) -> Address {
        Address([b; 26])
    }

    #[test]
    fn tokens_are_numbered_in_order() {
        let base = MemoryStore::new();
        let mut overlay = Overlay::new(&base);
        assert_eq!(overlay.new_token(1, 1, "a".to_string()), Ok(0));
        assert_eq!(overlay.new_token(5, 1, "b".to_string()), Ok(1));
        assert_eq!(overlay.token_count(), 2);
    }

    #[test]
    fn invalid_definition_rejected() {
        let base = MemoryStore::new();
        let mut overlay = Overlay::new(&base);
        assert_eq!(
            overlay.new_token(0, 1, String::new()),
            Err(TokenError::InvalidDefinition {
                max_supply: 0,
                unit: 1
            })
        );
    }

    #[test]
    fn deposit_respects_max_supply() {
        let base = MemoryStore::new();
        let mut overlay = Overlay::new(&base);
        overlay.new_token(3, 1, "t".to_string()).unwrap();
        overlay.deposit(0, addr(1), 2).unwrap();
        assert_eq!(
            overlay.deposit(0, addr(2), 2),
            Err(TokenError::SupplyExceeded {
                amount: 2,
                issued: 2,
                max_supply: 3
            })
        );
        overlay.deposit(0, addr(2), 1).unwrap();
        assert_eq!(overlay.balance_of(0, &addr(1)), Ok(2));
        assert_eq!(overlay.balance_of(0, &addr(2)), Ok(1));
    }

    #[test]
    fn transfer_moves_units() {
        let mut base = MemoryStore::new();
        let writes = {
            let mut overlay = Overlay::new(&base);
            overlay.new_token(10, 1, "t".to_string()).unwrap();
            overlay.deposit(0, addr(1), 10).unwrap();
            overlay.into_writes()
        };
        base.apply(writes);

        let mut overlay = Overlay::new(&base);
        overlay.transfer(0, addr(1), addr(2), 4).unwrap();
        assert_eq!(overlay.balance_of(0, &addr(1)), Ok(6));
        assert_eq!(overlay.balance_of(0, &addr(2)), Ok(4));
        assert_eq!(
            overlay.transfer(0, addr(2), addr(1), 5),
            Err(TokenError::InsufficientBalance {
                balance: 4,
                amount: 5
            })
        );
    }

    #[test]
    fn non_positive_amounts_rejected() {
        let base = MemoryStore::new();
        let mut overlay = Overlay::new(&base);
        overlay.new_token(10, 1, "t".to_string()).unwrap();
        assert_eq!(
            overlay.deposit(0, addr(1), 0),
            Err(TokenError::NonPositiveAmount { amount: 0 })
        );
        assert_eq!(
            overlay.transfer(0, addr(1), addr(2), -3),
            Err(TokenError::NonPositiveAmount { amount: -3 })
        );
    }

    #[test]
    fn unknown_token_rejected() {
        let base = MemoryStore::new();
        let overlay = Overlay::new(&base);
        assert_eq!(
            overlay.balance_of(0, &addr(1)),
            Err(TokenError::UnknownToken { index: 0 })
        );
        assert_eq!(
            overlay.balance_of(-1, &addr(1)),
            Err(TokenError::UnknownToken { index: -1 })
        );
    }
}
