//! Reference contracts for the ledger VM.
//!
//! - [`access_list`]: single-unit tokens gated by a whitelist or blacklist
//! - [`amm`]: constant-product market maker with escrowed deposits
//!
//! Each module exposes a constructor returning a validated contract plus
//! the slot indices and function ids needed to drive it.
//!
//! # Usage
//!
//! ```
//! use ledgervm_contracts::amm;
//!
//! let valid = amm::amm_contract().unwrap();
//! assert!(valid.function(amm::SET_SWAP).is_some());
//! ```

pub mod access_list;
pub mod amm;

mod body;

pub use access_list::{access_list_contract, blacklist_contract, whitelist_contract, ListPolicy};
pub use amm::amm_contract;
