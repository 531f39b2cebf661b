//! Ledger virtual machine: executes validated contracts against state.
//!
//! The VM is a register machine with:
//! - A fixed-capacity register file of typed values
//! - Straight-line function bodies (no jumps, no loops)
//! - A per-invocation overlay on the state store, committed only on success
//!
//! # Usage
//!
//! ```
//! use ledgervm_builder::ContractBuilder;
//! use ledgervm_common::{Address, DataType, DataValue, Function, FunctionKind, FunctionSignature, Instruction};
//! use ledgervm_vm::{ContractInstance, Context, MemoryStore, StateStore};
//!
//! let valid = ContractBuilder::new(1)
//!     .state_var("owner", 0, DataType::Address)
//!     .trigger(
//!         FunctionSignature::new("init", &[]),
//!         Function::trigger(
//!             0,
//!             FunctionKind::OnInit,
//!             vec![],
//!             vec![
//!                 Instruction::LoadSigner { dest: 0 },
//!                 Instruction::CdbvSet { var: 0, value: 0 },
//!             ],
//!         ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let owner = Address([7; 26]);
//! let ctx = Context::signed_by(owner);
//! let instance = ContractInstance::deploy(valid, MemoryStore::new(), &ctx, vec![]).unwrap();
//! assert_eq!(instance.store().var(0), Some(DataValue::Address(owner)));
//! ```

pub mod arith;
pub mod context;
pub mod error;
pub mod execute;
pub mod instance;
pub mod machine;
pub mod registers;
pub mod state;
pub mod token;

pub use context::Context;
pub use error::{DeployError, ErrorKind, ExecError, TokenError};
pub use instance::{run_function, ContractInstance};
pub use machine::Machine;
pub use registers::Registers;
pub use state::{MemoryStore, Overlay, StateStore, TokenInfo, WriteSet};
