//! Ledger contract common types and bytecode encoding.
//!
//! This crate provides the foundational data structures shared by the
//! builder, the VM and the reference contracts:
//!
//! - [`DataType`] / [`DataValue`]: typed values for registers and state slots
//! - [`OpcodeId`]: wire identifiers of every opcode
//! - [`Instruction`]: the opcode tagged union with fixed operand shapes
//! - [`Function`]: one trigger or public function body
//! - [`Contract`]: the full descriptor with its bytecode layout
//! - [`DecodeError`]: errors from decoding byte streams

pub mod codec;
pub mod contract;
pub mod data_type;
pub mod error;
pub mod function;
pub mod instruction;
pub mod opcode;
pub mod value;

// Re-export commonly used types at the crate root.
pub use contract::{Contract, FunctionSignature, StateMap, StateVar, Textual};
pub use data_type::DataType;
pub use error::DecodeError;
pub use function::{Function, FunctionId, FunctionKind};
pub use instruction::{Instruction, Reg, SlotIndex};
pub use opcode::OpcodeId;
pub use value::{Address, ContractId, ConvertError, DataValue, TokenId, ADDRESS_LENGTH};

/// Re-exported so downstream crates name the same big-integer type.
pub use num_bigint::BigInt;
