//! Build errors for contract descriptors.
//!
//! Errors that concern one opcode carry the owning function id and the
//! instruction index (`at`). The builder collects ALL errors, not just the
//! first.

use ledgervm_common::{DataType, DecodeError, FunctionId, Reg, SlotIndex};
use thiserror::Error;

/// Which function list of a descriptor an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Triggers,
    Functions,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Triggers => f.write_str("trigger"),
            Namespace::Functions => f.write_str("function"),
        }
    }
}

/// Errors found while validating a contract descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Bytecode did not decode to a descriptor.
    #[error("bytecode could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    // --- Limits ---
    #[error("too many {namespace}s: {count} (max {max})")]
    TooManyFunctions {
        namespace: Namespace,
        count: usize,
        max: usize,
    },

    #[error("{namespace} {function} has {len} instructions (max {max})")]
    FunctionTooLong {
        namespace: Namespace,
        function: FunctionId,
        len: usize,
        max: usize,
    },

    #[error("{namespace} {function} declares {count} parameters (max {max})")]
    TooManyParams {
        namespace: Namespace,
        function: FunctionId,
        count: usize,
        max: usize,
    },

    #[error("{namespace} {function} declares {count} return types (max {max})")]
    TooManyReturns {
        namespace: Namespace,
        function: FunctionId,
        count: usize,
        max: usize,
    },

    #[error("big integer literal of {len} bytes in {namespace} {function} at instruction {at} (max {max})")]
    BigIntegerTooLong {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        len: usize,
        max: usize,
    },

    #[error("limit {limit} = {value} exceeds what bytecode can carry ({max})")]
    LimitAboveFormat {
        limit: &'static str,
        value: usize,
        max: usize,
    },

    #[error("short text literal of {len} bytes in {namespace} {function} at instruction {at} (max {max})")]
    TextTooLong {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        len: usize,
        max: usize,
    },

    // --- Header ---
    #[error("unsupported language id {found:?}")]
    UnsupportedLanguage { found: String },

    #[error("unsupported language version {version}")]
    UnsupportedVersion { version: i32 },

    #[error("{mnemonic} in {namespace} {function} at instruction {at} requires version {required}, contract is version {version}")]
    RequiresVersion {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        mnemonic: &'static str,
        required: i32,
        version: i32,
    },

    // --- Structural ---
    #[error("duplicate {namespace} id {id}")]
    DuplicateFunctionId { namespace: Namespace, id: FunctionId },

    #[error("contract declares no init trigger")]
    MissingInitTrigger,

    #[error("contract declares {count} init triggers")]
    MultipleInitTriggers { count: usize },

    #[error("{namespace} list holds {id} of the wrong kind")]
    MisplacedFunction { namespace: Namespace, id: FunctionId },

    #[error("duplicate state var index {index}")]
    DuplicateStateVar { index: SlotIndex },

    #[error("duplicate state map index {index}")]
    DuplicateStateMap { index: SlotIndex },

    // --- Bounds ---
    #[error("undeclared state var {index} in {namespace} {function} at instruction {at}")]
    UndeclaredStateVar {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        index: SlotIndex,
    },

    #[error("undeclared state map {index} in {namespace} {function} at instruction {at}")]
    UndeclaredStateMap {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        index: SlotIndex,
    },

    #[error("register {register} out of range in {namespace} {function} at instruction {at} (capacity {capacity})")]
    RegisterOutOfRange {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        register: Reg,
        capacity: usize,
    },

    #[error("trigger {function} matches tokens on state var {index}, which is not a declared TokenId var")]
    InvalidTokenVar { function: FunctionId, index: SlotIndex },

    // --- Registers and types ---
    #[error("register {register} read before write in {namespace} {function} at instruction {at}")]
    UndefinedRegister {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        register: Reg,
    },

    #[error("type mismatch in {namespace} {function} at instruction {at}: expected {expected}, found {found}")]
    TypeMismatch {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        expected: DataType,
        found: DataType,
    },

    #[error("{found} operand is not valid for {mnemonic} in {namespace} {function} at instruction {at}")]
    InvalidOperandType {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        mnemonic: &'static str,
        found: DataType,
    },

    #[error("no conversion from {from} to {to} in {namespace} {function} at instruction {at}")]
    UnsupportedConversion {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        from: DataType,
        to: DataType,
    },

    #[error("{data_type} has no default value, used by {namespace} {function} at instruction {at}")]
    NoDefaultValue {
        namespace: Namespace,
        function: FunctionId,
        at: usize,
        data_type: DataType,
    },

    // --- Textual ---
    #[error("textual metadata lists {found} {section} entries, descriptor has {expected}")]
    TextualCountMismatch {
        section: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{section} name of {len} bytes (max {max})")]
    NameTooLong {
        section: &'static str,
        len: usize,
        max: usize,
    },

    #[error("signature of {namespace} {function} names {found} {what}, function declares {expected}")]
    SignatureMismatch {
        namespace: Namespace,
        function: FunctionId,
        what: &'static str,
        expected: usize,
        found: usize,
    },
}
