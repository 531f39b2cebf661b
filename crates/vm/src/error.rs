//! Runtime errors for the ledger VM.
//!
//! Errors raised by an opcode carry its instruction index (`at`).
//! Invocation-level errors (unknown function, bad arguments) carry none.
//! Every error maps to exactly one [`ErrorKind`].

use ledgervm_builder::BuildError;
use ledgervm_common::{ConvertError, DataType, FunctionId, Reg, SlotIndex, TokenId};
use thiserror::Error;

/// Coarse failure classes shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthorizationError,
    AssertionError,
    TypeMismatch,
    ArithmeticError,
    UninitializedState,
    UndefinedRegister,
    InsufficientBalance,
    DeadlineExceeded,
    BuildError,
}

/// Token ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown token index {index}")]
    UnknownToken { index: i64 },

    #[error("amount {amount} is not positive")]
    NonPositiveAmount { amount: i64 },

    #[error("invalid token definition: max supply {max_supply}, unit {unit}")]
    InvalidDefinition { max_supply: i64, unit: i64 },

    #[error("deposit of {amount} exceeds max supply {max_supply} (issued {issued})")]
    SupplyExceeded {
        amount: i64,
        issued: i64,
        max_supply: i64,
    },

    #[error("balance {balance} is less than {amount}")]
    InsufficientBalance { balance: i64, amount: i64 },

    #[error("token balance overflow")]
    Overflow,
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::UnknownToken { .. } => ErrorKind::UninitializedState,
            TokenError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            TokenError::NonPositiveAmount { .. }
            | TokenError::InvalidDefinition { .. }
            | TokenError::SupplyExceeded { .. }
            | TokenError::Overflow => ErrorKind::ArithmeticError,
        }
    }
}

/// Errors that abort an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    // --- Invocation ---
    #[error("no public function with id {id}")]
    UnknownFunction { id: FunctionId },

    #[error("contract has no {kind} trigger")]
    MissingTrigger { kind: &'static str },

    #[error("contract does not accept deposits or withdrawals of {token:?}")]
    UnacceptedToken { token: TokenId },

    #[error("expected {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {index}: expected {expected}, got {found}")]
    ArgumentType {
        index: usize,
        expected: DataType,
        found: DataType,
    },

    #[error("argument {index}: payload of {len} bytes exceeds {max}")]
    ArgumentTooLong { index: usize, len: usize, max: usize },

    // --- Registers ---
    #[error("register {register} read before write at instruction {at}")]
    UndefinedRegister { at: usize, register: Reg },

    #[error("register {register} out of range at instruction {at}")]
    RegisterOutOfRange { at: usize, register: Reg },

    #[error("type mismatch at instruction {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: usize,
        expected: DataType,
        found: DataType,
    },

    #[error("{found} operand is not valid for {mnemonic} at instruction {at}")]
    InvalidOperand {
        at: usize,
        mnemonic: &'static str,
        found: DataType,
    },

    // --- Context ---
    #[error("execution context has no {field} at instruction {at}")]
    MissingContext { at: usize, field: &'static str },

    #[error("no token has been created yet at instruction {at}")]
    NoTokens { at: usize },

    // --- Assertions ---
    #[error("account is not the transaction signer at instruction {at}")]
    NotSigner { at: usize },

    #[error("account is not the caller at instruction {at}")]
    NotCaller { at: usize },

    #[error("permission denied at instruction {at}")]
    NotPermitted { at: usize },

    #[error("assertion failed at instruction {at}")]
    AssertionFailed { at: usize },

    #[error("values differ at instruction {at}")]
    NotEqual { at: usize },

    #[error("deadline {deadline} passed at {now} (instruction {at})")]
    DeadlineExceeded { at: usize, now: i64, deadline: i64 },

    // --- Arithmetic ---
    #[error("arithmetic overflow at instruction {at}")]
    Overflow { at: usize },

    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    #[error("square root of a negative number at instruction {at}")]
    NegativeSqrt { at: usize },

    #[error("conversion failed at instruction {at}: {source}")]
    Conversion { at: usize, source: ConvertError },

    #[error("delta must be positive at instruction {at}")]
    NonPositiveDelta { at: usize },

    // --- State ---
    #[error("state var {index} is not declared (instruction {at})")]
    UndeclaredStateVar { at: usize, index: SlotIndex },

    #[error("state map {index} is not declared (instruction {at})")]
    UndeclaredStateMap { at: usize, index: SlotIndex },

    #[error("state var {index} is unset at instruction {at}")]
    UnsetStateVar { at: usize, index: SlotIndex },

    #[error("state map {index} has no entry for the key at instruction {at}")]
    UnsetMapEntry { at: usize, index: SlotIndex },

    #[error("{data_type} has no default value (instruction {at})")]
    NoDefaultValue { at: usize, data_type: DataType },

    #[error("state slot would go negative at instruction {at}")]
    StateUnderflow { at: usize },

    #[error("token ledger at instruction {at}: {source}")]
    Token { at: usize, source: TokenError },
}

impl ExecError {
    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        use ExecError::*;
        match self {
            UnknownFunction { .. }
            | MissingTrigger { .. }
            | AssertionFailed { .. }
            | NotEqual { .. } => ErrorKind::AssertionError,
            UnacceptedToken { .. }
            | ArgumentCount { .. }
            | ArgumentType { .. }
            | ArgumentTooLong { .. }
            | TypeMismatch { .. }
            | InvalidOperand { .. } => ErrorKind::TypeMismatch,
            UndefinedRegister { .. } | RegisterOutOfRange { .. } => ErrorKind::UndefinedRegister,
            MissingContext { .. }
            | NoTokens { .. }
            | UndeclaredStateVar { .. }
            | UndeclaredStateMap { .. }
            | UnsetStateVar { .. }
            | UnsetMapEntry { .. }
            | NoDefaultValue { .. } => ErrorKind::UninitializedState,
            NotSigner { .. } | NotCaller { .. } | NotPermitted { .. } => {
                ErrorKind::AuthorizationError
            }
            DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Overflow { .. } | DivisionByZero { .. } | NegativeSqrt { .. } | NonPositiveDelta { .. } => {
                ErrorKind::ArithmeticError
            }
            Conversion { source, .. } => match source {
                ConvertError::Unsupported { .. } => ErrorKind::TypeMismatch,
                ConvertError::OutOfRange { .. } => ErrorKind::ArithmeticError,
            },
            StateUnderflow { .. } => ErrorKind::InsufficientBalance,
            Token { source, .. } => source.kind(),
        }
    }
}

/// Errors from deploying raw bytecode: either it never became a valid
/// contract, or its init trigger failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("contract rejected with {} build errors", .0.len())]
    Build(Vec<BuildError>),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Build(_) => ErrorKind::BuildError,
            DeployError::Exec(e) => e.kind(),
        }
    }
}
