//! Decode errors for contract bytecode.

use thiserror::Error;

/// Errors that occur while decoding contract bytecode or encoded values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte stream ended before a complete item was read.
    #[error("unexpected end of bytecode at offset {at}")]
    UnexpectedEnd { at: usize },

    /// Bytes remain after the contract descriptor was fully decoded.
    #[error("{count} trailing bytes after contract at offset {at}")]
    TrailingBytes { at: usize, count: usize },

    /// Opcode id falls in a reserved range.
    #[error("reserved opcode: {0:#04x}")]
    ReservedOpcode(u8),

    /// Data type tag in a reserved range.
    #[error("reserved data type: {0:#04x}")]
    ReservedDataType(u8),

    /// Function kind tag not recognized.
    #[error("invalid function kind: {0:#04x}")]
    InvalidFunctionKind(u8),

    /// Boolean payload other than 0 or 1.
    #[error("invalid boolean byte: {0:#04x}")]
    InvalidBoolean(u8),

    /// Optional-section marker other than 0 or 1.
    #[error("invalid presence flag: {0:#04x}")]
    InvalidFlag(u8),

    /// Text payload is not valid UTF-8.
    #[error("invalid UTF-8 in text at offset {at}")]
    InvalidUtf8 { at: usize },

    /// Text or big-integer payload longer than the format allows.
    #[error("payload of {len} bytes exceeds limit {max} at offset {at}")]
    PayloadTooLong { at: usize, len: usize, max: usize },
}
