//! Opcode identifiers for the contract instruction set.
//!
//! The identifier is the first byte of every encoded instruction. Operand
//! shapes live on [`Instruction`](crate::Instruction).

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute gives each variant its stable wire byte.
/// Ids are grouped by category in blocks of 16.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeId {
    // Load context values
    LoadSigner = 0x01,
    LoadCaller = 0x02,
    LoadTimestamp = 0x03,
    LoadLastTokenIndex = 0x04,

    // Assertions
    AssertSigner = 0x10,
    AssertCaller = 0x11,
    AssertTrue = 0x12,
    AssertEqual = 0x13,
    /// Boolean check that fails as an authorization error.
    AssertPermitted = 0x14,
    /// Timestamp deadline check.
    AssertNotExpired = 0x15,

    // Constants and arithmetic
    ConstantGet = 0x20,
    Add = 0x21,
    Minus = 0x22,
    Multiply = 0x23,
    Divide = 0x24,
    Min = 0x25,
    Max = 0x26,
    SqrtBigint = 0x27,
    Convert = 0x28,
    Not = 0x29,

    // Comparison
    CompareGreater = 0x30,
    CompareGreaterEqual = 0x31,

    // State variables
    CdbvSet = 0x40,
    CdbvrGet = 0x41,
    CdbvrGetOrDefault = 0x42,
    CdbvStateValAdd = 0x43,
    CdbvStateValMinus = 0x44,

    // State maps
    CdbvMapSet = 0x50,
    CdbvMapValAdd = 0x51,
    CdbvMapValMinus = 0x52,
    CdbvrMapGet = 0x53,
    CdbvrMapGetOrDefault = 0x54,

    // Token ledger
    TdbNewToken = 0x60,
    TdbaDeposit = 0x61,
    TdbaTransfer = 0x62,
    TdbarBalance = 0x63,
}

/// All valid opcode ids, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODE_IDS: [OpcodeId; 36] = [
    OpcodeId::LoadSigner,
    OpcodeId::LoadCaller,
    OpcodeId::LoadTimestamp,
    OpcodeId::LoadLastTokenIndex,
    OpcodeId::AssertSigner,
    OpcodeId::AssertCaller,
    OpcodeId::AssertTrue,
    OpcodeId::AssertEqual,
    OpcodeId::AssertPermitted,
    OpcodeId::AssertNotExpired,
    OpcodeId::ConstantGet,
    OpcodeId::Add,
    OpcodeId::Minus,
    OpcodeId::Multiply,
    OpcodeId::Divide,
    OpcodeId::Min,
    OpcodeId::Max,
    OpcodeId::SqrtBigint,
    OpcodeId::Convert,
    OpcodeId::Not,
    OpcodeId::CompareGreater,
    OpcodeId::CompareGreaterEqual,
    OpcodeId::CdbvSet,
    OpcodeId::CdbvrGet,
    OpcodeId::CdbvrGetOrDefault,
    OpcodeId::CdbvStateValAdd,
    OpcodeId::CdbvStateValMinus,
    OpcodeId::CdbvMapSet,
    OpcodeId::CdbvMapValAdd,
    OpcodeId::CdbvMapValMinus,
    OpcodeId::CdbvrMapGet,
    OpcodeId::CdbvrMapGetOrDefault,
    OpcodeId::TdbNewToken,
    OpcodeId::TdbaDeposit,
    OpcodeId::TdbaTransfer,
    OpcodeId::TdbarBalance,
];

impl TryFrom<u8> for OpcodeId {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(OpcodeId::LoadSigner),
            0x02 => Ok(OpcodeId::LoadCaller),
            0x03 => Ok(OpcodeId::LoadTimestamp),
            0x04 => Ok(OpcodeId::LoadLastTokenIndex),

            0x10 => Ok(OpcodeId::AssertSigner),
            0x11 => Ok(OpcodeId::AssertCaller),
            0x12 => Ok(OpcodeId::AssertTrue),
            0x13 => Ok(OpcodeId::AssertEqual),
            0x14 => Ok(OpcodeId::AssertPermitted),
            0x15 => Ok(OpcodeId::AssertNotExpired),

            0x20 => Ok(OpcodeId::ConstantGet),
            0x21 => Ok(OpcodeId::Add),
            0x22 => Ok(OpcodeId::Minus),
            0x23 => Ok(OpcodeId::Multiply),
            0x24 => Ok(OpcodeId::Divide),
            0x25 => Ok(OpcodeId::Min),
            0x26 => Ok(OpcodeId::Max),
            0x27 => Ok(OpcodeId::SqrtBigint),
            0x28 => Ok(OpcodeId::Convert),
            0x29 => Ok(OpcodeId::Not),

            0x30 => Ok(OpcodeId::CompareGreater),
            0x31 => Ok(OpcodeId::CompareGreaterEqual),

            0x40 => Ok(OpcodeId::CdbvSet),
            0x41 => Ok(OpcodeId::CdbvrGet),
            0x42 => Ok(OpcodeId::CdbvrGetOrDefault),
            0x43 => Ok(OpcodeId::CdbvStateValAdd),
            0x44 => Ok(OpcodeId::CdbvStateValMinus),

            0x50 => Ok(OpcodeId::CdbvMapSet),
            0x51 => Ok(OpcodeId::CdbvMapValAdd),
            0x52 => Ok(OpcodeId::CdbvMapValMinus),
            0x53 => Ok(OpcodeId::CdbvrMapGet),
            0x54 => Ok(OpcodeId::CdbvrMapGetOrDefault),

            0x60 => Ok(OpcodeId::TdbNewToken),
            0x61 => Ok(OpcodeId::TdbaDeposit),
            0x62 => Ok(OpcodeId::TdbaTransfer),
            0x63 => Ok(OpcodeId::TdbarBalance),

            _ => Err(DecodeError::ReservedOpcode(value)),
        }
    }
}

impl OpcodeId {
    /// Returns the mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpcodeId::LoadSigner => "loadSigner",
            OpcodeId::LoadCaller => "loadCaller",
            OpcodeId::LoadTimestamp => "loadTimestamp",
            OpcodeId::LoadLastTokenIndex => "loadLastTokenIndex",
            OpcodeId::AssertSigner => "assertSigner",
            OpcodeId::AssertCaller => "assertCaller",
            OpcodeId::AssertTrue => "assertTrue",
            OpcodeId::AssertEqual => "assertEqual",
            OpcodeId::AssertPermitted => "assertPermitted",
            OpcodeId::AssertNotExpired => "assertNotExpired",
            OpcodeId::ConstantGet => "basicConstantGet",
            OpcodeId::Add => "basicAdd",
            OpcodeId::Minus => "basicMinus",
            OpcodeId::Multiply => "basicMultiply",
            OpcodeId::Divide => "basicDivide",
            OpcodeId::Min => "basicMin",
            OpcodeId::Max => "basicMax",
            OpcodeId::SqrtBigint => "basicSqrtBigint",
            OpcodeId::Convert => "basicConvert",
            OpcodeId::Not => "basicNot",
            OpcodeId::CompareGreater => "compareGreater",
            OpcodeId::CompareGreaterEqual => "compareGreaterEqual",
            OpcodeId::CdbvSet => "cdbvSet",
            OpcodeId::CdbvrGet => "cdbvrGet",
            OpcodeId::CdbvrGetOrDefault => "cdbvrGetOrDefault",
            OpcodeId::CdbvStateValAdd => "cdbvStateValAdd",
            OpcodeId::CdbvStateValMinus => "cdbvStateValMinus",
            OpcodeId::CdbvMapSet => "cdbvMapSet",
            OpcodeId::CdbvMapValAdd => "cdbvMapValAdd",
            OpcodeId::CdbvMapValMinus => "cdbvMapValMinus",
            OpcodeId::CdbvrMapGet => "cdbvrMapGet",
            OpcodeId::CdbvrMapGetOrDefault => "cdbvrMapGetOrDefault",
            OpcodeId::TdbNewToken => "tdbNewToken",
            OpcodeId::TdbaDeposit => "tdbaDeposit",
            OpcodeId::TdbaTransfer => "tdbaTransfer",
            OpcodeId::TdbarBalance => "tdbarBalance",
        }
    }

    /// Lowest contract language version that may use this opcode.
    pub fn min_version(&self) -> i32 {
        match self {
            OpcodeId::SqrtBigint | OpcodeId::Convert => 2,
            _ => 1,
        }
    }
}
