//! Data type tags for values flowing through registers and state slots.

use crate::error::DecodeError;

/// Identifies the type of a [`DataValue`](crate::DataValue).
///
/// Every register, argument and persisted slot holds a value of exactly one
/// data type. State variables and maps declare their types up front and
/// every write is checked against the declaration.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    /// User address (26 bytes).
    Address = 0x01,
    /// Generic account reference: a user or contract account (26 bytes).
    Account = 0x02,
    /// Signed 64-bit token quantity.
    Amount = 0x03,
    /// Signed 32-bit integer.
    Int32 = 0x04,
    /// Boolean.
    Boolean = 0x05,
    /// UTF-8 text of at most 140 bytes.
    ShortText = 0x06,
    /// Signed 64-bit block time.
    Timestamp = 0x07,
    /// Token identifier: issuing contract plus token index.
    TokenId = 0x08,
    /// Arbitrary-precision signed integer.
    BigInteger = 0x09,
    /// A data type used as a value, parameterizing conversions.
    DataTypeObj = 0x0A,
}

/// All valid data types, in definition order.
pub const ALL_DATA_TYPES: [DataType; 10] = [
    DataType::Address,
    DataType::Account,
    DataType::Amount,
    DataType::Int32,
    DataType::Boolean,
    DataType::ShortText,
    DataType::Timestamp,
    DataType::TokenId,
    DataType::BigInteger,
    DataType::DataTypeObj,
];

impl TryFrom<u8> for DataType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(DataType::Address),
            0x02 => Ok(DataType::Account),
            0x03 => Ok(DataType::Amount),
            0x04 => Ok(DataType::Int32),
            0x05 => Ok(DataType::Boolean),
            0x06 => Ok(DataType::ShortText),
            0x07 => Ok(DataType::Timestamp),
            0x08 => Ok(DataType::TokenId),
            0x09 => Ok(DataType::BigInteger),
            0x0A => Ok(DataType::DataTypeObj),
            _ => Err(DecodeError::ReservedDataType(value)),
        }
    }
}

impl DataType {
    /// Returns the display name for this data type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Address => "Address",
            DataType::Account => "Account",
            DataType::Amount => "Amount",
            DataType::Int32 => "Int32",
            DataType::Boolean => "Boolean",
            DataType::ShortText => "ShortText",
            DataType::Timestamp => "Timestamp",
            DataType::TokenId => "TokenId",
            DataType::BigInteger => "BigInteger",
            DataType::DataTypeObj => "DataTypeObj",
        }
    }

    /// Returns true for types the arithmetic opcodes accept.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            DataType::Amount | DataType::Int32 | DataType::BigInteger
        )
    }

    /// Returns true for types the comparison opcodes accept.
    pub fn is_comparable(&self) -> bool {
        self.is_arithmetic() || *self == DataType::Timestamp
    }

    /// Returns true for types that identify an account (signer/caller checks).
    pub fn is_account_like(&self) -> bool {
        matches!(self, DataType::Address | DataType::Account)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
