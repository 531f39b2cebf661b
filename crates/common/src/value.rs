//! Runtime value representation.
//!
//! Values live in registers during an invocation and in state slots
//! between invocations. Each value carries its [`DataType`].

use crate::codec::{Reader, Writer};
use crate::data_type::DataType;
use crate::error::DecodeError;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

/// Length in bytes of addresses, account references and contract ids.
pub const ADDRESS_LENGTH: usize = 26;

/// Maximum encoded length of a short text payload.
pub const MAX_SHORT_TEXT_BYTES: usize = 140;

/// Maximum encoded length of a big integer payload.
pub const MAX_BIG_INTEGER_BYTES: usize = 256;

/// A 26-byte user address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

/// A 26-byte contract identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractId(pub [u8; ADDRESS_LENGTH]);

impl ContractId {
    /// Derive an id from encoded contract bytecode: the leading bytes of
    /// its blake3 hash.
    pub fn from_bytecode(bytecode: &[u8]) -> Self {
        let hash = blake3::hash(bytecode);
        let mut id = [0u8; ADDRESS_LENGTH];
        id.copy_from_slice(&hash.as_bytes()[..ADDRESS_LENGTH]);
        Self(id)
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A token defined by some contract: the issuer's id plus its token index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId {
    pub contract: ContractId,
    pub index: u32,
}

impl TokenId {
    pub fn new(contract: ContractId, index: u32) -> Self {
        Self { contract, index }
    }
}

/// A typed value.
///
/// Equality and ordering compare the type first and then the payload, so
/// `Amount(1)` and `Int32(1)` are never equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataValue {
    Address(Address),
    Account(Address),
    Amount(i64),
    Int32(i32),
    Boolean(bool),
    ShortText(String),
    Timestamp(i64),
    TokenId(TokenId),
    BigInteger(BigInt),
    DataTypeObj(DataType),
}

/// Errors from [`DataValue::convert`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// No conversion rule exists between the two types.
    #[error("cannot convert {from} to {to}")]
    Unsupported { from: DataType, to: DataType },

    /// The value does not fit the narrower target type.
    #[error("value out of range for {to}")]
    OutOfRange { to: DataType },
}

impl DataValue {
    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::Address(_) => DataType::Address,
            DataValue::Account(_) => DataType::Account,
            DataValue::Amount(_) => DataType::Amount,
            DataValue::Int32(_) => DataType::Int32,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::ShortText(_) => DataType::ShortText,
            DataValue::Timestamp(_) => DataType::Timestamp,
            DataValue::TokenId(_) => DataType::TokenId,
            DataValue::BigInteger(_) => DataType::BigInteger,
            DataValue::DataTypeObj(_) => DataType::DataTypeObj,
        }
    }

    /// The zero value of `ty`, used by default-seeking reads and by
    /// numeric deltas applied to unset slots.
    ///
    /// Identifier types have no zero value.
    pub fn zero(ty: DataType) -> Option<DataValue> {
        match ty {
            DataType::Amount => Some(DataValue::Amount(0)),
            DataType::Int32 => Some(DataValue::Int32(0)),
            DataType::Boolean => Some(DataValue::Boolean(false)),
            DataType::ShortText => Some(DataValue::ShortText(String::new())),
            DataType::Timestamp => Some(DataValue::Timestamp(0)),
            DataType::BigInteger => Some(DataValue::BigInteger(BigInt::zero())),
            DataType::Address | DataType::Account | DataType::TokenId | DataType::DataTypeObj => {
                None
            }
        }
    }

    /// The address carried by an `Address` or `Account` value.
    pub fn as_account(&self) -> Option<&Address> {
        match self {
            DataValue::Address(a) | DataValue::Account(a) => Some(a),
            _ => None,
        }
    }

    /// Convert to `target`.
    ///
    /// Amount widens to BigInteger exactly; BigInteger narrows to Amount
    /// only when the value fits in 64 bits. Every other pairing is
    /// unsupported, including same-type conversion.
    pub fn convert(&self, target: DataType) -> Result<DataValue, ConvertError> {
        match (self, target) {
            (DataValue::Amount(v), DataType::BigInteger) => Ok(DataValue::BigInteger(BigInt::from(*v))),
            (DataValue::BigInteger(v), DataType::Amount) => v
                .to_i64()
                .map(DataValue::Amount)
                .ok_or(ConvertError::OutOfRange { to: target }),
            _ => Err(ConvertError::Unsupported {
                from: self.data_type(),
                to: target,
            }),
        }
    }

    /// Payload length and its format bound, for variable-length payloads.
    pub fn payload_len(&self) -> Option<(usize, usize)> {
        match self {
            DataValue::ShortText(s) => Some((s.len(), MAX_SHORT_TEXT_BYTES)),
            DataValue::BigInteger(v) => {
                Some((v.to_signed_bytes_be().len(), MAX_BIG_INTEGER_BYTES))
            }
            _ => None,
        }
    }

    /// Whether the value fits the wire format.
    pub fn is_encodable(&self) -> bool {
        self.payload_len().map_or(true, |(len, max)| len <= max)
    }

    /// Append the tagged encoding of this value.
    pub fn encode_into(&self, w: &mut Writer) {
        w.u8(self.data_type() as u8);
        match self {
            DataValue::Address(a) | DataValue::Account(a) => w.raw(&a.0),
            DataValue::Amount(v) | DataValue::Timestamp(v) => w.i64(*v),
            DataValue::Int32(v) => w.i32(*v),
            DataValue::Boolean(b) => w.u8(u8::from(*b)),
            DataValue::ShortText(s) => w.text(s),
            DataValue::TokenId(t) => {
                w.raw(&t.contract.0);
                w.u32(t.index);
            }
            DataValue::BigInteger(v) => w.prefixed(&v.to_signed_bytes_be()),
            DataValue::DataTypeObj(t) => w.u8(*t as u8),
        }
    }

    /// Encode this value to a standalone byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode_into(&mut w);
        w.into_bytes()
    }

    /// Read one tagged value.
    pub fn decode_from(r: &mut Reader<'_>) -> Result<DataValue, DecodeError> {
        let ty = DataType::try_from(r.u8()?)?;
        let value = match ty {
            DataType::Address => DataValue::Address(Address(r.array()?)),
            DataType::Account => DataValue::Account(Address(r.array()?)),
            DataType::Amount => DataValue::Amount(r.i64()?),
            DataType::Int32 => DataValue::Int32(r.i32()?),
            DataType::Boolean => match r.u8()? {
                0 => DataValue::Boolean(false),
                1 => DataValue::Boolean(true),
                other => return Err(DecodeError::InvalidBoolean(other)),
            },
            DataType::ShortText => DataValue::ShortText(r.text(MAX_SHORT_TEXT_BYTES)?),
            DataType::Timestamp => DataValue::Timestamp(r.i64()?),
            DataType::TokenId => {
                let contract = ContractId(r.array()?);
                DataValue::TokenId(TokenId::new(contract, r.u32()?))
            }
            DataType::BigInteger => {
                let bytes = r.prefixed(MAX_BIG_INTEGER_BYTES)?;
                DataValue::BigInteger(BigInt::from_signed_bytes_be(bytes))
            }
            DataType::DataTypeObj => DataValue::DataTypeObj(DataType::try_from(r.u8()?)?),
        };
        Ok(value)
    }

    /// Decode a standalone value, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<DataValue, DecodeError> {
        let mut r = Reader::new(bytes);
        let value = Self::decode_from(&mut r)?;
        r.finish()?;
        Ok(value)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Amount(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Boolean(v)
    }
}

impl From<Address> for DataValue {
    fn from(v: Address) -> Self {
        DataValue::Address(v)
    }
}
