//! Exact arithmetic over numeric data values.
//!
//! Amount and Int32 use checked machine arithmetic; BigInteger is exact up
//! to the width its encoding allows. Division truncates toward zero for all
//! three.

use std::cmp::Ordering;

use ledgervm_common::{BigInt, DataType, DataValue};
use num_bigint::Sign;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Zero};

/// A two-operand arithmetic opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Minus,
    Multiply,
    Divide,
    Min,
    Max,
}

/// Why an arithmetic operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Overflow,
    DivisionByZero,
    NegativeSqrt,
    /// Operand types differ.
    Mismatch { expected: DataType, found: DataType },
    /// Operand type does not support the operation.
    Unsupported { found: DataType },
}

impl BinaryOp {
    fn apply<T>(self, x: &T, y: &T) -> Result<T, Fault>
    where
        T: CheckedAdd + CheckedSub + CheckedMul + CheckedDiv + Zero + Ord + Clone,
    {
        match self {
            BinaryOp::Add => x.checked_add(y).ok_or(Fault::Overflow),
            BinaryOp::Minus => x.checked_sub(y).ok_or(Fault::Overflow),
            BinaryOp::Multiply => x.checked_mul(y).ok_or(Fault::Overflow),
            BinaryOp::Divide if y.is_zero() => Err(Fault::DivisionByZero),
            // i64::MIN / -1 is the only remaining failure.
            BinaryOp::Divide => x.checked_div(y).ok_or(Fault::Overflow),
            BinaryOp::Min => Ok(x.min(y).clone()),
            BinaryOp::Max => Ok(x.max(y).clone()),
        }
    }
}

/// Apply `op` to two values of the same arithmetic type.
pub fn binary(op: BinaryOp, a: &DataValue, b: &DataValue) -> Result<DataValue, Fault> {
    match (a, b) {
        (DataValue::Amount(x), DataValue::Amount(y)) => op.apply(x, y).map(DataValue::Amount),
        (DataValue::Int32(x), DataValue::Int32(y)) => op.apply(x, y).map(DataValue::Int32),
        (DataValue::BigInteger(x), DataValue::BigInteger(y)) => {
            let value = DataValue::BigInteger(op.apply(x, y)?);
            // Results must stay within the encodable width.
            if value.is_encodable() {
                Ok(value)
            } else {
                Err(Fault::Overflow)
            }
        }
        _ => Err(operand_fault(a, b)),
    }
}

/// Order two values of the same comparable type.
pub fn compare(a: &DataValue, b: &DataValue) -> Result<Ordering, Fault> {
    match (a, b) {
        (DataValue::Amount(x), DataValue::Amount(y))
        | (DataValue::Timestamp(x), DataValue::Timestamp(y)) => Ok(x.cmp(y)),
        (DataValue::Int32(x), DataValue::Int32(y)) => Ok(x.cmp(y)),
        (DataValue::BigInteger(x), DataValue::BigInteger(y)) => Ok(x.cmp(y)),
        _ => Err(operand_fault(a, b)),
    }
}

/// Integer square root, rounded down.
pub fn sqrt(value: &BigInt) -> Result<BigInt, Fault> {
    if value.sign() == Sign::Minus {
        return Err(Fault::NegativeSqrt);
    }
    Ok(value.sqrt())
}

/// Sign of a numeric value, or `None` for non-numeric types.
pub fn signum(value: &DataValue) -> Option<Ordering> {
    match value {
        DataValue::Amount(v) => Some(v.cmp(&0)),
        DataValue::Int32(v) => Some(v.cmp(&0)),
        DataValue::BigInteger(v) => Some(v.sign().cmp(&Sign::NoSign)),
        _ => None,
    }
}

fn operand_fault(a: &DataValue, b: &DataValue) -> Fault {
    if a.data_type() != b.data_type() {
        Fault::Mismatch {
            expected: a.data_type(),
            found: b.data_type(),
        }
    } else {
        Fault::Unsupported {
            found: a.data_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: i64) -> DataValue {
        DataValue::BigInteger(BigInt::from(v))
    }

    #[test]
    fn amount_arithmetic() {
        let a = DataValue::Amount(7);
        let b = DataValue::Amount(2);
        assert_eq!(binary(BinaryOp::Add, &a, &b), Ok(DataValue::Amount(9)));
        assert_eq!(binary(BinaryOp::Minus, &b, &a), Ok(DataValue::Amount(-5)));
        assert_eq!(binary(BinaryOp::Divide, &a, &b), Ok(DataValue::Amount(3)));
        assert_eq!(binary(BinaryOp::Min, &a, &b), Ok(DataValue::Amount(2)));
        assert_eq!(binary(BinaryOp::Max, &a, &b), Ok(DataValue::Amount(7)));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(
            binary(BinaryOp::Divide, &DataValue::Int32(-7), &DataValue::Int32(2)),
            Ok(DataValue::Int32(-3))
        );
        assert_eq!(binary(BinaryOp::Divide, &big(-7), &big(2)), Ok(big(-3)));
    }

    #[test]
    fn overflow_detected() {
        let max = DataValue::Amount(i64::MAX);
        assert_eq!(
            binary(BinaryOp::Add, &max, &DataValue::Amount(1)),
            Err(Fault::Overflow)
        );
        assert_eq!(
            binary(
                BinaryOp::Divide,
                &DataValue::Amount(i64::MIN),
                &DataValue::Amount(-1)
            ),
            Err(Fault::Overflow)
        );
    }

    #[test]
    fn big_integer_is_exact() {
        let a = DataValue::BigInteger(BigInt::from(i64::MAX));
        let product = binary(BinaryOp::Multiply, &a, &a).unwrap();
        assert_eq!(
            product,
            DataValue::BigInteger(BigInt::from(i64::MAX) * BigInt::from(i64::MAX))
        );
    }

    #[test]
    fn big_integer_overflows_past_encoding_width() {
        let half = DataValue::BigInteger(BigInt::from(1) << 1100);
        assert_eq!(binary(BinaryOp::Multiply, &half, &half), Err(Fault::Overflow));

        let widest = DataValue::BigInteger((BigInt::from(1) << 2047) - 1);
        let one = big(1);
        assert_eq!(binary(BinaryOp::Add, &widest, &one), Err(Fault::Overflow));
        assert!(binary(BinaryOp::Minus, &widest, &one).is_ok());
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            binary(BinaryOp::Divide, &big(1), &big(0)),
            Err(Fault::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Divide, &DataValue::Amount(1), &DataValue::Amount(0)),
            Err(Fault::DivisionByZero)
        );
    }

    #[test]
    fn mixed_types_rejected() {
        assert_eq!(
            binary(BinaryOp::Add, &DataValue::Amount(1), &big(1)),
            Err(Fault::Mismatch {
                expected: DataType::Amount,
                found: DataType::BigInteger
            })
        );
        assert_eq!(
            binary(
                BinaryOp::Add,
                &DataValue::Boolean(true),
                &DataValue::Boolean(true)
            ),
            Err(Fault::Unsupported {
                found: DataType::Boolean
            })
        );
    }

    #[test]
    fn compare_orders_timestamps() {
        assert_eq!(
            compare(&DataValue::Timestamp(5), &DataValue::Timestamp(9)),
            Ok(Ordering::Less)
        );
        assert!(compare(&DataValue::Timestamp(5), &DataValue::Amount(9)).is_err());
    }

    #[test]
    fn integer_sqrt() {
        assert_eq!(sqrt(&BigInt::from(10_000_000_000i64)), Ok(BigInt::from(100_000)));
        assert_eq!(sqrt(&BigInt::from(99)), Ok(BigInt::from(9)));
        assert_eq!(sqrt(&BigInt::from(-4)), Err(Fault::NegativeSqrt));
    }

    #[test]
    fn signs() {
        assert_eq!(signum(&DataValue::Amount(-2)), Some(Ordering::Less));
        assert_eq!(signum(&big(0)), Some(Ordering::Equal));
        assert_eq!(signum(&big(3)), Some(Ordering::Greater));
        assert_eq!(signum(&DataValue::Boolean(true)), None);
    }
}
