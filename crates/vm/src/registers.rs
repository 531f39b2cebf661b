//! Register file for one invocation.

use crate::error::ExecError;
use ledgervm_common::{Address, BigInt, DataType, DataValue, Reg};

/// Fixed-capacity register file. Registers start unset.
///
/// Values are owned: `set` stores an independent clone, so no two registers
/// alias.
#[derive(Debug, Clone)]
pub struct Registers {
    regs: Vec<Option<DataValue>>,
}

impl Registers {
    pub fn new(capacity: usize) -> Self {
        Self {
            regs: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.regs.len()
    }

    /// Unset every register.
    pub fn clear(&mut self) {
        self.regs.iter_mut().for_each(|r| *r = None);
    }

    /// Overwrite register `idx`.
    pub fn set(&mut self, idx: Reg, value: DataValue, at: usize) -> Result<(), ExecError> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(ExecError::RegisterOutOfRange { at, register: idx })?;
        *slot = Some(value);
        Ok(())
    }

    /// The value in register `idx`.
    pub fn get(&self, idx: Reg, at: usize) -> Result<&DataValue, ExecError> {
        self.regs
            .get(idx as usize)
            .ok_or(ExecError::RegisterOutOfRange { at, register: idx })?
            .as_ref()
            .ok_or(ExecError::UndefinedRegister { at, register: idx })
    }

    /// The value in register `idx`, which must have type `expected`.
    pub fn get_typed(
        &self,
        idx: Reg,
        expected: DataType,
        at: usize,
    ) -> Result<&DataValue, ExecError> {
        let value = self.get(idx, at)?;
        if value.data_type() != expected {
            return Err(ExecError::TypeMismatch {
                at,
                expected,
                found: value.data_type(),
            });
        }
        Ok(value)
    }

    pub fn get_amount(&self, idx: Reg, at: usize) -> Result<i64, ExecError> {
        match self.get(idx, at)? {
            DataValue::Amount(v) => Ok(*v),
            other => Err(mismatch(DataType::Amount, other, at)),
        }
    }

    pub fn get_int32(&self, idx: Reg, at: usize) -> Result<i32, ExecError> {
        match self.get(idx, at)? {
            DataValue::Int32(v) => Ok(*v),
            other => Err(mismatch(DataType::Int32, other, at)),
        }
    }

    pub fn get_bool(&self, idx: Reg, at: usize) -> Result<bool, ExecError> {
        match self.get(idx, at)? {
            DataValue::Boolean(v) => Ok(*v),
            other => Err(mismatch(DataType::Boolean, other, at)),
        }
    }

    pub fn get_timestamp(&self, idx: Reg, at: usize) -> Result<i64, ExecError> {
        match self.get(idx, at)? {
            DataValue::Timestamp(v) => Ok(*v),
            other => Err(mismatch(DataType::Timestamp, other, at)),
        }
    }

    pub fn get_text(&self, idx: Reg, at: usize) -> Result<&str, ExecError> {
        match self.get(idx, at)? {
            DataValue::ShortText(v) => Ok(v.as_str()),
            other => Err(mismatch(DataType::ShortText, other, at)),
        }
    }

    pub fn get_big(&self, idx: Reg, at: usize) -> Result<&BigInt, ExecError> {
        match self.get(idx, at)? {
            DataValue::BigInteger(v) => Ok(v),
            other => Err(mismatch(DataType::BigInteger, other, at)),
        }
    }

    pub fn get_data_type(&self, idx: Reg, at: usize) -> Result<DataType, ExecError> {
        match self.get(idx, at)? {
            DataValue::DataTypeObj(v) => Ok(*v),
            other => Err(mismatch(DataType::DataTypeObj, other, at)),
        }
    }

    /// The address in an `Address` or `Account` register.
    pub fn get_account(
        &self,
        idx: Reg,
        mnemonic: &'static str,
        at: usize,
    ) -> Result<Address, ExecError> {
        let value = self.get(idx, at)?;
        value.as_account().copied().ok_or(ExecError::InvalidOperand {
            at,
            mnemonic,
            found: value.data_type(),
        })
    }
}

fn mismatch(expected: DataType, found: &DataValue, at: usize) -> ExecError {
    ExecError::TypeMismatch {
        at,
        expected,
        found: found.data_type(),
    }
}
