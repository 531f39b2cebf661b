//! Main execution loop and opcode dispatch for the ledger VM.

use std::cmp::Ordering;

use crate::arith::{self, BinaryOp, Fault};
use crate::error::ExecError;
use crate::machine::Machine;
use crate::state::WriteSet;
use ledgervm_common::{Address, DataType, DataValue, Instruction, Reg, SlotIndex};
use tracing::trace;

impl<'a> Machine<'a> {
    /// Seed `args` and execute the function body from the first opcode to
    /// the last. Returns the pending writes; nothing is committed here.
    pub fn run(mut self, args: Vec<DataValue>) -> Result<WriteSet, ExecError> {
        self.seed(args)?;
        let function = self.function;
        for (pc, instr) in function.instructions.iter().enumerate() {
            self.pc = pc;
            trace!(at = pc, opcode = instr.id().mnemonic(), "execute");
            self.step(instr)?;
        }
        Ok(self.into_writes())
    }

    fn step(&mut self, instr: &Instruction) -> Result<(), ExecError> {
        use Instruction::*;
        let at = self.pc;
        let mnemonic = instr.id().mnemonic();

        match instr {
            // Context loads
            LoadSigner { dest } => {
                let signer = self.signer()?;
                self.registers.set(*dest, DataValue::Address(signer), at)
            }
            LoadCaller { dest } => {
                let caller = self.caller()?;
                self.registers.set(*dest, DataValue::Address(caller), at)
            }
            LoadTimestamp { dest } => {
                let now = self.ctx.timestamp.ok_or(ExecError::MissingContext {
                    at,
                    field: "timestamp",
                })?;
                self.registers.set(*dest, DataValue::Timestamp(now), at)
            }
            LoadLastTokenIndex { dest } => {
                let last = self
                    .state
                    .token_count()
                    .checked_sub(1)
                    .ok_or(ExecError::NoTokens { at })?;
                let last = i32::try_from(last).map_err(|_| ExecError::Overflow { at })?;
                self.registers.set(*dest, DataValue::Int32(last), at)
            }

            // Assertions
            AssertSigner { account } => {
                let account = self.registers.get_account(*account, mnemonic, at)?;
                if account != self.signer()? {
                    return Err(ExecError::NotSigner { at });
                }
                Ok(())
            }
            AssertCaller { account } => {
                let account = self.registers.get_account(*account, mnemonic, at)?;
                if account != self.caller()? {
                    return Err(ExecError::NotCaller { at });
                }
                Ok(())
            }
            AssertTrue { cond } => {
                if !self.registers.get_bool(*cond, at)? {
                    return Err(ExecError::AssertionFailed { at });
                }
                Ok(())
            }
            AssertEqual { a, b } => {
                if self.registers.get(*a, at)? != self.registers.get(*b, at)? {
                    return Err(ExecError::NotEqual { at });
                }
                Ok(())
            }
            AssertPermitted { cond } => {
                if !self.registers.get_bool(*cond, at)? {
                    return Err(ExecError::NotPermitted { at });
                }
                Ok(())
            }
            AssertNotExpired { now, deadline } => {
                let now = self.registers.get_timestamp(*now, at)?;
                let deadline = self.registers.get_timestamp(*deadline, at)?;
                if now > deadline {
                    return Err(ExecError::DeadlineExceeded { at, now, deadline });
                }
                Ok(())
            }

            // Constants and arithmetic
            ConstantGet { value, dest } => self.registers.set(*dest, value.clone(), at),
            Add { a, b, dest } => self.exec_binary(BinaryOp::Add, *a, *b, *dest, mnemonic),
            Minus { a, b, dest } => self.exec_binary(BinaryOp::Minus, *a, *b, *dest, mnemonic),
            Multiply { a, b, dest } => {
                self.exec_binary(BinaryOp::Multiply, *a, *b, *dest, mnemonic)
            }
            Divide { a, b, dest } => self.exec_binary(BinaryOp::Divide, *a, *b, *dest, mnemonic),
            Min { a, b, dest } => self.exec_binary(BinaryOp::Min, *a, *b, *dest, mnemonic),
            Max { a, b, dest } => self.exec_binary(BinaryOp::Max, *a, *b, *dest, mnemonic),
            SqrtBigint { a, dest } => {
                let root =
                    arith::sqrt(self.registers.get_big(*a, at)?).map_err(|f| self.fault(f, mnemonic))?;
                self.registers.set(*dest, DataValue::BigInteger(root), at)
            }
            Convert {
                value,
                target,
                dest,
            } => {
                let to = self.registers.get_data_type(*target, at)?;
                let converted = self
                    .registers
                    .get(*value, at)?
                    .convert(to)
                    .map_err(|source| ExecError::Conversion { at, source })?;
                self.registers.set(*dest, converted, at)
            }
            Not { a, dest } => {
                let v = self.registers.get_bool(*a, at)?;
                self.registers.set(*dest, DataValue::Boolean(!v), at)
            }

            // Comparison
            CompareGreater { a, b, dest } => {
                self.exec_compare(*a, *b, *dest, mnemonic, |o| o == Ordering::Greater)
            }
            CompareGreaterEqual { a, b, dest } => {
                self.exec_compare(*a, *b, *dest, mnemonic, |o| o != Ordering::Less)
            }

            // State variables
            CdbvSet { var, value } => {
                let slot = self.state_var(*var)?;
                let v = self.registers.get_typed(*value, slot.data_type, at)?.clone();
                self.state.set_var(*var, v);
                Ok(())
            }
            CdbvrGet { var, dest } => {
                self.state_var(*var)?;
                let v = self
                    .state
                    .var(*var)
                    .ok_or(ExecError::UnsetStateVar { at, index: *var })?;
                self.registers.set(*dest, v, at)
            }
            CdbvrGetOrDefault { var, dest } => {
                let slot = self.state_var(*var)?;
                let v = match self.state.var(*var) {
                    Some(v) => v,
                    None => self.zero(slot.data_type)?,
                };
                self.registers.set(*dest, v, at)
            }
            CdbvStateValAdd { var, value } => {
                self.exec_var_delta(*var, *value, BinaryOp::Add, mnemonic)
            }
            CdbvStateValMinus { var, value } => {
                self.exec_var_delta(*var, *value, BinaryOp::Minus, mnemonic)
            }

            // State maps
            CdbvMapSet { map, key, value } => {
                let slot = self.state_map(*map)?;
                let k = self.registers.get_typed(*key, slot.key_type, at)?.clone();
                let v = self.registers.get_typed(*value, slot.value_type, at)?.clone();
                self.state.set_map_entry(*map, k, v);
                Ok(())
            }
            CdbvMapValAdd { map, key, value } => {
                self.exec_map_delta(*map, *key, *value, BinaryOp::Add, mnemonic)
            }
            CdbvMapValMinus { map, key, value } => {
                self.exec_map_delta(*map, *key, *value, BinaryOp::Minus, mnemonic)
            }
            CdbvrMapGet { map, key, dest } => {
                let slot = self.state_map(*map)?;
                let k = self.registers.get_typed(*key, slot.key_type, at)?;
                let v = self
                    .state
                    .map_entry(*map, k)
                    .ok_or(ExecError::UnsetMapEntry { at, index: *map })?;
                self.registers.set(*dest, v, at)
            }
            CdbvrMapGetOrDefault { map, key, dest } => {
                let slot = self.state_map(*map)?;
                let k = self.registers.get_typed(*key, slot.key_type, at)?;
                let v = match self.state.map_entry(*map, k) {
                    Some(v) => v,
                    None => self.zero(slot.value_type)?,
                };
                self.registers.set(*dest, v, at)
            }

            // Token ledger
            TdbNewToken {
                max,
                unit,
                description,
            } => {
                let max = self.registers.get_amount(*max, at)?;
                let unit = self.registers.get_amount(*unit, at)?;
                let description = self.registers.get_text(*description, at)?.to_string();
                let index = self
                    .state
                    .new_token(max, unit, description)
                    .map_err(|source| ExecError::Token { at, source })?;
                trace!(at, token = index, "token created");
                Ok(())
            }
            TdbaDeposit {
                token,
                amount,
                holder,
            } => {
                let token = self.registers.get_int32(*token, at)?;
                let amount = self.registers.get_amount(*amount, at)?;
                let holder = self.registers.get_account(*holder, mnemonic, at)?;
                self.state
                    .deposit(token.into(), holder, amount)
                    .map_err(|source| ExecError::Token { at, source })
            }
            TdbaTransfer {
                from,
                token,
                amount,
                to,
            } => {
                let from = self.registers.get_account(*from, mnemonic, at)?;
                let token = self.registers.get_int32(*token, at)?;
                let amount = self.registers.get_amount(*amount, at)?;
                let to = self.registers.get_account(*to, mnemonic, at)?;
                self.state
                    .transfer(token.into(), from, to, amount)
                    .map_err(|source| ExecError::Token { at, source })
            }
            TdbarBalance {
                token,
                holder,
                dest,
            } => {
                let token = self.registers.get_int32(*token, at)?;
                let holder = self.registers.get_account(*holder, mnemonic, at)?;
                let balance = self
                    .state
                    .balance_of(token.into(), &holder)
                    .map_err(|source| ExecError::Token { at, source })?;
                self.registers.set(*dest, DataValue::Amount(balance), at)
            }
        }
    }

    // ---- Helpers ----

    fn signer(&self) -> Result<Address, ExecError> {
        self.ctx.signer.ok_or(ExecError::MissingContext {
            at: self.pc,
            field: "signer",
        })
    }

    fn caller(&self) -> Result<Address, ExecError> {
        self.ctx.caller.ok_or(ExecError::MissingContext {
            at: self.pc,
            field: "caller",
        })
    }

    fn zero(&self, data_type: DataType) -> Result<DataValue, ExecError> {
        DataValue::zero(data_type).ok_or(ExecError::NoDefaultValue {
            at: self.pc,
            data_type,
        })
    }

    fn fault(&self, fault: Fault, mnemonic: &'static str) -> ExecError {
        let at = self.pc;
        match fault {
            Fault::Overflow => ExecError::Overflow { at },
            Fault::DivisionByZero => ExecError::DivisionByZero { at },
            Fault::NegativeSqrt => ExecError::NegativeSqrt { at },
            Fault::Mismatch { expected, found } => ExecError::TypeMismatch {
                at,
                expected,
                found,
            },
            Fault::Unsupported { found } => ExecError::InvalidOperand {
                at,
                mnemonic,
                found,
            },
        }
    }

    fn exec_binary(
        &mut self,
        op: BinaryOp,
        a: Reg,
        b: Reg,
        dest: Reg,
        mnemonic: &'static str,
    ) -> Result<(), ExecError> {
        let at = self.pc;
        let result = arith::binary(op, self.registers.get(a, at)?, self.registers.get(b, at)?)
            .map_err(|f| self.fault(f, mnemonic))?;
        self.registers.set(dest, result, at)
    }

    fn exec_compare(
        &mut self,
        a: Reg,
        b: Reg,
        dest: Reg,
        mnemonic: &'static str,
        test: fn(Ordering) -> bool,
    ) -> Result<(), ExecError> {
        let at = self.pc;
        let ordering = arith::compare(self.registers.get(a, at)?, self.registers.get(b, at)?)
            .map_err(|f| self.fault(f, mnemonic))?;
        self.registers.set(dest, DataValue::Boolean(test(ordering)), at)
    }

    /// Apply a positive delta to a stored numeric value. Subtraction may not
    /// take the value below zero.
    fn apply_delta(
        &self,
        current: &DataValue,
        delta: &DataValue,
        op: BinaryOp,
        mnemonic: &'static str,
    ) -> Result<DataValue, ExecError> {
        let at = self.pc;
        match arith::signum(delta) {
            Some(Ordering::Greater) => {}
            Some(_) => return Err(ExecError::NonPositiveDelta { at }),
            None => {
                return Err(ExecError::InvalidOperand {
                    at,
                    mnemonic,
                    found: delta.data_type(),
                })
            }
        }
        let next = arith::binary(op, current, delta).map_err(|f| self.fault(f, mnemonic))?;
        if op == BinaryOp::Minus && arith::signum(&next) == Some(Ordering::Less) {
            return Err(ExecError::StateUnderflow { at });
        }
        Ok(next)
    }

    fn exec_var_delta(
        &mut self,
        var: SlotIndex,
        value: Reg,
        op: BinaryOp,
        mnemonic: &'static str,
    ) -> Result<(), ExecError> {
        let at = self.pc;
        let slot = self.state_var(var)?;
        let delta = self.registers.get_typed(value, slot.data_type, at)?;
        let current = match self.state.var(var) {
            Some(v) => v,
            None => self.zero(slot.data_type)?,
        };
        let next = self.apply_delta(&current, delta, op, mnemonic)?;
        self.state.set_var(var, next);
        Ok(())
    }

    fn exec_map_delta(
        &mut self,
        map: SlotIndex,
        key: Reg,
        value: Reg,
        op: BinaryOp,
        mnemonic: &'static str,
    ) -> Result<(), ExecError> {
        let at = self.pc;
        let slot = self.state_map(map)?;
        let k = self.registers.get_typed(key, slot.key_type, at)?.clone();
        let delta = self.registers.get_typed(value, slot.value_type, at)?;
        let current = match self.state.map_entry(map, &k) {
            Some(v) => v,
            None => self.zero(slot.value_type)?,
        };
        let next = self.apply_delta(&current, delta, op, mnemonic)?;
        self.state.set_map_entry(map, k, next);
        Ok(())
    }
}
