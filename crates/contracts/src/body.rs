//! Register-allocating emitter for straight-line function bodies.
//!
//! Each helper appends one opcode and, where the opcode has a destination,
//! returns a fresh register holding the result. Registers are never reused,
//! so a body reads as a chain of single assignments.

use ledgervm_common::{BigInt, DataType, DataValue, Instruction, Reg, SlotIndex};

pub(crate) struct Body {
    code: Vec<Instruction>,
    next: Reg,
    big_type: Option<Reg>,
    amount_type: Option<Reg>,
}

impl Body {
    /// Start a body whose parameters occupy registers `0..params`.
    pub fn new(params: u8) -> Self {
        Self {
            code: Vec::new(),
            next: params,
            big_type: None,
            amount_type: None,
        }
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.code
    }

    fn alloc(&mut self) -> Reg {
        let reg = self.next;
        // Past the register file the builder rejects the body anyway.
        self.next = self.next.saturating_add(1);
        reg
    }

    fn emit(&mut self, instr: Instruction) {
        self.code.push(instr);
    }

    fn to_dest(&mut self, make: impl FnOnce(Reg) -> Instruction) -> Reg {
        let dest = self.alloc();
        self.emit(make(dest));
        dest
    }

    // ---- Context ----

    pub fn signer(&mut self) -> Reg {
        self.to_dest(|dest| Instruction::LoadSigner { dest })
    }

    pub fn caller(&mut self) -> Reg {
        self.to_dest(|dest| Instruction::LoadCaller { dest })
    }

    pub fn timestamp(&mut self) -> Reg {
        self.to_dest(|dest| Instruction::LoadTimestamp { dest })
    }

    pub fn last_token(&mut self) -> Reg {
        self.to_dest(|dest| Instruction::LoadLastTokenIndex { dest })
    }

    // ---- Constants ----

    pub fn constant(&mut self, value: DataValue) -> Reg {
        self.to_dest(|dest| Instruction::ConstantGet { value, dest })
    }

    pub fn amount(&mut self, value: i64) -> Reg {
        self.constant(DataValue::Amount(value))
    }

    pub fn big(&mut self, value: i64) -> Reg {
        self.constant(DataValue::BigInteger(BigInt::from(value)))
    }

    // ---- Arithmetic ----

    pub fn add(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Add { a, b, dest })
    }

    pub fn minus(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Minus { a, b, dest })
    }

    pub fn mul(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Multiply { a, b, dest })
    }

    pub fn div(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Divide { a, b, dest })
    }

    pub fn min(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Min { a, b, dest })
    }

    pub fn max(&mut self, a: Reg, b: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Max { a, b, dest })
    }

    pub fn sqrt(&mut self, a: Reg) -> Reg {
        self.to_dest(|dest| Instruction::SqrtBigint { a, dest })
    }

    pub fn not(&mut self, a: Reg) -> Reg {
        self.to_dest(|dest| Instruction::Not { a, dest })
    }

    /// Widen an Amount register to BigInteger.
    pub fn to_big(&mut self, value: Reg) -> Reg {
        let target = match self.big_type {
            Some(reg) => reg,
            None => {
                let reg = self.constant(DataValue::DataTypeObj(DataType::BigInteger));
                self.big_type = Some(reg);
                reg
            }
        };
        self.to_dest(|dest| Instruction::Convert {
            value,
            target,
            dest,
        })
    }

    /// Narrow a BigInteger register to Amount.
    pub fn to_amount(&mut self, value: Reg) -> Reg {
        let target = match self.amount_type {
            Some(reg) => reg,
            None => {
                let reg = self.constant(DataValue::DataTypeObj(DataType::Amount));
                self.amount_type = Some(reg);
                reg
            }
        };
        self.to_dest(|dest| Instruction::Convert {
            value,
            target,
            dest,
        })
    }

    // ---- Assertions ----

    pub fn assert_signer(&mut self, account: Reg) {
        self.emit(Instruction::AssertSigner { account });
    }

    pub fn assert_caller(&mut self, account: Reg) {
        self.emit(Instruction::AssertCaller { account });
    }

    pub fn assert_true(&mut self, cond: Reg) {
        self.emit(Instruction::AssertTrue { cond });
    }

    pub fn assert_equal(&mut self, a: Reg, b: Reg) {
        self.emit(Instruction::AssertEqual { a, b });
    }

    pub fn assert_permitted(&mut self, cond: Reg) {
        self.emit(Instruction::AssertPermitted { cond });
    }

    pub fn assert_not_expired(&mut self, deadline: Reg) {
        let now = self.timestamp();
        self.emit(Instruction::AssertNotExpired { now, deadline });
    }

    /// Require `a > b`.
    pub fn assert_greater(&mut self, a: Reg, b: Reg) {
        let cond = self.to_dest(|dest| Instruction::CompareGreater { a, b, dest });
        self.assert_true(cond);
    }

    /// Require `a >= b`.
    pub fn assert_at_least(&mut self, a: Reg, b: Reg) {
        let cond = self.to_dest(|dest| Instruction::CompareGreaterEqual { a, b, dest });
        self.assert_true(cond);
    }

    // ---- State ----

    pub fn var(&mut self, var: SlotIndex) -> Reg {
        self.to_dest(|dest| Instruction::CdbvrGet { var, dest })
    }

    pub fn set_var(&mut self, var: SlotIndex, value: Reg) {
        self.emit(Instruction::CdbvSet { var, value });
    }

    pub fn var_add(&mut self, var: SlotIndex, value: Reg) {
        self.emit(Instruction::CdbvStateValAdd { var, value });
    }

    pub fn var_minus(&mut self, var: SlotIndex, value: Reg) {
        self.emit(Instruction::CdbvStateValMinus { var, value });
    }

    pub fn map_or_default(&mut self, map: SlotIndex, key: Reg) -> Reg {
        self.to_dest(|dest| Instruction::CdbvrMapGetOrDefault { map, key, dest })
    }

    pub fn set_entry(&mut self, map: SlotIndex, key: Reg, value: Reg) {
        self.emit(Instruction::CdbvMapSet { map, key, value });
    }

    pub fn entry_add(&mut self, map: SlotIndex, key: Reg, value: Reg) {
        self.emit(Instruction::CdbvMapValAdd { map, key, value });
    }

    pub fn entry_minus(&mut self, map: SlotIndex, key: Reg, value: Reg) {
        self.emit(Instruction::CdbvMapValMinus { map, key, value });
    }

    // ---- Tokens ----

    pub fn new_token(&mut self, max: Reg, unit: Reg, description: Reg) {
        self.emit(Instruction::TdbNewToken {
            max,
            unit,
            description,
        });
    }

    pub fn deposit(&mut self, token: Reg, amount: Reg, holder: Reg) {
        self.emit(Instruction::TdbaDeposit {
            token,
            amount,
            holder,
        });
    }

    pub fn transfer(&mut self, from: Reg, token: Reg, amount: Reg, to: Reg) {
        self.emit(Instruction::TdbaTransfer {
            from,
            token,
            amount,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_follow_parameters() {
        let mut body = Body::new(2);
        let sum = body.add(0, 1);
        body.set_var(0, sum);
        assert_eq!(sum, 2);
        assert_eq!(
            body.finish(),
            vec![
                Instruction::Add { a: 0, b: 1, dest: 2 },
                Instruction::CdbvSet { var: 0, value: 2 },
            ]
        );
    }

    #[test]
    fn type_constants_are_shared() {
        let mut body = Body::new(2);
        let a = body.to_big(0);
        let b = body.to_big(1);
        assert_eq!((a, b), (3, 4));
        let code = body.finish();
        let literals = code
            .iter()
            .filter(|i| matches!(i, Instruction::ConstantGet { .. }))
            .count();
        assert_eq!(literals, 1);
    }

    #[test]
    fn deadline_loads_timestamp_first() {
        let mut body = Body::new(1);
        body.assert_not_expired(0);
        assert_eq!(
            body.finish(),
            vec![
                Instruction::LoadTimestamp { dest: 1 },
                Instruction::AssertNotExpired {
                    now: 1,
                    deadline: 0
                },
            ]
        );
    }
}
