//! Register and type pass.
//!
//! Function bodies are straight-line, so a single forward walk is an exact
//! abstract interpretation: parameters seed registers `0..n`, every opcode
//! reads its sources and writes its destination. A read of a register that
//! was never written is rejected. Where an operand's type is statically
//! known it must agree with what the opcode or the target slot requires.
//!
//! Types become unknown only through `Convert` with a target register whose
//! `DataTypeObj` was not a literal; unknown types are not checked here and
//! fall through to the interpreter's runtime checks.

use crate::error::{BuildError, Namespace};
use crate::namespaced;
use crate::structural::SlotTable;
use ledgervm_common::{Contract, DataType, DataValue, Function, Instruction, Reg, SlotIndex};

/// Run the register/type pass over every function.
///
/// Expects the bounds pass to have succeeded: slot lookups that miss are
/// skipped rather than reported again.
pub fn check_types(contract: &Contract, slots: &SlotTable) -> Vec<BuildError> {
    let mut errors = Vec::new();
    for (namespace, f) in namespaced(contract) {
        let mut checker = TypeChecker::new(namespace, f, slots);
        checker.check_body();
        errors.extend(checker.errors);
    }
    errors
}

/// Returns true when a value of type `from` converts to `to`.
pub fn convertible(from: DataType, to: DataType) -> bool {
    matches!(
        (from, to),
        (DataType::Amount, DataType::BigInteger) | (DataType::BigInteger, DataType::Amount)
    )
}

#[derive(Debug, Clone, Copy, Default)]
struct RegInfo {
    written: bool,
    ty: Option<DataType>,
    /// The type named by a `DataTypeObj` literal held in this register.
    type_literal: Option<DataType>,
}

struct TypeChecker<'a> {
    namespace: Namespace,
    function: &'a Function,
    slots: &'a SlotTable,
    regs: [RegInfo; 256],
    at: usize,
    errors: Vec<BuildError>,
}

impl<'a> TypeChecker<'a> {
    fn new(namespace: Namespace, function: &'a Function, slots: &'a SlotTable) -> Self {
        let mut regs = [RegInfo::default(); 256];
        for (reg, ty) in regs.iter_mut().zip(&function.params) {
            reg.written = true;
            reg.ty = Some(*ty);
        }
        Self {
            namespace,
            function,
            slots,
            regs,
            at: 0,
            errors: Vec::new(),
        }
    }

    fn check_body(&mut self) {
        for (at, instr) in self.function.instructions.iter().enumerate() {
            self.at = at;
            self.step(instr);
        }
    }

    fn step(&mut self, instr: &Instruction) {
        use Instruction::*;
        let mnemonic = instr.id().mnemonic();

        match instr {
            LoadSigner { dest } | LoadCaller { dest } => self.write(*dest, Some(DataType::Address)),
            LoadTimestamp { dest } => self.write(*dest, Some(DataType::Timestamp)),
            LoadLastTokenIndex { dest } => self.write(*dest, Some(DataType::Int32)),

            AssertSigner { account } | AssertCaller { account } => {
                let t = self.read(*account);
                self.expect_class(t, mnemonic, DataType::is_account_like);
            }
            AssertTrue { cond } | AssertPermitted { cond } => {
                let t = self.read(*cond);
                self.expect(t, Some(DataType::Boolean));
            }
            AssertEqual { a, b } => {
                let ta = self.read(*a);
                let tb = self.read(*b);
                self.expect(tb, ta);
            }
            AssertNotExpired { now, deadline } => {
                for reg in [*now, *deadline] {
                    let t = self.read(reg);
                    self.expect(t, Some(DataType::Timestamp));
                }
            }

            ConstantGet { value, dest } => {
                self.write(*dest, Some(value.data_type()));
                if let DataValue::DataTypeObj(named) = value {
                    self.regs[*dest as usize].type_literal = Some(*named);
                }
            }
            Add { a, b, dest }
            | Minus { a, b, dest }
            | Multiply { a, b, dest }
            | Divide { a, b, dest }
            | Min { a, b, dest }
            | Max { a, b, dest } => {
                let t = self.binary(*a, *b, mnemonic, DataType::is_arithmetic);
                self.write(*dest, t);
            }
            SqrtBigint { a, dest } => {
                let t = self.read(*a);
                self.expect(t, Some(DataType::BigInteger));
                self.write(*dest, Some(DataType::BigInteger));
            }
            Convert {
                value,
                target,
                dest,
            } => {
                let from = self.read(*value);
                let tt = self.read(*target);
                self.expect(tt, Some(DataType::DataTypeObj));
                let to = self.regs[*target as usize].type_literal;
                if let (Some(from), Some(to)) = (from, to) {
                    if !convertible(from, to) {
                        self.errors.push(BuildError::UnsupportedConversion {
                            namespace: self.namespace,
                            function: self.function.id,
                            at: self.at,
                            from,
                            to,
                        });
                    }
                }
                self.write(*dest, to);
            }
            Not { a, dest } => {
                let t = self.read(*a);
                self.expect(t, Some(DataType::Boolean));
                self.write(*dest, Some(DataType::Boolean));
            }

            CompareGreater { a, b, dest } | CompareGreaterEqual { a, b, dest } => {
                self.binary(*a, *b, mnemonic, DataType::is_comparable);
                self.write(*dest, Some(DataType::Boolean));
            }

            CdbvSet { var, value } => {
                let t = self.read(*value);
                let slot = self.var_type(*var);
                self.expect(t, slot);
            }
            CdbvStateValAdd { var, value } | CdbvStateValMinus { var, value } => {
                let t = self.read(*value);
                let slot = self.var_type(*var);
                self.expect_class(slot, mnemonic, DataType::is_arithmetic);
                self.expect(t, slot);
            }
            CdbvrGet { var, dest } => {
                let slot = self.var_type(*var);
                self.write(*dest, slot);
            }
            CdbvrGetOrDefault { var, dest } => {
                let slot = self.var_type(*var);
                self.expect_default(slot);
                self.write(*dest, slot);
            }

            CdbvMapSet { map, key, value } => {
                let (key_ty, value_ty) = self.map_types(*map);
                let tk = self.read(*key);
                self.expect(tk, key_ty);
                let tv = self.read(*value);
                self.expect(tv, value_ty);
            }
            CdbvMapValAdd { map, key, value } | CdbvMapValMinus { map, key, value } => {
                let (key_ty, value_ty) = self.map_types(*map);
                let tk = self.read(*key);
                self.expect(tk, key_ty);
                let tv = self.read(*value);
                self.expect_class(value_ty, mnemonic, DataType::is_arithmetic);
                self.expect(tv, value_ty);
            }
            CdbvrMapGet { map, key, dest } => {
                let (key_ty, value_ty) = self.map_types(*map);
                let tk = self.read(*key);
                self.expect(tk, key_ty);
                self.write(*dest, value_ty);
            }
            CdbvrMapGetOrDefault { map, key, dest } => {
                let (key_ty, value_ty) = self.map_types(*map);
                let tk = self.read(*key);
                self.expect(tk, key_ty);
                self.expect_default(value_ty);
                self.write(*dest, value_ty);
            }

            TdbNewToken {
                max,
                unit,
                description,
            } => {
                for (reg, ty) in [
                    (*max, DataType::Amount),
                    (*unit, DataType::Amount),
                    (*description, DataType::ShortText),
                ] {
                    let t = self.read(reg);
                    self.expect(t, Some(ty));
                }
            }
            TdbaDeposit {
                token,
                amount,
                holder,
            } => {
                self.token_and_amount(*token, *amount);
                let t = self.read(*holder);
                self.expect_class(t, mnemonic, DataType::is_account_like);
            }
            TdbaTransfer {
                from,
                token,
                amount,
                to,
            } => {
                let t = self.read(*from);
                self.expect_class(t, mnemonic, DataType::is_account_like);
                self.token_and_amount(*token, *amount);
                let t = self.read(*to);
                self.expect_class(t, mnemonic, DataType::is_account_like);
            }
            TdbarBalance {
                token,
                holder,
                dest,
            } => {
                let t = self.read(*token);
                self.expect(t, Some(DataType::Int32));
                let t = self.read(*holder);
                self.expect_class(t, mnemonic, DataType::is_account_like);
                self.write(*dest, Some(DataType::Amount));
            }
        }
    }

    fn read(&mut self, reg: Reg) -> Option<DataType> {
        let info = self.regs[reg as usize];
        if !info.written {
            self.errors.push(BuildError::UndefinedRegister {
                namespace: self.namespace,
                function: self.function.id,
                at: self.at,
                register: reg,
            });
            return None;
        }
        info.ty
    }

    fn write(&mut self, reg: Reg, ty: Option<DataType>) {
        self.regs[reg as usize] = RegInfo {
            written: true,
            ty,
            type_literal: None,
        };
    }

    /// Report a mismatch when both types are known and differ.
    fn expect(&mut self, found: Option<DataType>, expected: Option<DataType>) {
        if let (Some(found), Some(expected)) = (found, expected) {
            if found != expected {
                self.errors.push(BuildError::TypeMismatch {
                    namespace: self.namespace,
                    function: self.function.id,
                    at: self.at,
                    expected,
                    found,
                });
            }
        }
    }

    fn expect_class(
        &mut self,
        found: Option<DataType>,
        mnemonic: &'static str,
        accepts: fn(&DataType) -> bool,
    ) {
        if let Some(found) = found {
            if !accepts(&found) {
                self.errors.push(BuildError::InvalidOperandType {
                    namespace: self.namespace,
                    function: self.function.id,
                    at: self.at,
                    mnemonic,
                    found,
                });
            }
        }
    }

    fn expect_default(&mut self, ty: Option<DataType>) {
        if let Some(data_type) = ty {
            if DataValue::zero(data_type).is_none() {
                self.errors.push(BuildError::NoDefaultValue {
                    namespace: self.namespace,
                    function: self.function.id,
                    at: self.at,
                    data_type,
                });
            }
        }
    }

    /// Both operands must share one type of the accepted class. Returns that
    /// type when known.
    fn binary(
        &mut self,
        a: Reg,
        b: Reg,
        mnemonic: &'static str,
        accepts: fn(&DataType) -> bool,
    ) -> Option<DataType> {
        let ta = self.read(a);
        let tb = self.read(b);
        self.expect_class(ta, mnemonic, accepts);
        self.expect(tb, ta);
        ta.or(tb)
    }

    fn token_and_amount(&mut self, token: Reg, amount: Reg) {
        let t = self.read(token);
        self.expect(t, Some(DataType::Int32));
        let t = self.read(amount);
        self.expect(t, Some(DataType::Amount));
    }

    fn var_type(&self, var: SlotIndex) -> Option<DataType> {
        self.slots.vars.get(&var).map(|v| v.data_type)
    }

    fn map_types(&self, map: SlotIndex) -> (Option<DataType>, Option<DataType>) {
        match self.slots.maps.get(&map) {
            Some(m) => (Some(m.key_type), Some(m.value_type)),
            None => (None, None),
        }
    }
}
