//! Instruction shapes and their bytecode encoding.
//!
//! An encoded instruction is laid out as:
//! ```text
//! u8       opcode id
//! ...      operands, in field order (registers and slot indices are one byte,
//!          literals use the tagged value encoding)
//! [u8]     destination register, for opcodes that produce a value
//! ```

use crate::codec::{Reader, Writer};
use crate::error::DecodeError;
use crate::opcode::OpcodeId;
use crate::value::DataValue;

/// Register index within one invocation's register file.
pub type Reg = u8;

/// Index of a declared state variable or state map.
pub type SlotIndex = u8;

/// A single instruction with its fixed operand shape.
///
/// Each variant corresponds to exactly one [`OpcodeId`]. Execution is a
/// single `match` over this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    LoadSigner { dest: Reg },
    LoadCaller { dest: Reg },
    LoadTimestamp { dest: Reg },
    LoadLastTokenIndex { dest: Reg },

    AssertSigner { account: Reg },
    AssertCaller { account: Reg },
    AssertTrue { cond: Reg },
    AssertEqual { a: Reg, b: Reg },
    AssertPermitted { cond: Reg },
    AssertNotExpired { now: Reg, deadline: Reg },

    ConstantGet { value: DataValue, dest: Reg },
    Add { a: Reg, b: Reg, dest: Reg },
    Minus { a: Reg, b: Reg, dest: Reg },
    Multiply { a: Reg, b: Reg, dest: Reg },
    Divide { a: Reg, b: Reg, dest: Reg },
    Min { a: Reg, b: Reg, dest: Reg },
    Max { a: Reg, b: Reg, dest: Reg },
    SqrtBigint { a: Reg, dest: Reg },
    Convert { value: Reg, target: Reg, dest: Reg },
    Not { a: Reg, dest: Reg },

    CompareGreater { a: Reg, b: Reg, dest: Reg },
    CompareGreaterEqual { a: Reg, b: Reg, dest: Reg },

    CdbvSet { var: SlotIndex, value: Reg },
    CdbvrGet { var: SlotIndex, dest: Reg },
    CdbvrGetOrDefault { var: SlotIndex, dest: Reg },
    CdbvStateValAdd { var: SlotIndex, value: Reg },
    CdbvStateValMinus { var: SlotIndex, value: Reg },

    CdbvMapSet { map: SlotIndex, key: Reg, value: Reg },
    CdbvMapValAdd { map: SlotIndex, key: Reg, value: Reg },
    CdbvMapValMinus { map: SlotIndex, key: Reg, value: Reg },
    CdbvrMapGet { map: SlotIndex, key: Reg, dest: Reg },
    CdbvrMapGetOrDefault { map: SlotIndex, key: Reg, dest: Reg },

    TdbNewToken { max: Reg, unit: Reg, description: Reg },
    TdbaDeposit { token: Reg, amount: Reg, holder: Reg },
    TdbaTransfer { from: Reg, token: Reg, amount: Reg, to: Reg },
    TdbarBalance { token: Reg, holder: Reg, dest: Reg },
}

impl Instruction {
    /// The opcode id this instruction encodes as.
    pub fn id(&self) -> OpcodeId {
        use Instruction::*;
        match self {
            LoadSigner { .. } => OpcodeId::LoadSigner,
            LoadCaller { .. } => OpcodeId::LoadCaller,
            LoadTimestamp { .. } => OpcodeId::LoadTimestamp,
            LoadLastTokenIndex { .. } => OpcodeId::LoadLastTokenIndex,
            AssertSigner { .. } => OpcodeId::AssertSigner,
            AssertCaller { .. } => OpcodeId::AssertCaller,
            AssertTrue { .. } => OpcodeId::AssertTrue,
            AssertEqual { .. } => OpcodeId::AssertEqual,
            AssertPermitted { .. } => OpcodeId::AssertPermitted,
            AssertNotExpired { .. } => OpcodeId::AssertNotExpired,
            ConstantGet { .. } => OpcodeId::ConstantGet,
            Add { .. } => OpcodeId::Add,
            Minus { .. } => OpcodeId::Minus,
            Multiply { .. } => OpcodeId::Multiply,
            Divide { .. } => OpcodeId::Divide,
            Min { .. } => OpcodeId::Min,
            Max { .. } => OpcodeId::Max,
            SqrtBigint { .. } => OpcodeId::SqrtBigint,
            Convert { .. } => OpcodeId::Convert,
            Not { .. } => OpcodeId::Not,
            CompareGreater { .. } => OpcodeId::CompareGreater,
            CompareGreaterEqual { .. } => OpcodeId::CompareGreaterEqual,
            CdbvSet { .. } => OpcodeId::CdbvSet,
            CdbvrGet { .. } => OpcodeId::CdbvrGet,
            CdbvrGetOrDefault { .. } => OpcodeId::CdbvrGetOrDefault,
            CdbvStateValAdd { .. } => OpcodeId::CdbvStateValAdd,
            CdbvStateValMinus { .. } => OpcodeId::CdbvStateValMinus,
            CdbvMapSet { .. } => OpcodeId::CdbvMapSet,
            CdbvMapValAdd { .. } => OpcodeId::CdbvMapValAdd,
            CdbvMapValMinus { .. } => OpcodeId::CdbvMapValMinus,
            CdbvrMapGet { .. } => OpcodeId::CdbvrMapGet,
            CdbvrMapGetOrDefault { .. } => OpcodeId::CdbvrMapGetOrDefault,
            TdbNewToken { .. } => OpcodeId::TdbNewToken,
            TdbaDeposit { .. } => OpcodeId::TdbaDeposit,
            TdbaTransfer { .. } => OpcodeId::TdbaTransfer,
            TdbarBalance { .. } => OpcodeId::TdbarBalance,
        }
    }

    /// Destination register, if this instruction produces a value.
    pub fn dest(&self) -> Option<Reg> {
        use Instruction::*;
        match *self {
            LoadSigner { dest }
            | LoadCaller { dest }
            | LoadTimestamp { dest }
            | LoadLastTokenIndex { dest }
            | ConstantGet { dest, .. }
            | Add { dest, .. }
            | Minus { dest, .. }
            | Multiply { dest, .. }
            | Divide { dest, .. }
            | Min { dest, .. }
            | Max { dest, .. }
            | SqrtBigint { dest, .. }
            | Convert { dest, .. }
            | Not { dest, .. }
            | CompareGreater { dest, .. }
            | CompareGreaterEqual { dest, .. }
            | CdbvrGet { dest, .. }
            | CdbvrGetOrDefault { dest, .. }
            | CdbvrMapGet { dest, .. }
            | CdbvrMapGetOrDefault { dest, .. }
            | TdbarBalance { dest, .. } => Some(dest),
            _ => None,
        }
    }

    /// Registers this instruction reads, in operand order.
    pub fn sources(&self) -> Vec<Reg> {
        use Instruction::*;
        match *self {
            LoadSigner { .. }
            | LoadCaller { .. }
            | LoadTimestamp { .. }
            | LoadLastTokenIndex { .. }
            | ConstantGet { .. }
            | CdbvrGet { .. }
            | CdbvrGetOrDefault { .. } => vec![],
            AssertSigner { account } | AssertCaller { account } => vec![account],
            AssertTrue { cond } | AssertPermitted { cond } => vec![cond],
            AssertEqual { a, b } => vec![a, b],
            AssertNotExpired { now, deadline } => vec![now, deadline],
            Add { a, b, .. }
            | Minus { a, b, .. }
            | Multiply { a, b, .. }
            | Divide { a, b, .. }
            | Min { a, b, .. }
            | Max { a, b, .. }
            | CompareGreater { a, b, .. }
            | CompareGreaterEqual { a, b, .. } => vec![a, b],
            SqrtBigint { a, .. } | Not { a, .. } => vec![a],
            Convert { value, target, .. } => vec![value, target],
            CdbvSet { value, .. }
            | CdbvStateValAdd { value, .. }
            | CdbvStateValMinus { value, .. } => vec![value],
            CdbvMapSet { key, value, .. }
            | CdbvMapValAdd { key, value, .. }
            | CdbvMapValMinus { key, value, .. } => vec![key, value],
            CdbvrMapGet { key, .. } | CdbvrMapGetOrDefault { key, .. } => vec![key],
            TdbNewToken {
                max,
                unit,
                description,
            } => vec![max, unit, description],
            TdbaDeposit {
                token,
                amount,
                holder,
            } => vec![token, amount, holder],
            TdbaTransfer {
                from,
                token,
                amount,
                to,
            } => vec![from, token, amount, to],
            TdbarBalance { token, holder, .. } => vec![token, holder],
        }
    }

    /// State variable index this instruction touches, if any.
    pub fn state_var(&self) -> Option<SlotIndex> {
        use Instruction::*;
        match *self {
            CdbvSet { var, .. }
            | CdbvrGet { var, .. }
            | CdbvrGetOrDefault { var, .. }
            | CdbvStateValAdd { var, .. }
            | CdbvStateValMinus { var, .. } => Some(var),
            _ => None,
        }
    }

    /// State map index this instruction touches, if any.
    pub fn state_map(&self) -> Option<SlotIndex> {
        use Instruction::*;
        match *self {
            CdbvMapSet { map, .. }
            | CdbvMapValAdd { map, .. }
            | CdbvMapValMinus { map, .. }
            | CdbvrMapGet { map, .. }
            | CdbvrMapGetOrDefault { map, .. } => Some(map),
            _ => None,
        }
    }

    /// Append the encoding of this instruction.
    pub fn encode_into(&self, w: &mut Writer) {
        use Instruction::*;
        w.u8(self.id() as u8);
        match self {
            ConstantGet { value, .. } => value.encode_into(w),
            CdbvSet { var, value }
            | CdbvStateValAdd { var, value }
            | CdbvStateValMinus { var, value } => {
                w.u8(*var);
                w.u8(*value);
            }
            CdbvrGet { var, .. } | CdbvrGetOrDefault { var, .. } => w.u8(*var),
            CdbvMapSet { map, key, value }
            | CdbvMapValAdd { map, key, value }
            | CdbvMapValMinus { map, key, value } => {
                w.u8(*map);
                w.u8(*key);
                w.u8(*value);
            }
            CdbvrMapGet { map, key, .. } | CdbvrMapGetOrDefault { map, key, .. } => {
                w.u8(*map);
                w.u8(*key);
            }
            _ => {
                for reg in self.sources() {
                    w.u8(reg);
                }
            }
        }
        if let Some(dest) = self.dest() {
            w.u8(dest);
        }
    }

    /// Encode this instruction to a standalone byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode_into(&mut w);
        w.into_bytes()
    }

    /// Read one instruction.
    pub fn decode_from(r: &mut Reader<'_>) -> Result<Instruction, DecodeError> {
        use Instruction::*;
        let id = OpcodeId::try_from(r.u8()?)?;
        let instr = match id {
            OpcodeId::LoadSigner => LoadSigner { dest: r.u8()? },
            OpcodeId::LoadCaller => LoadCaller { dest: r.u8()? },
            OpcodeId::LoadTimestamp => LoadTimestamp { dest: r.u8()? },
            OpcodeId::LoadLastTokenIndex => LoadLastTokenIndex { dest: r.u8()? },

            OpcodeId::AssertSigner => AssertSigner { account: r.u8()? },
            OpcodeId::AssertCaller => AssertCaller { account: r.u8()? },
            OpcodeId::AssertTrue => AssertTrue { cond: r.u8()? },
            OpcodeId::AssertEqual => AssertEqual {
                a: r.u8()?,
                b: r.u8()?,
            },
            OpcodeId::AssertPermitted => AssertPermitted { cond: r.u8()? },
            OpcodeId::AssertNotExpired => AssertNotExpired {
                now: r.u8()?,
                deadline: r.u8()?,
            },

            OpcodeId::ConstantGet => ConstantGet {
                value: DataValue::decode_from(r)?,
                dest: r.u8()?,
            },
            OpcodeId::Add => Add {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Minus => Minus {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Multiply => Multiply {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Divide => Divide {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Min => Min {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Max => Max {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::SqrtBigint => SqrtBigint {
                a: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Convert => Convert {
                value: r.u8()?,
                target: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::Not => Not {
                a: r.u8()?,
                dest: r.u8()?,
            },

            OpcodeId::CompareGreater => CompareGreater {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::CompareGreaterEqual => CompareGreaterEqual {
                a: r.u8()?,
                b: r.u8()?,
                dest: r.u8()?,
            },

            OpcodeId::CdbvSet => CdbvSet {
                var: r.u8()?,
                value: r.u8()?,
            },
            OpcodeId::CdbvrGet => CdbvrGet {
                var: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::CdbvrGetOrDefault => CdbvrGetOrDefault {
                var: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::CdbvStateValAdd => CdbvStateValAdd {
                var: r.u8()?,
                value: r.u8()?,
            },
            OpcodeId::CdbvStateValMinus => CdbvStateValMinus {
                var: r.u8()?,
                value: r.u8()?,
            },

            OpcodeId::CdbvMapSet => CdbvMapSet {
                map: r.u8()?,
                key: r.u8()?,
                value: r.u8()?,
            },
            OpcodeId::CdbvMapValAdd => CdbvMapValAdd {
                map: r.u8()?,
                key: r.u8()?,
                value: r.u8()?,
            },
            OpcodeId::CdbvMapValMinus => CdbvMapValMinus {
                map: r.u8()?,
                key: r.u8()?,
                value: r.u8()?,
            },
            OpcodeId::CdbvrMapGet => CdbvrMapGet {
                map: r.u8()?,
                key: r.u8()?,
                dest: r.u8()?,
            },
            OpcodeId::CdbvrMapGetOrDefault => CdbvrMapGetOrDefault {
                map: r.u8()?,
                key: r.u8()?,
                dest: r.u8()?,
            },

            OpcodeId::TdbNewToken => TdbNewToken {
                max: r.u8()?,
                unit: r.u8()?,
                description: r.u8()?,
            },
            OpcodeId::TdbaDeposit => TdbaDeposit {
                token: r.u8()?,
                amount: r.u8()?,
                holder: r.u8()?,
            },
            OpcodeId::TdbaTransfer => TdbaTransfer {
                from: r.u8()?,
                token: r.u8()?,
                amount: r.u8()?,
                to: r.u8()?,
            },
            OpcodeId::TdbarBalance => TdbarBalance {
                token: r.u8()?,
                holder: r.u8()?,
                dest: r.u8()?,
            },
        };
        Ok(instr)
    }

    /// Decode a standalone instruction, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Instruction, DecodeError> {
        let mut r = Reader::new(bytes);
        let instr = Self::decode_from(&mut r)?;
        r.finish()?;
        Ok(instr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_is_first_byte() {
        let instr = Instruction::LoadSigner { dest: 3 };
        assert_eq!(instr.encode(), vec![0x01, 3]);
    }

    #[test]
    fn destination_is_last_byte() {
        let instr = Instruction::Add { a: 1, b: 2, dest: 9 };
        assert_eq!(instr.encode(), vec![0x21, 1, 2, 9]);
    }

    #[test]
    fn map_operands_in_field_order() {
        let instr = Instruction::CdbvrMapGetOrDefault {
            map: 4,
            key: 5,
            dest: 6,
        };
        assert_eq!(instr.encode(), vec![0x54, 4, 5, 6]);
    }

    #[test]
    fn transfer_has_no_destination() {
        let instr = Instruction::TdbaTransfer {
            from: 0,
            token: 1,
            amount: 2,
            to: 3,
        };
        assert_eq!(instr.dest(), None);
        assert_eq!(instr.sources(), vec![0, 1, 2, 3]);
        assert_eq!(instr.encode(), vec![0x62, 0, 1, 2, 3]);
    }

    #[test]
    fn constant_literal_is_embedded() {
        let instr = Instruction::ConstantGet {
            value: DataValue::Boolean(true),
            dest: 7,
        };
        assert_eq!(instr.encode(), vec![0x20, 0x05, 0x01, 7]);
        assert_eq!(Instruction::decode(&instr.encode()), Ok(instr));
    }

    #[test]
    fn state_slot_accessors() {
        let set = Instruction::CdbvSet { var: 2, value: 0 };
        assert_eq!(set.state_var(), Some(2));
        assert_eq!(set.state_map(), None);
        assert_eq!(set.sources(), vec![0]);

        let get = Instruction::CdbvrMapGet {
            map: 1,
            key: 0,
            dest: 2,
        };
        assert_eq!(get.state_map(), Some(1));
        assert_eq!(get.state_var(), None);
    }

    #[test]
    fn decode_rejects_truncated_operands() {
        assert_eq!(
            Instruction::decode(&[0x21, 1, 2]),
            Err(DecodeError::UnexpectedEnd { at: 3 })
        );
    }

    #[test]
    fn decode_rejects_reserved_opcode() {
        assert_eq!(
            Instruction::decode(&[0x70, 0]),
            Err(DecodeError::ReservedOpcode(0x70))
        );
    }
}
