//! Function blocks: one trigger or public entry point of a contract.
//!
//! Encoded layout:
//! ```text
//! u16      function id
//! u8       kind tag (0 public, 1 init, 2 deposit, 3 withdraw)
//! [u8]     token state var index, for deposit/withdraw kinds
//! u8, u8*  return data types
//! u8, u8*  parameter data types
//! u16, ..  instructions
//! ```

use crate::codec::{Reader, Writer};
use crate::data_type::DataType;
use crate::error::DecodeError;
use crate::instruction::{Instruction, SlotIndex};

/// Function identifier, unique within its namespace (triggers or public functions).
pub type FunctionId = u16;

/// How a function is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Externally callable by any transaction.
    Public,
    /// Runs exactly once at deployment, before any public call.
    OnInit,
    /// Runs when tokens are deposited into the contract. The token id must
    /// equal the `TokenId` stored in state var `token_var`.
    OnDeposit { token_var: SlotIndex },
    /// Runs when tokens are withdrawn from the contract. Matched the same
    /// way as deposits.
    OnWithdraw { token_var: SlotIndex },
}

impl FunctionKind {
    /// Returns true for init/deposit/withdraw triggers.
    pub fn is_trigger(&self) -> bool {
        !matches!(self, FunctionKind::Public)
    }

    fn encode_into(&self, w: &mut Writer) {
        match *self {
            FunctionKind::Public => w.u8(0),
            FunctionKind::OnInit => w.u8(1),
            FunctionKind::OnDeposit { token_var } => {
                w.u8(2);
                w.u8(token_var);
            }
            FunctionKind::OnWithdraw { token_var } => {
                w.u8(3);
                w.u8(token_var);
            }
        }
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        match r.u8()? {
            0 => Ok(FunctionKind::Public),
            1 => Ok(FunctionKind::OnInit),
            2 => Ok(FunctionKind::OnDeposit { token_var: r.u8()? }),
            3 => Ok(FunctionKind::OnWithdraw { token_var: r.u8()? }),
            other => Err(DecodeError::InvalidFunctionKind(other)),
        }
    }
}

/// A straight-line function body with its declared interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub id: FunctionId,
    pub kind: FunctionKind,
    pub return_types: Vec<DataType>,
    /// Arguments are seeded into registers `0..params.len()` in this order.
    pub params: Vec<DataType>,
    pub instructions: Vec<Instruction>,
}

impl Function {
    /// Create a public function with no return types.
    pub fn public(id: FunctionId, params: Vec<DataType>, instructions: Vec<Instruction>) -> Self {
        Self {
            id,
            kind: FunctionKind::Public,
            return_types: Vec::new(),
            params,
            instructions,
        }
    }

    /// Create a trigger of the given kind.
    pub fn trigger(
        id: FunctionId,
        kind: FunctionKind,
        params: Vec<DataType>,
        instructions: Vec<Instruction>,
    ) -> Self {
        Self {
            id,
            kind,
            return_types: Vec::new(),
            params,
            instructions,
        }
    }

    pub fn encode_into(&self, w: &mut Writer) {
        w.u16(self.id);
        self.kind.encode_into(w);
        write_types(w, &self.return_types);
        write_types(w, &self.params);
        w.u16(self.instructions.len() as u16);
        for instr in &self.instructions {
            instr.encode_into(w);
        }
    }

    pub fn decode_from(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let id = r.u16()?;
        let kind = FunctionKind::decode_from(r)?;
        let return_types = read_types(r)?;
        let params = read_types(r)?;
        let count = r.u16()? as usize;
        let mut instructions = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            instructions.push(Instruction::decode_from(r)?);
        }
        Ok(Self {
            id,
            kind,
            return_types,
            params,
            instructions,
        })
    }
}

fn write_types(w: &mut Writer, types: &[DataType]) {
    w.u8(types.len() as u8);
    for ty in types {
        w.u8(*ty as u8);
    }
}

fn read_types(r: &mut Reader<'_>) -> Result<Vec<DataType>, DecodeError> {
    let count = r.u8()? as usize;
    (0..count)
        .map(|_| DataType::try_from(r.u8()?))
        .collect()
}
