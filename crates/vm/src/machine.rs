//! Machine state for one invocation: registers, overlay, context.

use crate::context::Context;
use crate::error::ExecError;
use crate::registers::Registers;
use crate::state::{Overlay, StateStore, WriteSet};
use ledgervm_common::{Contract, DataValue, Function, Reg, SlotIndex, StateMap, StateVar};

/// The ledger virtual machine, bound to one function of one contract.
///
/// A machine runs exactly once. On success it yields the write set for the
/// caller to commit; on failure the overlay is dropped with it.
pub struct Machine<'a> {
    /// The contract whose function is executing.
    pub(crate) contract: &'a Contract,
    pub(crate) function: &'a Function,
    pub(crate) registers: &'a mut Registers,
    pub(crate) state: Overlay<'a>,
    pub(crate) ctx: &'a Context,
    /// Index of the instruction being executed.
    pub(crate) pc: usize,
}

impl<'a> Machine<'a> {
    /// Create a machine. The register file is cleared.
    pub fn new(
        contract: &'a Contract,
        function: &'a Function,
        registers: &'a mut Registers,
        base: &'a dyn StateStore,
        ctx: &'a Context,
    ) -> Self {
        registers.clear();
        Self {
            contract,
            function,
            registers,
            state: Overlay::new(base),
            ctx,
            pc: 0,
        }
    }

    /// Check `args` against the declared parameters and seed them into
    /// registers `0..n`.
    pub(crate) fn seed(&mut self, args: Vec<DataValue>) -> Result<(), ExecError> {
        let params = &self.function.params;
        if args.len() != params.len() {
            return Err(ExecError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }
        for (index, (arg, expected)) in args.iter().zip(params).enumerate() {
            if arg.data_type() != *expected {
                return Err(ExecError::ArgumentType {
                    index,
                    expected: *expected,
                    found: arg.data_type(),
                });
            }
            if let Some((len, max)) = arg.payload_len().filter(|&(len, max)| len > max) {
                return Err(ExecError::ArgumentTooLong { index, len, max });
            }
        }
        for (reg, arg) in args.into_iter().enumerate() {
            let reg = Reg::try_from(reg).map_err(|_| ExecError::RegisterOutOfRange {
                at: 0,
                register: Reg::MAX,
            })?;
            self.registers.set(reg, arg, 0)?;
        }
        Ok(())
    }

    pub(crate) fn into_writes(self) -> WriteSet {
        self.state.into_writes()
    }

    pub(crate) fn state_var(&self, index: SlotIndex) -> Result<&'a StateVar, ExecError> {
        self.contract
            .state_var(index)
            .ok_or(ExecError::UndeclaredStateVar { at: self.pc, index })
    }

    pub(crate) fn state_map(&self, index: SlotIndex) -> Result<&'a StateMap, ExecError> {
        self.contract
            .state_map(index)
            .ok_or(ExecError::UndeclaredStateMap { at: self.pc, index })
    }
}
