//! Deployed contracts: a validated descriptor bound to its state store.

use crate::context::Context;
use crate::error::{DeployError, ExecError};
use crate::machine::Machine;
use crate::registers::Registers;
use crate::state::{MemoryStore, StateStore};
use ledgervm_builder::{build_from_bytecode, ValidContract};
use ledgervm_common::{
    Address, Contract, ContractId, DataValue, Function, FunctionId, FunctionKind, SlotIndex,
    TokenId,
};
use tracing::debug;

/// A deployed contract.
///
/// Invocations take `&mut self`, so calls on one instance are serialized.
/// Each call either commits all of its writes to the store or none.
#[derive(Debug)]
pub struct ContractInstance<S: StateStore = MemoryStore> {
    contract: ValidContract,
    store: S,
    registers: Registers,
}

impl<S: StateStore> ContractInstance<S> {
    /// Deploy `valid` onto `store`, running its init trigger with `init_args`.
    pub fn deploy(
        valid: ValidContract,
        store: S,
        ctx: &Context,
        init_args: Vec<DataValue>,
    ) -> Result<Self, ExecError> {
        let registers = Registers::new(valid.limits().register_capacity);
        let mut instance = Self {
            contract: valid,
            store,
            registers,
        };
        debug!(contract = %instance.contract.id(), "deploy");
        let init = instance
            .contract
            .init_trigger()
            .ok_or(ExecError::MissingTrigger { kind: "init" })?;
        run_function(
            instance.contract.contract(),
            init,
            &mut instance.registers,
            &mut instance.store,
            ctx,
            init_args,
        )?;
        Ok(instance)
    }

    /// Decode, validate and deploy raw bytecode.
    pub fn deploy_bytecode(
        bytes: &[u8],
        store: S,
        ctx: &Context,
        init_args: Vec<DataValue>,
    ) -> Result<Self, DeployError> {
        let valid = build_from_bytecode(bytes).map_err(DeployError::Build)?;
        Ok(Self::deploy(valid, store, ctx, init_args)?)
    }

    /// Call public function `id`.
    pub fn invoke(
        &mut self,
        id: FunctionId,
        args: Vec<DataValue>,
        ctx: &Context,
    ) -> Result<(), ExecError> {
        let function = self
            .contract
            .function(id)
            .ok_or(ExecError::UnknownFunction { id })?;
        run_function(
            self.contract.contract(),
            function,
            &mut self.registers,
            &mut self.store,
            ctx,
            args,
        )
    }

    /// Run the deposit trigger accepting `token`, recording that `depositor`
    /// paid `amount` into the contract.
    pub fn deposit(
        &mut self,
        token: TokenId,
        depositor: Address,
        amount: i64,
        ctx: &Context,
    ) -> Result<(), ExecError> {
        self.token_trigger(token, depositor, amount, ctx, |kind| match kind {
            FunctionKind::OnDeposit { token_var } => Some(token_var),
            _ => None,
        })
    }

    /// Run the withdraw trigger accepting `token`, recording that
    /// `withdrawer` took `amount` out of the contract.
    pub fn withdraw(
        &mut self,
        token: TokenId,
        withdrawer: Address,
        amount: i64,
        ctx: &Context,
    ) -> Result<(), ExecError> {
        self.token_trigger(token, withdrawer, amount, ctx, |kind| match kind {
            FunctionKind::OnWithdraw { token_var } => Some(token_var),
            _ => None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contract(&self) -> &ValidContract {
        &self.contract
    }

    pub fn id(&self) -> ContractId {
        self.contract.id()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn token_trigger(
        &mut self,
        token: TokenId,
        account: Address,
        amount: i64,
        ctx: &Context,
        token_var: fn(FunctionKind) -> Option<SlotIndex>,
    ) -> Result<(), ExecError> {
        let store = &self.store;
        let trigger = self
            .contract
            .contract()
            .triggers
            .iter()
            .find(|f| {
                token_var(f.kind).is_some_and(|var| {
                    store.var(var) == Some(DataValue::TokenId(token))
                })
            })
            .ok_or(ExecError::UnacceptedToken { token })?;
        run_function(
            self.contract.contract(),
            trigger,
            &mut self.registers,
            &mut self.store,
            ctx,
            vec![DataValue::Address(account), DataValue::Amount(amount)],
        )
    }
}

/// Run one function against `store`, committing its writes only on success.
pub fn run_function<S: StateStore>(
    contract: &Contract,
    function: &Function,
    registers: &mut Registers,
    store: &mut S,
    ctx: &Context,
    args: Vec<DataValue>,
) -> Result<(), ExecError> {
    let id = contract.id();
    debug!(contract = %id, function = function.id, kind = ?function.kind, "invoke");
    let result = Machine::new(contract, function, registers, &*store, ctx).run(args);
    match result {
        Ok(writes) => {
            debug!(contract = %id, writes = writes.len(), "commit");
            store.apply(writes);
            Ok(())
        }
        Err(e) => {
            debug!(contract = %id, error = %e, kind = ?e.kind(), "abort");
            Err(e)
        }
    }
}
