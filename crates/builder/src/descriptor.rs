//! Fluent assembly of contract descriptors.

use crate::error::BuildError;
use crate::limits::Limits;
use crate::{build_contract_with_limits, ValidContract, LANGUAGE_ID};
use ledgervm_common::{
    Contract, DataType, Function, FunctionSignature, SlotIndex, StateMap, StateVar, Textual,
};

/// Collects the parts of a descriptor, then validates it in one step.
///
/// Textual metadata is recorded only when every part was given a name; a
/// builder that mixes named and unnamed parts produces no metadata.
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    version: i32,
    triggers: Vec<Function>,
    functions: Vec<Function>,
    state_vars: Vec<StateVar>,
    state_maps: Vec<StateMap>,
    textual: Textual,
    named: bool,
}

impl ContractBuilder {
    pub fn new(version: i32) -> Self {
        Self {
            version,
            triggers: Vec::new(),
            functions: Vec::new(),
            state_vars: Vec::new(),
            state_maps: Vec::new(),
            textual: Textual::default(),
            named: true,
        }
    }

    pub fn state_var(mut self, name: &str, index: SlotIndex, data_type: DataType) -> Self {
        self.state_vars.push(StateVar::new(index, data_type));
        self.textual.state_vars.push(name.to_string());
        self
    }

    pub fn state_map(
        mut self,
        name: &str,
        index: SlotIndex,
        key_type: DataType,
        value_type: DataType,
    ) -> Self {
        self.state_maps
            .push(StateMap::new(index, key_type, value_type));
        self.textual.state_maps.push(name.to_string());
        self
    }

    pub fn trigger(mut self, signature: FunctionSignature, function: Function) -> Self {
        self.triggers.push(function);
        self.textual.triggers.push(signature);
        self
    }

    pub fn function(mut self, signature: FunctionSignature, function: Function) -> Self {
        self.functions.push(function);
        self.textual.functions.push(signature);
        self
    }

    /// Add a function without a signature. Drops textual metadata.
    pub fn unnamed_function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self.named = false;
        self
    }

    /// The descriptor as assembled so far, unvalidated.
    pub fn into_contract(self) -> Contract {
        Contract {
            language_id: LANGUAGE_ID.to_string(),
            version: self.version,
            triggers: self.triggers,
            functions: self.functions,
            state_vars: self.state_vars,
            state_maps: self.state_maps,
            textual: self.named.then_some(self.textual),
        }
    }

    pub fn build(self) -> Result<ValidContract, Vec<BuildError>> {
        self.build_with_limits(Limits::default())
    }

    pub fn build_with_limits(self, limits: Limits) -> Result<ValidContract, Vec<BuildError>> {
        build_contract_with_limits(self.into_contract(), limits)
    }
}
