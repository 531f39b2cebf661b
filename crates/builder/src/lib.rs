//! Ledger contract builder: static validation of contract descriptors.
//!
//! The builder checks a [`Contract`] BEFORE deployment. It collects ALL
//! errors (not just the first) and returns them. A descriptor that passes
//! is wrapped in [`ValidContract`], the only form the VM accepts.
//!
//! # Usage
//!
//! ```
//! use ledgervm_builder::{build_contract, LANGUAGE_ID};
//! use ledgervm_common::{Contract, DataType, Function, FunctionKind, Instruction, StateVar};
//!
//! let contract = Contract {
//!     language_id: LANGUAGE_ID.to_string(),
//!     version: 1,
//!     triggers: vec![Function::trigger(
//!         0,
//!         FunctionKind::OnInit,
//!         vec![],
//!         vec![
//!             Instruction::LoadSigner { dest: 0 },
//!             Instruction::CdbvSet { var: 0, value: 0 },
//!         ],
//!     )],
//!     functions: vec![],
//!     state_vars: vec![StateVar::new(0, DataType::Address)],
//!     state_maps: vec![],
//!     textual: None,
//! };
//!
//! let valid = build_contract(contract).unwrap();
//! assert_eq!(valid.contract().version, 1);
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: function count, body length, parameter count, text length
//! 2. **Header**: language id, version, version-gated opcodes
//! 3. **Structural**: function ids, init trigger, slot uniqueness
//! 4. **Bounds**: declared slots, register range, trigger token vars
//! 5. **Types**: read-before-write and static type agreement
//! 6. **Textual**: signature metadata lines up with the descriptor

pub mod bounds;
pub mod descriptor;
pub mod error;
pub mod header;
pub mod limits;
pub mod structural;
pub mod textual;
pub mod types;

pub use descriptor::ContractBuilder;
pub use error::{BuildError, Namespace};
pub use limits::{Limits, REGISTER_CAPACITY};

use ledgervm_common::{Contract, ContractId, Function, FunctionId, FunctionKind};

/// Language id every descriptor must carry.
pub const LANGUAGE_ID: &str = "ledgervm";

/// Language versions this builder accepts.
pub const SUPPORTED_VERSIONS: [i32; 2] = [1, 2];

/// A descriptor that passed every validation pass.
///
/// Can only be obtained from [`build_contract`] and friends, and is never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContract {
    contract: Contract,
    id: ContractId,
    limits: Limits,
}

impl ValidContract {
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Content-derived contract id.
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// The limits this contract was validated against.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Public function with the given id.
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.contract.functions.iter().find(|f| f.id == id)
    }

    /// The single init trigger.
    pub fn init_trigger(&self) -> Option<&Function> {
        self.triggers_where(|k| k == FunctionKind::OnInit).next()
    }

    /// Triggers whose kind satisfies `pred`, in declaration order.
    pub fn triggers_where(
        &self,
        pred: impl Fn(FunctionKind) -> bool,
    ) -> impl Iterator<Item = &Function> {
        self.contract.triggers.iter().filter(move |f| pred(f.kind))
    }

    pub fn into_contract(self) -> Contract {
        self.contract
    }
}

/// Validate a descriptor with the default [`Limits`].
pub fn build_contract(contract: Contract) -> Result<ValidContract, Vec<BuildError>> {
    build_contract_with_limits(contract, Limits::default())
}

/// Validate a descriptor.
///
/// Returns the wrapped contract if it passes all checks, or every error
/// found. If the structural or bounds passes fail, the type pass is skipped
/// because it indexes slots and registers those passes vouch for.
pub fn build_contract_with_limits(
    contract: Contract,
    limits: Limits,
) -> Result<ValidContract, Vec<BuildError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Limits (independent)
    all_errors.extend(limits::check_limits(&contract, &limits));

    // Pass 2: Header
    all_errors.extend(header::check_header(&contract));

    // Pass 3: Structural (builds the slot table)
    let (slots, structural_errors) = structural::check_structural(&contract);
    let fatal = !structural_errors.is_empty();
    all_errors.extend(structural_errors);

    // Pass 4: Bounds
    let bounds_errors = bounds::check_bounds(&contract, &slots, &limits);
    let fatal = fatal || !bounds_errors.is_empty();
    all_errors.extend(bounds_errors);

    // Pass 5: Types
    if !fatal {
        all_errors.extend(types::check_types(&contract, &slots));
    }

    // Pass 6: Textual
    all_errors.extend(textual::check_textual(&contract));

    if all_errors.is_empty() {
        let id = contract.id();
        Ok(ValidContract {
            contract,
            id,
            limits,
        })
    } else {
        Err(all_errors)
    }
}

/// Decode bytecode and validate the descriptor it carries.
pub fn build_from_bytecode(bytes: &[u8]) -> Result<ValidContract, Vec<BuildError>> {
    let contract = Contract::decode(bytes).map_err(|e| vec![BuildError::from(e)])?;
    build_contract(contract)
}

/// Every function of a descriptor tagged with its namespace.
pub(crate) fn namespaced(contract: &Contract) -> impl Iterator<Item = (Namespace, &Function)> {
    let triggers = contract.triggers.iter().map(|f| (Namespace::Triggers, f));
    let functions = contract.functions.iter().map(|f| (Namespace::Functions, f));
    triggers.chain(functions)
}
