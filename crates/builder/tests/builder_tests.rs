//! Integration tests for the contract builder.

use ledgervm_builder::{
    build_contract, build_contract_with_limits, build_from_bytecode, BuildError, ContractBuilder,
    Limits, Namespace, LANGUAGE_ID,
};
use ledgervm_common::{
    Contract, DataType, DataValue, Function, FunctionKind, FunctionSignature, Instruction,
    StateMap, StateVar,
};
use proptest::prelude::*;

fn owner_init() -> Function {
    Function::trigger(
        0,
        FunctionKind::OnInit,
        vec![],
        vec![
            Instruction::LoadSigner { dest: 0 },
            Instruction::CdbvSet { var: 0, value: 0 },
        ],
    )
}

fn base() -> Contract {
    Contract {
        language_id: LANGUAGE_ID.to_string(),
        version: 1,
        triggers: vec![owner_init()],
        functions: vec![],
        state_vars: vec![
            StateVar::new(0, DataType::Address),
            StateVar::new(1, DataType::Amount),
        ],
        state_maps: vec![StateMap::new(0, DataType::Address, DataType::Amount)],
        textual: None,
    }
}

// ========================================================
// Valid descriptors pass
// ========================================================

#[test]
fn accept_counter_contract() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![DataType::Amount],
        vec![
            Instruction::CdbvrGet { var: 0, dest: 1 },
            Instruction::AssertCaller { account: 1 },
            Instruction::CdbvStateValAdd { var: 1, value: 0 },
        ],
    ));
    assert!(build_contract(c).is_ok());
}

#[test]
fn accept_ledger_contract() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![DataType::Address, DataType::Amount],
        vec![
            Instruction::LoadCaller { dest: 2 },
            Instruction::CdbvMapValMinus {
                map: 0,
                key: 2,
                value: 1,
            },
            Instruction::CdbvMapValAdd {
                map: 0,
                key: 0,
                value: 1,
            },
        ],
    ));
    assert!(build_contract(c).is_ok());
}

#[test]
fn accept_deposit_trigger_on_token_var() {
    let mut c = base();
    c.state_vars.push(StateVar::new(2, DataType::TokenId));
    c.triggers.push(Function::trigger(
        1,
        FunctionKind::OnDeposit { token_var: 2 },
        vec![DataType::Address, DataType::Amount],
        vec![Instruction::CdbvMapValAdd {
            map: 0,
            key: 0,
            value: 1,
        }],
    ));
    assert!(build_contract(c).is_ok());
}

#[test]
fn accept_bytecode() {
    let bytes = base().encode();
    let valid = build_from_bytecode(&bytes).unwrap();
    assert_eq!(valid.contract(), &base());
}

// ========================================================
// Invalid descriptors are rejected
// ========================================================

#[test]
fn reject_out_of_range_state_var() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![DataType::Amount],
        vec![Instruction::CdbvSet { var: 40, value: 0 }],
    ));
    let errors = build_contract(c).unwrap_err();
    assert_eq!(
        errors,
        vec![BuildError::UndeclaredStateVar {
            namespace: Namespace::Functions,
            function: 0,
            at: 0,
            index: 40
        }]
    );
}

#[test]
fn reject_unwritten_register() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![],
        vec![Instruction::CdbvStateValAdd { var: 1, value: 3 }],
    ));
    let errors = build_contract(c).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, BuildError::UndefinedRegister { register: 3, .. })));
}

#[test]
fn reject_wrong_literal_type_for_slot() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![],
        vec![
            Instruction::ConstantGet {
                value: DataValue::Int32(5),
                dest: 0,
            },
            Instruction::CdbvSet { var: 1, value: 0 },
        ],
    ));
    let errors = build_contract(c).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        BuildError::TypeMismatch {
            expected: DataType::Amount,
            found: DataType::Int32,
            ..
        }
    )));
}

#[test]
fn reject_duplicate_public_ids() {
    let mut c = base();
    c.functions.push(Function::public(3, vec![], vec![]));
    c.functions.push(Function::public(3, vec![], vec![]));
    let errors = build_contract(c).unwrap_err();
    assert!(errors.contains(&BuildError::DuplicateFunctionId {
        namespace: Namespace::Functions,
        id: 3
    }));
}

#[test]
fn reject_trigger_on_non_token_var() {
    let mut c = base();
    c.triggers.push(Function::trigger(
        1,
        FunctionKind::OnWithdraw { token_var: 1 },
        vec![],
        vec![],
    ));
    let errors = build_contract(c).unwrap_err();
    assert!(errors.contains(&BuildError::InvalidTokenVar {
        function: 1,
        index: 1
    }));
}

#[test]
fn reject_wrong_language() {
    let mut c = base();
    c.language_id = "other".to_string();
    assert!(matches!(
        build_contract(c).unwrap_err().as_slice(),
        [BuildError::UnsupportedLanguage { .. }]
    ));
}

#[test]
fn reject_garbage_bytecode() {
    let errors = build_from_bytecode(&[0xFF, 0x00]).unwrap_err();
    assert!(matches!(errors.as_slice(), [BuildError::Decode(_)]));
}

#[test]
fn custom_limits_shrink_register_file() {
    let mut c = base();
    c.functions.push(Function::public(
        0,
        vec![],
        vec![Instruction::LoadCaller { dest: 20 }],
    ));
    let limits = Limits {
        register_capacity: 16,
        ..Limits::default()
    };
    assert!(build_contract(c.clone()).is_ok());
    let errors = build_contract_with_limits(c, limits).unwrap_err();
    assert!(matches!(
        errors.as_slice(),
        [BuildError::RegisterOutOfRange {
            register: 20,
            capacity: 16,
            ..
        }]
    ));
}

#[test]
fn fluent_builder_matches_literal() {
    let valid = ContractBuilder::new(1)
        .state_var("owner", 0, DataType::Address)
        .state_var("total", 1, DataType::Amount)
        .state_map("balances", 0, DataType::Address, DataType::Amount)
        .trigger(FunctionSignature::new("init", &[]), owner_init())
        .build()
        .unwrap();
    let mut c = valid.into_contract();
    assert!(c.textual.is_some());
    c.textual = None;
    assert_eq!(c, base());
}

#[test]
fn reject_overlong_slot_name() {
    let errors = ContractBuilder::new(1)
        .state_var(&"n".repeat(2000), 0, DataType::Address)
        .trigger(FunctionSignature::new("init", &[]), owner_init())
        .build()
        .unwrap_err();
    assert_eq!(
        errors,
        vec![BuildError::NameTooLong {
            section: "state var",
            len: 2000,
            max: 1024
        }]
    );
}

#[test]
fn reject_short_text_limit_past_decoder() {
    let limits = Limits {
        max_short_text: 5000,
        ..Limits::default()
    };
    let errors = build_contract_with_limits(base(), limits).unwrap_err();
    assert!(matches!(
        errors.as_slice(),
        [BuildError::LimitAboveFormat {
            limit: "max_short_text",
            value: 5000,
            max: 140
        }]
    ));
}

#[test]
fn built_contract_reloads_from_own_bytecode() {
    let valid = ContractBuilder::new(1)
        .state_var(&"n".repeat(1024), 0, DataType::Address)
        .trigger(FunctionSignature::new("init", &[]), owner_init())
        .function(
            FunctionSignature::new("note", &["text"]),
            Function::public(
                0,
                vec![DataType::ShortText],
                vec![Instruction::ConstantGet {
                    value: DataValue::ShortText("t".repeat(140)),
                    dest: 1,
                }],
            ),
        )
        .build()
        .unwrap();
    let reloaded = build_from_bytecode(&valid.contract().encode()).unwrap();
    assert_eq!(reloaded.contract(), valid.contract());
    assert_eq!(reloaded.id(), valid.id());
}

// ========================================================
// Properties
// ========================================================

proptest! {
    /// Any reference to an undeclared state var index is rejected.
    #[test]
    fn undeclared_var_always_rejected(index in 2u8.., dest in 0u8..64) {
        let mut c = base();
        c.functions.push(Function::public(
            0,
            vec![],
            vec![Instruction::CdbvrGet { var: index, dest }],
        ));
        let errors = build_contract(c).unwrap_err();
        let rejected = errors
            .iter()
            .any(|e| matches!(e, BuildError::UndeclaredStateVar { index: i, .. } if *i == index));
        prop_assert!(rejected);
    }

    /// A contract the builder accepts always decodes from its own bytecode.
    #[test]
    fn accepted_contracts_reload(name_len in 0usize..1500, text_len in 0usize..200) {
        let built = ContractBuilder::new(1)
            .state_var(&"v".repeat(name_len), 0, DataType::Address)
            .trigger(FunctionSignature::new("init", &[]), owner_init())
            .function(
                FunctionSignature::new("note", &[]),
                Function::public(
                    0,
                    vec![],
                    vec![Instruction::ConstantGet {
                        value: DataValue::ShortText("t".repeat(text_len)),
                        dest: 0,
                    }],
                ),
            )
            .build();
        match built {
            Ok(valid) => {
                let reloaded = build_from_bytecode(&valid.contract().encode());
                prop_assert!(reloaded.is_ok());
            }
            Err(errors) => prop_assert!(name_len > 1024 || text_len > 140, "{errors:?}"),
        }
    }

    /// Registers at or past capacity are always rejected.
    #[test]
    fn register_past_capacity_rejected(dest in 64u8..) {
        let mut c = base();
        c.functions.push(Function::public(0, vec![], vec![Instruction::LoadTimestamp { dest }]));
        prop_assert!(build_contract(c).is_err());
    }
}
