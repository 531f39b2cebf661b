//! Bounds pass: every slot operand is declared and every register operand
//! fits the register file.

use crate::error::BuildError;
use crate::limits::Limits;
use crate::namespaced;
use crate::structural::SlotTable;
use ledgervm_common::{Contract, DataType, FunctionKind};

/// Run the bounds check.
pub fn check_bounds(contract: &Contract, slots: &SlotTable, limits: &Limits) -> Vec<BuildError> {
    let mut errors = Vec::new();

    for (namespace, f) in namespaced(contract) {
        if let FunctionKind::OnDeposit { token_var } | FunctionKind::OnWithdraw { token_var } =
            f.kind
        {
            let is_token = slots
                .vars
                .get(&token_var)
                .is_some_and(|v| v.data_type == DataType::TokenId);
            if !is_token {
                errors.push(BuildError::InvalidTokenVar {
                    function: f.id,
                    index: token_var,
                });
            }
        }

        for (at, instr) in f.instructions.iter().enumerate() {
            if let Some(index) = instr.state_var() {
                if !slots.vars.contains_key(&index) {
                    errors.push(BuildError::UndeclaredStateVar {
                        namespace,
                        function: f.id,
                        at,
                        index,
                    });
                }
            }
            if let Some(index) = instr.state_map() {
                if !slots.maps.contains_key(&index) {
                    errors.push(BuildError::UndeclaredStateMap {
                        namespace,
                        function: f.id,
                        at,
                        index,
                    });
                }
            }
            for register in instr.sources().into_iter().chain(instr.dest()) {
                if register as usize >= limits.register_capacity {
                    errors.push(BuildError::RegisterOutOfRange {
                        namespace,
                        function: f.id,
                        at,
                        register,
                        capacity: limits.register_capacity,
                    });
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Namespace;
    use crate::structural::check_structural;
    use ledgervm_common::{Function, Instruction, StateMap, StateVar};

    fn contract(body: Vec<Instruction>) -> Contract {
        Contract {
            language_id: crate::LANGUAGE_ID.to_string(),
            version: 1,
            triggers: vec![
                Function::trigger(0, FunctionKind::OnInit, vec![], vec![]),
                Function::trigger(1, FunctionKind::OnDeposit { token_var: 2 }, vec![], vec![]),
            ],
            functions: vec![Function::public(0, vec![], body)],
            state_vars: vec![
                StateVar::new(0, DataType::Amount),
                StateVar::new(2, DataType::TokenId),
            ],
            state_maps: vec![StateMap::new(0, DataType::Address, DataType::Amount)],
            textual: None,
        }
    }

    fn run(c: &Contract) -> Vec<BuildError> {
        let (slots, _) = check_structural(c);
        check_bounds(c, &slots, &Limits::default())
    }

    #[test]
    fn declared_slots_pass() {
        let c = contract(vec![
            Instruction::CdbvrGetOrDefault { var: 0, dest: 0 },
            Instruction::LoadCaller { dest: 1 },
            Instruction::CdbvrMapGetOrDefault {
                map: 0,
                key: 1,
                dest: 63,
            },
        ]);
        assert!(run(&c).is_empty());
    }

    #[test]
    fn undeclared_state_var() {
        let c = contract(vec![Instruction::CdbvrGet { var: 9, dest: 0 }]);
        assert_eq!(
            run(&c),
            vec![BuildError::UndeclaredStateVar {
                namespace: Namespace::Functions,
                function: 0,
                at: 0,
                index: 9
            }]
        );
    }

    #[test]
    fn undeclared_state_map() {
        let c = contract(vec![
            Instruction::LoadCaller { dest: 0 },
            Instruction::CdbvrMapGet {
                map: 3,
                key: 0,
                dest: 1,
            },
        ]);
        assert!(matches!(
            run(&c).as_slice(),
            [BuildError::UndeclaredStateMap { at: 1, index: 3, .. }]
        ));
    }

    #[test]
    fn register_past_capacity() {
        let c = contract(vec![Instruction::LoadCaller { dest: 64 }]);
        assert!(matches!(
            run(&c).as_slice(),
            [BuildError::RegisterOutOfRange { register: 64, .. }]
        ));
    }

    #[test]
    fn token_var_must_be_token_id() {
        let mut c = contract(vec![]);
        c.triggers[1].kind = FunctionKind::OnWithdraw { token_var: 0 };
        assert_eq!(
            run(&c),
            vec![BuildError::InvalidTokenVar {
                function: 1,
                index: 0
            }]
        );
    }
}
