//! Structural pass: function ids, trigger placement, slot declarations.
//!
//! Also builds the [`SlotTable`] used by later passes to resolve state var
//! and state map indices.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BuildError, Namespace};
use ledgervm_common::{Contract, FunctionKind, SlotIndex, StateMap, StateVar};

/// Declared state slots, keyed by index.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    pub vars: BTreeMap<SlotIndex, StateVar>,
    pub maps: BTreeMap<SlotIndex, StateMap>,
}

/// Run the structural pass.
///
/// Returns the slot table and any errors found. When indices collide, the
/// first declaration wins in the table.
pub fn check_structural(contract: &Contract) -> (SlotTable, Vec<BuildError>) {
    let mut errors = Vec::new();

    for (namespace, list) in [
        (Namespace::Triggers, &contract.triggers),
        (Namespace::Functions, &contract.functions),
    ] {
        let mut seen = BTreeSet::new();
        for f in list {
            if !seen.insert(f.id) {
                errors.push(BuildError::DuplicateFunctionId {
                    namespace,
                    id: f.id,
                });
            }
            let in_place = match namespace {
                Namespace::Triggers => f.kind.is_trigger(),
                Namespace::Functions => !f.kind.is_trigger(),
            };
            if !in_place {
                errors.push(BuildError::MisplacedFunction {
                    namespace,
                    id: f.id,
                });
            }
        }
    }

    let inits = contract
        .triggers
        .iter()
        .filter(|f| f.kind == FunctionKind::OnInit)
        .count();
    match inits {
        0 => errors.push(BuildError::MissingInitTrigger),
        1 => {}
        count => errors.push(BuildError::MultipleInitTriggers { count }),
    }

    let mut slots = SlotTable::default();
    for var in &contract.state_vars {
        if slots.vars.contains_key(&var.index) {
            errors.push(BuildError::DuplicateStateVar { index: var.index });
        } else {
            slots.vars.insert(var.index, *var);
        }
    }
    for map in &contract.state_maps {
        if slots.maps.contains_key(&map.index) {
            errors.push(BuildError::DuplicateStateMap { index: map.index });
        } else {
            slots.maps.insert(map.index, *map);
        }
    }

    (slots, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervm_common::{DataType, Function};

    fn contract() -> Contract {
        Contract {
            language_id: crate::LANGUAGE_ID.to_string(),
            version: 1,
            triggers: vec![Function::trigger(0, FunctionKind::OnInit, vec![], vec![])],
            functions: vec![
                Function::public(0, vec![], vec![]),
                Function::public(1, vec![], vec![]),
            ],
            state_vars: vec![
                StateVar::new(0, DataType::Address),
                StateVar::new(1, DataType::Amount),
            ],
            state_maps: vec![StateMap::new(0, DataType::Address, DataType::Amount)],
            textual: None,
        }
    }

    #[test]
    fn well_formed_passes() {
        let (slots, errors) = check_structural(&contract());
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(slots.vars.len(), 2);
        assert_eq!(slots.maps[&0].value_type, DataType::Amount);
    }

    #[test]
    fn duplicate_public_id() {
        let mut c = contract();
        c.functions.push(Function::public(1, vec![], vec![]));
        let (_, errors) = check_structural(&c);
        assert_eq!(
            errors,
            vec![BuildError::DuplicateFunctionId {
                namespace: Namespace::Functions,
                id: 1
            }]
        );
    }

    #[test]
    fn same_id_in_both_namespaces_is_fine() {
        // Trigger 0 and public function 0 live in different namespaces.
        let (_, errors) = check_structural(&contract());
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_init() {
        let mut c = contract();
        c.triggers.clear();
        let (_, errors) = check_structural(&c);
        assert_eq!(errors, vec![BuildError::MissingInitTrigger]);
    }

    #[test]
    fn two_inits() {
        let mut c = contract();
        c.triggers
            .push(Function::trigger(1, FunctionKind::OnInit, vec![], vec![]));
        let (_, errors) = check_structural(&c);
        assert_eq!(errors, vec![BuildError::MultipleInitTriggers { count: 2 }]);
    }

    #[test]
    fn public_in_trigger_list() {
        let mut c = contract();
        c.triggers.push(Function::public(5, vec![], vec![]));
        let (_, errors) = check_structural(&c);
        assert_eq!(
            errors,
            vec![BuildError::MisplacedFunction {
                namespace: Namespace::Triggers,
                id: 5
            }]
        );
    }

    #[test]
    fn duplicate_slots() {
        let mut c = contract();
        c.state_vars.push(StateVar::new(1, DataType::Boolean));
        c.state_maps
            .push(StateMap::new(0, DataType::Int32, DataType::Int32));
        let (slots, errors) = check_structural(&c);
        assert!(errors.contains(&BuildError::DuplicateStateVar { index: 1 }));
        assert!(errors.contains(&BuildError::DuplicateStateMap { index: 0 }));
        assert_eq!(slots.vars[&1].data_type, DataType::Amount);
    }
}
