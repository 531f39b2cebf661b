//! Size limits for contract descriptors.
//!
//! [`Limits`] is the builder's only configuration. Its `Default` is the
//! protocol constants below; the VM sizes its register file from the limits
//! a contract was built with.

use crate::error::{BuildError, Namespace};
use crate::namespaced;
use ledgervm_common::value::{MAX_BIG_INTEGER_BYTES, MAX_SHORT_TEXT_BYTES};
use ledgervm_common::{Contract, DataValue, Instruction, Reg};

/// Number of registers available to one invocation.
pub const REGISTER_CAPACITY: usize = 64;

/// Maximum opcodes in one function body.
pub const MAX_INSTRUCTIONS: usize = 256;

/// Maximum functions in one namespace (triggers or public functions).
pub const MAX_FUNCTIONS: usize = 64;

/// Tunable bounds applied by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub register_capacity: usize,
    pub max_instructions: usize,
    pub max_functions: usize,
    pub max_short_text: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            register_capacity: REGISTER_CAPACITY,
            max_instructions: MAX_INSTRUCTIONS,
            max_functions: MAX_FUNCTIONS,
            max_short_text: MAX_SHORT_TEXT_BYTES,
        }
    }
}

/// Upper bounds the bytecode layout places on each limit.
const FORMAT_BOUNDS: [(&str, usize); 4] = [
    ("register_capacity", Reg::MAX as usize + 1),
    ("max_instructions", u16::MAX as usize),
    ("max_functions", u16::MAX as usize),
    ("max_short_text", MAX_SHORT_TEXT_BYTES),
];

/// Run the limits check.
pub fn check_limits(contract: &Contract, limits: &Limits) -> Vec<BuildError> {
    let mut errors = Vec::new();

    let values = [
        limits.register_capacity,
        limits.max_instructions,
        limits.max_functions,
        limits.max_short_text,
    ];
    for ((limit, max), value) in FORMAT_BOUNDS.into_iter().zip(values) {
        if value > max {
            errors.push(BuildError::LimitAboveFormat { limit, value, max });
        }
    }
    // Counts are written as u8 even when the register file is larger.
    let max_params = limits.register_capacity.min(u8::MAX as usize);

    for (namespace, list) in [
        (Namespace::Triggers, &contract.triggers),
        (Namespace::Functions, &contract.functions),
    ] {
        if list.len() > limits.max_functions {
            errors.push(BuildError::TooManyFunctions {
                namespace,
                count: list.len(),
                max: limits.max_functions,
            });
        }
    }

    for (namespace, f) in namespaced(contract) {
        if f.instructions.len() > limits.max_instructions {
            errors.push(BuildError::FunctionTooLong {
                namespace,
                function: f.id,
                len: f.instructions.len(),
                max: limits.max_instructions,
            });
        }
        if f.params.len() > max_params {
            errors.push(BuildError::TooManyParams {
                namespace,
                function: f.id,
                count: f.params.len(),
                max: max_params,
            });
        }
        if f.return_types.len() > u8::MAX as usize {
            errors.push(BuildError::TooManyReturns {
                namespace,
                function: f.id,
                count: f.return_types.len(),
                max: u8::MAX as usize,
            });
        }
        for (at, instr) in f.instructions.iter().enumerate() {
            let Instruction::ConstantGet { value, .. } = instr else {
                continue;
            };
            match value {
                DataValue::ShortText(text) if text.len() > limits.max_short_text => {
                    errors.push(BuildError::TextTooLong {
                        namespace,
                        function: f.id,
                        at,
                        len: text.len(),
                        max: limits.max_short_text,
                    });
                }
                DataValue::BigInteger(v) => {
                    let len = v.to_signed_bytes_be().len();
                    if len > MAX_BIG_INTEGER_BYTES {
                        errors.push(BuildError::BigIntegerTooLong {
                            namespace,
                            function: f.id,
                            at,
                            len,
                            max: MAX_BIG_INTEGER_BYTES,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervm_common::{DataType, Function, FunctionKind};

    fn contract(functions: Vec<Function>) -> Contract {
        Contract {
            language_id: crate::LANGUAGE_ID.to_string(),
            version: 1,
            triggers: vec![Function::trigger(0, FunctionKind::OnInit, vec![], vec![])],
            functions,
            state_vars: vec![],
            state_maps: vec![],
            textual: None,
        }
    }

    #[test]
    fn small_contract_passes() {
        let c = contract(vec![Function::public(
            0,
            vec![DataType::Amount],
            vec![Instruction::LoadCaller { dest: 1 }],
        )]);
        assert!(check_limits(&c, &Limits::default()).is_empty());
    }

    #[test]
    fn function_too_long() {
        let body = vec![Instruction::LoadCaller { dest: 0 }; MAX_INSTRUCTIONS + 1];
        let c = contract(vec![Function::public(4, vec![], body)]);
        let errors = check_limits(&c, &Limits::default());
        assert!(errors
            .iter()
            .any(|e| matches!(e, BuildError::FunctionTooLong { function: 4, .. })));
    }

    #[test]
    fn too_many_functions() {
        let fs = (0..=MAX_FUNCTIONS as u16)
            .map(|id| Function::public(id, vec![], vec![]))
            .collect();
        let errors = check_limits(&contract(fs), &Limits::default());
        assert!(errors
            .iter()
            .any(|e| matches!(e, BuildError::TooManyFunctions { count: 65, .. })));
    }

    #[test]
    fn too_many_params() {
        let c = contract(vec![Function::public(
            0,
            vec![DataType::Amount; REGISTER_CAPACITY + 1],
            vec![],
        )]);
        let errors = check_limits(&c, &Limits::default());
        assert!(errors
            .iter()
            .any(|e| matches!(e, BuildError::TooManyParams { count: 65, .. })));
    }

    #[test]
    fn too_many_return_types() {
        let mut f = Function::public(2, vec![], vec![]);
        f.return_types = vec![DataType::Amount; 256];
        let errors = check_limits(&contract(vec![f]), &Limits::default());
        assert_eq!(
            errors,
            vec![BuildError::TooManyReturns {
                namespace: Namespace::Functions,
                function: 2,
                count: 256,
                max: 255
            }]
        );
    }

    #[test]
    fn oversized_big_integer_literal() {
        let c = contract(vec![Function::public(
            0,
            vec![],
            vec![Instruction::ConstantGet {
                value: DataValue::BigInteger(ledgervm_common::BigInt::from(1) << 2047),
                dest: 0,
            }],
        )]);
        let errors = check_limits(&c, &Limits::default());
        assert!(matches!(
            errors.as_slice(),
            [BuildError::BigIntegerTooLong { len: 257, max: 256, at: 0, .. }]
        ));
    }

    #[test]
    fn limits_above_format_rejected() {
        let limits = Limits {
            register_capacity: 300,
            max_short_text: 5000,
            ..Limits::default()
        };
        let errors = check_limits(&contract(vec![]), &limits);
        assert_eq!(
            errors,
            vec![
                BuildError::LimitAboveFormat {
                    limit: "register_capacity",
                    value: 300,
                    max: 256
                },
                BuildError::LimitAboveFormat {
                    limit: "max_short_text",
                    value: 5000,
                    max: MAX_SHORT_TEXT_BYTES
                },
            ]
        );
    }

    #[test]
    fn params_bounded_by_count_width() {
        let c = contract(vec![Function::public(0, vec![DataType::Amount; 256], vec![])]);
        let limits = Limits {
            register_capacity: 256,
            ..Limits::default()
        };
        let errors = check_limits(&c, &limits);
        assert!(errors
            .iter()
            .any(|e| matches!(e, BuildError::TooManyParams { count: 256, max: 255, .. })));
    }

    #[test]
    fn tighter_limits_apply() {
        let c = contract(vec![Function::public(
            0,
            vec![],
            vec![Instruction::ConstantGet {
                value: DataValue::ShortText("twelve bytes".to_string()),
                dest: 0,
            }],
        )]);
        let limits = Limits {
            max_short_text: 8,
            ..Limits::default()
        };
        assert!(check_limits(&c, &Limits::default()).is_empty());
        let errors = check_limits(&c, &limits);
        assert!(matches!(
            errors.as_slice(),
            [BuildError::TextTooLong { len: 12, max: 8, .. }]
        ));
    }
}
