//! Header pass: language id, version, and version-gated opcodes.

use crate::error::BuildError;
use crate::{namespaced, LANGUAGE_ID, SUPPORTED_VERSIONS};
use ledgervm_common::{Contract, DataValue, Instruction};

/// Language version that introduced big-integer opcodes and literals.
pub const BIG_INTEGER_VERSION: i32 = 2;

/// Run the header check.
pub fn check_header(contract: &Contract) -> Vec<BuildError> {
    let mut errors = Vec::new();

    if contract.language_id != LANGUAGE_ID {
        errors.push(BuildError::UnsupportedLanguage {
            found: contract.language_id.clone(),
        });
    }
    if !SUPPORTED_VERSIONS.contains(&contract.version) {
        errors.push(BuildError::UnsupportedVersion {
            version: contract.version,
        });
        // Gating is meaningless against an unknown version.
        return errors;
    }

    for (namespace, f) in namespaced(contract) {
        for (at, instr) in f.instructions.iter().enumerate() {
            let (mnemonic, required) = match instr {
                Instruction::ConstantGet {
                    value: DataValue::BigInteger(_),
                    ..
                } => ("BigInteger literal", BIG_INTEGER_VERSION),
                other => (other.id().mnemonic(), other.id().min_version()),
            };
            if required > contract.version {
                errors.push(BuildError::RequiresVersion {
                    namespace,
                    function: f.id,
                    at,
                    mnemonic,
                    required,
                    version: contract.version,
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervm_common::{BigInt, Function, FunctionKind};

    fn contract(version: i32, body: Vec<Instruction>) -> Contract {
        Contract {
            language_id: LANGUAGE_ID.to_string(),
            version,
            triggers: vec![Function::trigger(0, FunctionKind::OnInit, vec![], body)],
            functions: vec![],
            state_vars: vec![],
            state_maps: vec![],
            textual: None,
        }
    }

    #[test]
    fn supported_header_passes() {
        assert!(check_header(&contract(1, vec![])).is_empty());
        assert!(check_header(&contract(2, vec![])).is_empty());
    }

    #[test]
    fn wrong_language_rejected() {
        let mut c = contract(1, vec![]);
        c.language_id = "evm".to_string();
        assert_eq!(
            check_header(&c),
            vec![BuildError::UnsupportedLanguage {
                found: "evm".to_string()
            }]
        );
    }

    #[test]
    fn unknown_version_rejected() {
        assert_eq!(
            check_header(&contract(7, vec![])),
            vec![BuildError::UnsupportedVersion { version: 7 }]
        );
    }

    #[test]
    fn sqrt_needs_version_two() {
        let body = vec![Instruction::SqrtBigint { a: 0, dest: 1 }];
        let errors = check_header(&contract(1, body.clone()));
        assert!(matches!(
            errors.as_slice(),
            [BuildError::RequiresVersion {
                mnemonic: "basicSqrtBigint",
                required: 2,
                at: 0,
                ..
            }]
        ));
        assert!(check_header(&contract(2, body)).is_empty());
    }

    #[test]
    fn big_integer_literal_needs_version_two() {
        let body = vec![Instruction::ConstantGet {
            value: DataValue::BigInteger(BigInt::from(5)),
            dest: 0,
        }];
        let errors = check_header(&contract(1, body));
        assert!(matches!(
            errors.as_slice(),
            [BuildError::RequiresVersion {
                mnemonic: "BigInteger literal",
                ..
            }]
        ));
    }
}
