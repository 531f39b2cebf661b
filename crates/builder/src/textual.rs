//! Textual metadata pass.
//!
//! Signatures have no execution effect, but when present they must line up
//! with the descriptor they describe.

use crate::error::{BuildError, Namespace};
use ledgervm_common::contract::MAX_NAME_BYTES;
use ledgervm_common::{Contract, Function, FunctionSignature, Textual};

/// Run the textual check. A descriptor without metadata passes.
pub fn check_textual(contract: &Contract) -> Vec<BuildError> {
    let mut errors = Vec::new();
    let Some(textual) = &contract.textual else {
        return errors;
    };

    let counts = [
        ("trigger", contract.triggers.len(), textual.triggers.len()),
        ("function", contract.functions.len(), textual.functions.len()),
        ("state var", contract.state_vars.len(), textual.state_vars.len()),
        ("state map", contract.state_maps.len(), textual.state_maps.len()),
    ];
    for (section, expected, found) in counts {
        if expected != found {
            errors.push(BuildError::TextualCountMismatch {
                section,
                expected,
                found,
            });
        }
    }

    check_signatures(
        Namespace::Triggers,
        &contract.triggers,
        &textual.triggers,
        &mut errors,
    );
    check_signatures(
        Namespace::Functions,
        &contract.functions,
        &textual.functions,
        &mut errors,
    );

    check_name_lengths(textual, &mut errors);

    errors
}

fn check_name_lengths(textual: &Textual, errors: &mut Vec<BuildError>) {
    let signatures = textual.triggers.iter().chain(&textual.functions);
    let mut names: Vec<(&'static str, &str)> = Vec::new();
    for sig in signatures {
        names.push(("function", sig.name.as_str()));
        names.extend(sig.param_names.iter().map(|n| ("parameter", n.as_str())));
        names.extend(sig.return_names.iter().map(|n| ("return value", n.as_str())));
    }
    names.extend(textual.state_vars.iter().map(|n| ("state var", n.as_str())));
    names.extend(textual.state_maps.iter().map(|n| ("state map", n.as_str())));

    for (section, name) in names {
        if name.len() > MAX_NAME_BYTES {
            errors.push(BuildError::NameTooLong {
                section,
                len: name.len(),
                max: MAX_NAME_BYTES,
            });
        }
    }
}

fn check_signatures(
    namespace: Namespace,
    functions: &[Function],
    signatures: &[FunctionSignature],
    errors: &mut Vec<BuildError>,
) {
    for (f, sig) in functions.iter().zip(signatures) {
        for (what, expected, found) in [
            ("parameters", f.params.len(), sig.param_names.len()),
            ("return values", f.return_types.len(), sig.return_names.len()),
        ] {
            if expected != found {
                errors.push(BuildError::SignatureMismatch {
                    namespace,
                    function: f.id,
                    what,
                    expected,
                    found,
                });
            }
        }
    }
}
