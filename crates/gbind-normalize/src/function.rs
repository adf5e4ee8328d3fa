//! Function declarations → canonical signatures.

use gbind_extract::{FunctionDecl, RawDeclaration};
use gbind_types::TypeMapper;

use crate::config::NormalizeConfig;
use crate::error::Result;
use crate::scalar;
use crate::signature::{self, CanonicalSignature};
use crate::skip::{self, SkipManifest, SkipRecord};

/// Outcome of normalizing one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// One signature, or one per scalar kind.
    Bound(Vec<CanonicalSignature>),
    Skipped(SkipRecord),
}

/// Normalize one function declaration.
///
/// Skips are values, not errors; only configuration problems in the rule
/// tables abort.
pub fn normalize_function(
    decl: &FunctionDecl,
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> Result<Normalized> {
    if let Some(reason) = skip::check(decl, mapper, config)? {
        return Ok(Normalized::Skipped(SkipRecord {
            name: decl.name.clone(),
            overload_name: decl.overload_name.clone(),
            reason,
        }));
    }

    let signatures = scalar::expand(decl)
        .iter()
        .map(|variant| signature::build(variant, mapper, config))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Normalized::Bound(signatures))
}

/// Every bound signature of a feed, in input order, plus the skips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionUnit {
    pub signatures: Vec<CanonicalSignature>,
    pub manifest: SkipManifest,
}

/// Normalize every function declaration in `decls`; other kinds are ignored.
pub fn normalize_functions(
    decls: &[RawDeclaration],
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> Result<FunctionUnit> {
    let mut unit = FunctionUnit::default();
    let mut declarations = 0usize;

    for decl in decls {
        let RawDeclaration::Function(function) = decl else {
            continue;
        };
        declarations += 1;
        match normalize_function(function, mapper, config)? {
            Normalized::Bound(signatures) => unit.signatures.extend(signatures),
            Normalized::Skipped(record) => {
                skip::log_skip(&record);
                unit.manifest.push(record);
            }
        }
    }

    tracing::info!(
        declarations,
        bound = unit.signatures.len(),
        skipped = unit.manifest.len(),
        "normalized function declarations"
    );
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skip::SkipReason;
    use gbind_extract::{ArgumentDecl, ReturnDecl};

    fn tensor_fn(name: &str, overload_name: &str, other: &str) -> FunctionDecl {
        let arg = |name: &str, native: &str| ArgumentDecl {
            name: name.into(),
            native_type: native.into(),
            spelled_type: native.into(),
            nullable: false,
            size: None,
            annotation: None,
        };
        let args = vec![arg("self", "at::Tensor"), arg("other", other)];
        FunctionDecl {
            name: name.into(),
            overload_name: overload_name.into(),
            method_of: vec!["Tensor".into(), "namespace".into()],
            schema_order_arguments: args.clone(),
            arguments: args,
            returns: vec![ReturnDecl {
                name: String::new(),
                native_type: "at::Tensor".into(),
                spelled_type: "at::Tensor".into(),
            }],
        }
    }

    #[test]
    fn scalar_declaration_binds_three_times() {
        let mapper = TypeMapper::with_defaults();
        let config = NormalizeConfig::default();
        let Normalized::Bound(sigs) =
            normalize_function(&tensor_fn("mul", "Scalar", "at::Scalar"), &mapper, &config).unwrap()
        else {
            panic!("expected bound");
        };
        assert_eq!(sigs.len(), 3);
        for sig in &sigs {
            assert_eq!(sig.arguments.len(), 2);
            assert_eq!(sig.arguments[0], sigs[0].arguments[0]);
            assert!(sig.return_rv_directly());
        }
    }

    #[test]
    fn unit_keeps_order_and_records_skips() {
        let decls = vec![
            RawDeclaration::Function(tensor_fn("sub", "Tensor", "at::Tensor")),
            RawDeclaration::Function(tensor_fn("_sparse_mask", "", "at::Tensor")),
            RawDeclaration::Function(tensor_fn("__and__", "Tensor", "at::Tensor")),
            RawDeclaration::Function(tensor_fn("q_scale", "", "at::QScheme")),
        ];
        let unit =
            normalize_functions(&decls, &TypeMapper::with_defaults(), &NormalizeConfig::default())
                .unwrap();
        let names: Vec<_> = unit.signatures.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["torch_tensor_sub_tensor", "torch_tensor_op_and_tensor"]);

        assert_eq!(unit.manifest.len(), 2);
        assert_eq!(unit.manifest.skipped[0].reason, SkipReason::Internal);
        assert!(matches!(
            unit.manifest.skipped[1].reason,
            SkipReason::UnmappableArgument { .. }
        ));
    }
}
