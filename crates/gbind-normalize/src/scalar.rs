//! Expansion of scalar-polymorphic declarations into concrete variants.
//!
//! The generic numeric scalar has no single target type, so a declaration
//! taking one is bound once per concrete kind.

use gbind_extract::FunctionDecl;
use gbind_types::native::canonicalize;

/// A concrete kind substituted for the generic scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Integral,
    Floating,
    Boolean,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 3] = [ScalarKind::Integral, ScalarKind::Floating, ScalarKind::Boolean];

    /// Native type substituted for the scalar; doubles as the overload tag.
    pub fn native(self) -> &'static str {
        match self {
            ScalarKind::Integral => "long",
            ScalarKind::Floating => "double",
            ScalarKind::Boolean => "bool",
        }
    }
}

/// Whether `native` names the generic scalar type.
pub fn is_scalar(native: &str) -> bool {
    matches!(
        canonicalize(native).as_str(),
        "at::Scalar" | "c10::Scalar" | "Scalar"
    )
}

/// A declaration ready for signature building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedDecl {
    pub decl: FunctionDecl,
    /// Overload tag added by expansion.
    pub overload: Option<String>,
    /// Argument native types before substitution, by position.
    pub api_types: Vec<String>,
}

impl ExpandedDecl {
    pub fn new(decl: FunctionDecl) -> Self {
        let api_types = decl.arguments.iter().map(|a| a.native_type.clone()).collect();
        Self {
            decl,
            overload: None,
            api_types,
        }
    }

    fn has_scalar(&self) -> bool {
        self.decl.arguments.iter().any(|a| is_scalar(&a.native_type))
    }

    fn substitute(&self, kind: ScalarKind) -> ExpandedDecl {
        let mut variant = self.clone();
        for arg in &mut variant.decl.arguments {
            if is_scalar(&arg.native_type) {
                arg.native_type = kind.native().to_string();
            }
        }
        variant.overload = Some(kind.native().to_string());
        variant
    }
}

/// Expand `decl` into one variant per scalar kind, or return it unchanged.
///
/// Every scalar argument of a variant takes the same kind. Each variant is
/// expanded again, which is a no-op once no scalar remains.
pub fn expand(decl: &FunctionDecl) -> Vec<ExpandedDecl> {
    expand_variant(ExpandedDecl::new(decl.clone()))
}

fn expand_variant(variant: ExpandedDecl) -> Vec<ExpandedDecl> {
    if !variant.has_scalar() {
        return vec![variant];
    }
    ScalarKind::ALL
        .iter()
        .flat_map(|kind| expand_variant(variant.substitute(*kind)))
        .collect()
}
