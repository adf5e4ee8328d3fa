//! Raw declaration records produced by extraction.
//!
//! Records are immutable once produced; every later stage works on copies.

use serde::Serialize;

/// Annotation marking an argument as mutably aliased by the call.
pub const MUTABLE_ALIAS: &str = "a!";

/// Name of the receiver argument of instance methods.
pub const SELF_ARGUMENT: &str = "self";

/// One parsed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawDeclaration {
    Function(FunctionDecl),
    OptionsStruct(OptionsStructDecl),
    VariantEnum(VariantDecl),
    TypeAlias(AliasDecl),
}

impl RawDeclaration {
    pub fn name(&self) -> &str {
        match self {
            RawDeclaration::Function(f) => &f.name,
            RawDeclaration::OptionsStruct(s) => &s.name,
            RawDeclaration::VariantEnum(v) => &v.name,
            RawDeclaration::TypeAlias(a) => &a.name,
        }
    }
}

/// A free function or instance method from the declarations feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Overload discriminator from the feed; may be empty.
    pub overload_name: String,
    /// `namespace` for free functions, receiver type names for methods.
    pub method_of: Vec<String>,
    pub arguments: Vec<ArgumentDecl>,
    /// Arguments in schema order; carries alias annotations.
    pub schema_order_arguments: Vec<ArgumentDecl>,
    pub returns: Vec<ReturnDecl>,
}

impl FunctionDecl {
    /// Whether the feed offers this entity as a free function.
    pub fn is_free_function(&self) -> bool {
        self.method_of.iter().any(|m| m == "namespace")
    }

    /// Whether the first argument is mutated in place by the call.
    ///
    /// Schema order wins when the feed carries it; otherwise the plain
    /// argument list is consulted.
    pub fn mutates_receiver(&self) -> bool {
        let first = if self.schema_order_arguments.is_empty() {
            self.arguments.first()
        } else {
            self.schema_order_arguments.first()
        };
        first.is_some_and(|a| a.annotation.as_deref() == Some(MUTABLE_ALIAS))
    }
}

/// A function argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDecl {
    pub name: String,
    /// Native type with qualifiers stripped by the feed (`dynamic_type`).
    pub native_type: String,
    /// Native type as spelled in the signature.
    pub spelled_type: String,
    pub nullable: bool,
    /// Fixed array length (`IntArrayRef[2]`).
    pub size: Option<usize>,
    pub annotation: Option<String>,
}

impl ArgumentDecl {
    pub fn is_self(&self) -> bool {
        self.name == SELF_ARGUMENT
    }
}

/// A function return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnDecl {
    /// Field name for named tuple returns; may be empty.
    pub name: String,
    pub native_type: String,
    pub spelled_type: String,
}

/// An options struct found in header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsStructDecl {
    pub name: String,
    pub namespace: Vec<String>,
    pub template_params: Vec<String>,
    /// Base class as spelled, template arguments included.
    pub parent: Option<String>,
    pub args: Vec<OptionArgDecl>,
    /// Parameters of the first constructor, if one was declared.
    pub constructor: Option<Vec<ConstructorParam>>,
}

impl OptionsStructDecl {
    /// `a::b::Name`
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

/// A field declared with the argument macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionArgDecl {
    pub native_type: String,
    pub name: String,
    /// Default value literal.
    pub default: Option<String>,
}

/// A constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorParam {
    pub native_type: String,
    pub name: String,
}

/// A tagged-union alias (`using x = c10::variant<...>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantDecl {
    pub name: String,
    pub namespace: Vec<String>,
    /// Enclosing struct, when declared inside one.
    pub scope: Option<String>,
    pub arms: Vec<String>,
}

impl VariantDecl {
    /// Whether every arm is an `enumtype::kX` tag.
    pub fn is_enum_only(&self) -> bool {
        !self.arms.is_empty() && self.arms.iter().all(|a| enum_tag(a).is_some())
    }
}

/// The tag name of an `enumtype::kX` arm (`X`).
pub fn enum_tag(arm: &str) -> Option<&str> {
    let last = arm.rsplit("::").next()?;
    if !arm.contains("enumtype::") {
        return None;
    }
    last.strip_prefix('k').filter(|t| !t.is_empty())
}

/// A plain type alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasDecl {
    pub name: String,
    pub target: String,
    pub namespace: Vec<String>,
    pub scope: Option<String>,
}

fn qualify(namespace: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = namespace
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    parts.push(name);
    parts.join("::")
}
