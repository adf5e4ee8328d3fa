//! Type rules: what a native type becomes on the binding side and how values
//! cross the boundary in each direction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::target::TargetType;

/// Free-form conversion metadata (`type`, `length`, `dims`, ...).
pub type Meta = BTreeMap<String, String>;

/// Who releases a returned or output value after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ownership {
    /// The caller must not release the value.
    #[serde(rename = "none")]
    None,
    /// The caller owns the value and must release it.
    #[serde(rename = "full")]
    Full,
    /// The value is the receiver itself, already owned by the caller.
    #[serde(rename = "self")]
    Receiver,
}

impl Ownership {
    /// The transfer keyword used in documentation annotations.
    ///
    /// A receiver return is not a new reference, so it is annotated as `none`.
    pub fn annotation(self) -> &'static str {
        match self {
            Ownership::None | Ownership::Receiver => "none",
            Ownership::Full => "full",
        }
    }
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Ownership::None => "none",
            Ownership::Full => "full",
            Ownership::Receiver => "self",
        })
    }
}

/// How a target-typed temporary holding a converted value is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleanup {
    /// `T name`
    #[default]
    Plain,
    /// `g_autoptr (T) name`
    AutoPtr,
    /// `g_autofree T name`
    AutoFree,
}

impl Cleanup {
    /// Render the declarator for a temporary of type `target` named `var`.
    pub fn declare(self, target: &TargetType, var: &str) -> String {
        match self {
            Cleanup::Plain => format!("{target} {var}"),
            Cleanup::AutoPtr => format!("g_autoptr ({}) {var}", target.base_name()),
            Cleanup::AutoFree => format!("g_autofree {target} {var}"),
        }
    }
}

/// Array length convention of an array-shaped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayLength {
    /// Compile-time length.
    Fixed(usize),
    /// Length carried by another parameter.
    Param(String),
}

impl ArrayLength {
    /// Interpret a length spelling: numeric literals are fixed sizes.
    pub fn parse(s: &str) -> ArrayLength {
        match s.trim().parse::<usize>() {
            Ok(n) => ArrayLength::Fixed(n),
            Err(_) => ArrayLength::Param(s.trim().to_string()),
        }
    }
}

impl std::fmt::Display for ArrayLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayLength::Fixed(n) => write!(f, "{n}"),
            ArrayLength::Param(p) => f.write_str(p),
        }
    }
}

/// An expression rewrite applied to a variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// `x`
    Identity,
    /// `f (x)`
    Call(String),
    /// `f <T> (x)`
    Generic { func: String, type_arg: String },
    /// `f (x, a, b)`
    WithArgs { func: String, args: Vec<String> },
    /// `f (x.accessor ())`
    Accessor { func: String, accessor: String },
    /// A `{name}` / `{meta[key]}` template.
    Template(String),
    /// Templates applied left to right, each receiving the previous result.
    Pipeline(Vec<String>),
    /// Pointer or null into a native optional.
    ///
    /// `deref` reads the pointee for value types passed by pointer.
    Optional {
        inner: Box<Conversion>,
        native: String,
        deref: bool,
    },
    /// Native optional into pointer or null.
    ///
    /// Value types are boxed into a newly allocated `boxed` temporary.
    FromOptional {
        inner: Box<Conversion>,
        boxed: Option<String>,
    },
    /// A stored callback wrapped into a native closure.
    Callback(Box<CallbackConversion>),
}

impl Conversion {
    /// Parse a configured conversion: a spelling containing `{` is a
    /// template, anything else names a function to call.
    pub fn parse(spelling: &str) -> Conversion {
        let spelling = spelling.trim();
        if spelling.is_empty() || spelling == "{name}" {
            Conversion::Identity
        } else if spelling.contains('{') {
            Conversion::Template(spelling.to_string())
        } else {
            Conversion::Call(spelling.to_string())
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Conversion::Identity)
    }

    /// Apply the conversion to the expression `name`.
    pub fn apply(&self, name: &str, meta: &Meta) -> String {
        match self {
            Conversion::Identity => name.to_string(),
            Conversion::Call(func) => format!("{func} ({name})"),
            Conversion::Generic { func, type_arg } => format!("{func} <{type_arg}> ({name})"),
            Conversion::WithArgs { func, args } => {
                let mut all = vec![name.to_string()];
                all.extend(args.iter().cloned());
                format!("{func} ({})", all.join(", "))
            }
            Conversion::Accessor { func, accessor } => format!("{func} ({name}.{accessor} ())"),
            Conversion::Template(template) => render_template(template, name, meta),
            Conversion::Pipeline(steps) => steps
                .iter()
                .fold(name.to_string(), |prev, step| render_template(step, &prev, meta)),
            Conversion::Optional {
                inner,
                native,
                deref,
            } => {
                let operand = if *deref {
                    format!("*{name}")
                } else {
                    name.to_string()
                };
                format!(
                    "{name} != NULL ? c10::optional<{native}> ({}) : c10::nullopt",
                    inner.apply(&operand, meta)
                )
            }
            Conversion::FromOptional { inner, boxed } => {
                let value = inner.apply(&format!("{name}.value ()"), meta);
                match boxed {
                    Some(ty) => format!(
                        "{name}.has_value () ? torch_new_boxed_value <{ty}> ({value}) : NULL"
                    ),
                    None => format!("{name}.has_value () ? {value} : NULL"),
                }
            }
            Conversion::Callback(callback) => callback.render(name),
        }
    }

    /// A template equivalent to this conversion, for serializing into
    /// `convert_pipeline` metadata. Callbacks have no template form.
    pub fn to_template(&self) -> Option<String> {
        match self {
            Conversion::Callback(_) => None,
            Conversion::Pipeline(steps) if steps.len() == 1 => Some(steps[0].clone()),
            Conversion::Pipeline(_) => None,
            Conversion::Template(t) => Some(t.clone()),
            other => Some(other.apply("{name}", &Meta::new())),
        }
    }
}

/// One argument of a callback as seen from the native side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackArg {
    pub name: String,
    pub c_type: TargetType,
    pub cpp_type: String,
    pub to_target: Conversion,
}

/// The result of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReturn {
    pub c_type: TargetType,
    pub cpp_type: String,
    pub to_native: Conversion,
}

/// Wraps a stored C callback in a native lambda.
///
/// The lambda converts each native argument to its target type, invokes
/// the stored callback through `TorchCallbackDataCallableWrapper` and
/// converts the result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackConversion {
    /// Field the callback is stored in; names the captured wrapper.
    pub field: String,
    /// C function type the stored pointer is cast to.
    pub signature: String,
    pub args: Vec<CallbackArg>,
    pub ret: Option<CallbackReturn>,
}

impl CallbackConversion {
    fn render(&self, name: &str) -> String {
        let wrapper = format!("{}_callback_data_callable_wrapper", self.field);
        let params = self
            .args
            .iter()
            .map(|a| format!("{} {}", a.cpp_type, a.name))
            .collect::<Vec<_>>()
            .join(", ");
        let ret_cpp = self.ret.as_ref().map_or("void", |r| r.cpp_type.as_str());

        let mut body = Vec::new();
        for arg in &self.args {
            let cleanup = if arg.c_type.is_pointer() {
                Cleanup::AutoPtr
            } else {
                Cleanup::Plain
            };
            body.push(format!(
                "{} = {};",
                cleanup.declare(&arg.c_type, &format!("c_{}", arg.name)),
                arg.to_target.apply(&arg.name, &Meta::new())
            ));
        }
        let call_args = self
            .args
            .iter()
            .map(|a| format!("c_{}", a.name))
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!("{wrapper} ({call_args})");
        match &self.ret {
            Some(ret) => {
                let cleanup = if ret.c_type.is_pointer() {
                    Cleanup::AutoPtr
                } else {
                    Cleanup::Plain
                };
                body.push(format!("{} = {call};", cleanup.declare(&ret.c_type, "rv")));
                body.push(format!("return {};", ret.to_native.apply("rv", &Meta::new())));
            }
            None => {
                body.push(format!("{call};"));
                body.push("return;".to_string());
            }
        }

        let mut out = format!(
            "[{wrapper} = TorchCallbackDataCallableWrapper<{}> ({name})]({params}) -> {ret_cpp}\n{{\n",
            self.signature
        );
        for line in body {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
        out.push('}');
        out
    }
}

/// Render a conversion template.
///
/// `{name}` is replaced by `name`, `{meta[key]}` by the metadata value.
/// A `|lower` suffix lowercases the substitution. Unknown placeholders are
/// kept verbatim.
pub fn render_template(template: &str, name: &str, meta: &Meta) -> String {
    let mut out = String::with_capacity(template.len() + name.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('}') else {
            out.push_str(after);
            return out;
        };
        let (placeholder, lower) = match after[1..close].strip_suffix("|lower") {
            Some(p) => (p, true),
            None => (&after[1..close], false),
        };
        let value = match placeholder {
            "name" => Some(name.to_string()),
            p => p
                .strip_prefix("meta[")
                .and_then(|k| k.strip_suffix(']'))
                .and_then(|k| meta.get(k))
                .cloned(),
        };
        match value {
            Some(v) if lower => out.push_str(&v.to_lowercase()),
            Some(v) => out.push_str(&v),
            None => {
                tracing::debug!(placeholder, "unresolved template placeholder");
                out.push_str(&after[..=close]);
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// The mapping of one native type to the binding side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    /// Canonical native spelling this rule applies to.
    pub native: String,
    pub target: TargetType,
    /// Element type of containers, as a target spelling.
    pub element_type: Option<TargetType>,
    pub nullable: bool,
    /// The container is never null but its elements may be.
    pub nullable_elements: bool,
    pub array: Option<ArrayLength>,
    /// Target value → native value.
    pub to_native: Conversion,
    /// Native value → target value.
    pub to_target: Conversion,
    pub cleanup: Cleanup,
    /// The native side passes this type by reference.
    pub native_is_reference: bool,
    pub meta: Meta,
}

impl TypeRule {
    pub fn new(native: impl Into<String>, target: impl Into<TargetType>) -> Self {
        Self {
            native: native.into(),
            target: target.into(),
            element_type: None,
            nullable: false,
            nullable_elements: false,
            array: None,
            to_native: Conversion::Identity,
            to_target: Conversion::Identity,
            cleanup: Cleanup::Plain,
            native_is_reference: false,
            meta: Meta::new(),
        }
    }

    pub fn with_to_native(mut self, conversion: Conversion) -> Self {
        self.to_native = conversion;
        self
    }

    pub fn with_to_target(mut self, conversion: Conversion) -> Self {
        self.to_target = conversion;
        self
    }

    pub fn with_cleanup(mut self, cleanup: Cleanup) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_element(mut self, element: impl Into<TargetType>) -> Self {
        self.element_type = Some(element.into());
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn by_reference(mut self) -> Self {
        self.native_is_reference = true;
        self
    }

    pub fn with_nullable_elements(mut self) -> Self {
        self.nullable_elements = true;
        self
    }

    /// Default ownership of a value of this type handed to the caller.
    pub fn ownership(&self) -> Ownership {
        if self.target.is_pointer() {
            Ownership::Full
        } else {
            Ownership::None
        }
    }

    /// The spelling of the native argument type (`const T &` for references).
    pub fn native_param_spelling(&self) -> String {
        if self.native_is_reference {
            format!("const {} &", self.native)
        } else {
            self.native.clone()
        }
    }

    /// This rule wrapped in a native optional (`wrapper<T>`).
    ///
    /// The result is nullable; value types become pointer-shaped so that
    /// "absent" can be expressed as a null pointer.
    pub fn into_optional(self, wrapper: &str) -> TypeRule {
        let native = format!("{wrapper}<{}>", self.native);
        let value_type = !self.target.is_pointer();
        let target = if value_type {
            self.target.pointer_to()
        } else {
            self.target.clone()
        };
        let boxed = value_type.then(|| self.target.to_string());
        TypeRule {
            to_native: Conversion::Optional {
                inner: Box::new(self.to_native),
                native: self.native.clone(),
                deref: value_type,
            },
            to_target: Conversion::FromOptional {
                inner: Box::new(self.to_target),
                boxed,
            },
            cleanup: if value_type {
                Cleanup::AutoFree
            } else {
                self.cleanup
            },
            native,
            target,
            nullable: true,
            native_is_reference: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_render() {
        let meta = Meta::new();
        assert_eq!(Conversion::Identity.apply("x", &meta), "x");
        assert_eq!(
            Conversion::Call("torch_convert_to_real".into()).apply("self", &meta),
            "torch_convert_to_real (self)"
        );
        assert_eq!(
            Conversion::Generic {
                func: "torch_array_ref_from_garray".into(),
                type_arg: "long".into()
            }
            .apply("dims", &meta),
            "torch_array_ref_from_garray <long> (dims)"
        );
        assert_eq!(
            Conversion::Accessor {
                func: "g_strdup".into(),
                accessor: "c_str".into()
            }
            .apply("real_rv", &meta),
            "g_strdup (real_rv.c_str ())"
        );
        assert_eq!(
            Conversion::WithArgs {
                func: "torch_array_ref_from_fixed_array".into(),
                args: vec!["2".into()]
            }
            .apply("size", &meta),
            "torch_array_ref_from_fixed_array (size, 2)"
        );
    }

    #[test]
    fn templates_and_pipelines() {
        let mut meta = Meta::new();
        meta.insert("type".into(), "int64_t".into());
        assert_eq!(
            render_template(
                "torch_optional_value_to_c10_optional ({name}, torch_optional_value_get_{meta[type]})",
                "opts->p",
                &meta
            ),
            "torch_optional_value_to_c10_optional (opts->p, torch_optional_value_get_int64_t)"
        );
        assert_eq!(
            render_template("f ({name}, {meta[missing]})", "x", &meta),
            "f (x, {meta[missing]})"
        );
        meta.insert("kind".into(), "GType".into());
        assert_eq!(render_template("get_{meta[kind]|lower}", "x", &meta), "get_gtype");

        let pipeline = Conversion::Pipeline(vec!["a ({name})".into(), "b ({name})".into()]);
        assert_eq!(pipeline.apply("x", &meta), "b (a (x))");
    }

    #[test]
    fn parse_configured_conversion() {
        assert_eq!(Conversion::parse(""), Conversion::Identity);
        assert_eq!(Conversion::parse("f"), Conversion::Call("f".into()));
        assert_eq!(
            Conversion::parse("f ({name}, 1)"),
            Conversion::Template("f ({name}, 1)".into())
        );
    }

    #[test]
    fn cleanup_declarators() {
        let t = TargetType::new("TorchTensor *");
        assert_eq!(Cleanup::AutoPtr.declare(&t, "rv"), "g_autoptr (TorchTensor) rv");
        assert_eq!(
            Cleanup::AutoFree.declare(&TargetType::new("GValue *"), "rv"),
            "g_autofree GValue * rv"
        );
        assert_eq!(Cleanup::Plain.declare(&TargetType::new("GType"), "rv"), "GType rv");
    }

    #[test]
    fn optional_of_value_becomes_pointer() {
        let rule = TypeRule::new("int64_t", "int64_t").into_optional("c10::optional");
        assert!(rule.nullable);
        assert_eq!(rule.target.as_str(), "int64_t *");
        assert_eq!(rule.native, "c10::optional<int64_t>");
        assert_eq!(
            rule.to_native.apply("dim", &Meta::new()),
            "dim != NULL ? c10::optional<int64_t> (*dim) : c10::nullopt"
        );
        assert_eq!(rule.ownership(), Ownership::Full);
    }

    #[test]
    fn optional_of_pointer_keeps_target() {
        let rule = TypeRule::new("at::Tensor", "TorchTensor *")
            .with_to_native(Conversion::Call("torch_convert_to_real".into()))
            .by_reference()
            .into_optional("c10::optional");
        assert_eq!(rule.target.as_str(), "TorchTensor *");
        assert_eq!(
            rule.to_native.apply("weight", &Meta::new()),
            "weight != NULL ? c10::optional<at::Tensor> (torch_convert_to_real (weight)) : c10::nullopt"
        );
    }

    #[test]
    fn ownership_annotation() {
        assert_eq!(Ownership::Receiver.annotation(), "none");
        assert_eq!(Ownership::Receiver.to_string(), "self");
        assert_eq!(TypeRule::new("bool", "gboolean").ownership(), Ownership::None);
    }

    #[test]
    fn callback_lambda() {
        let callback = CallbackConversion {
            field: "distance_function".into(),
            signature: "TorchNNDistanceFunction".into(),
            args: vec![
                CallbackArg {
                    name: "first".into(),
                    c_type: "TorchTensor *".into(),
                    cpp_type: "torch::Tensor const &".into(),
                    to_target: Conversion::Call("torch_tensor_new_from_real_tensor".into()),
                },
                CallbackArg {
                    name: "second".into(),
                    c_type: "TorchTensor *".into(),
                    cpp_type: "torch::Tensor const &".into(),
                    to_target: Conversion::Call("torch_tensor_new_from_real_tensor".into()),
                },
            ],
            ret: Some(CallbackReturn {
                c_type: "TorchTensor *".into(),
                cpp_type: "torch::Tensor".into(),
                to_native: Conversion::Call("torch_tensor_get_real_tensor".into()),
            }),
        };
        let rendered = Conversion::Callback(Box::new(callback)).apply("opts->distance_function", &Meta::new());
        let expected = "\
[distance_function_callback_data_callable_wrapper = TorchCallbackDataCallableWrapper<TorchNNDistanceFunction> (opts->distance_function)](torch::Tensor const & first, torch::Tensor const & second) -> torch::Tensor
{
  g_autoptr (TorchTensor) c_first = torch_tensor_new_from_real_tensor (first);
  g_autoptr (TorchTensor) c_second = torch_tensor_new_from_real_tensor (second);
  g_autoptr (TorchTensor) rv = distance_function_callback_data_callable_wrapper (c_first, c_second);
  return torch_tensor_get_real_tensor (rv);
}";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn array_length_parse() {
        assert_eq!(ArrayLength::parse("3"), ArrayLength::Fixed(3));
        assert_eq!(ArrayLength::parse("n_dims"), ArrayLength::Param("n_dims".into()));
    }
}
