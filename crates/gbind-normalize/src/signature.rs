//! Canonical signatures: the language-neutral shape of one bound function.
//!
//! A canonical signature carries everything the emitter needs and nothing
//! it would have to look up again: target types, conversion expressions,
//! ownership, documentation annotations and the return channel.

use std::collections::BTreeSet;

use gbind_types::error::Result as MapResult;
use gbind_types::native::canonicalize;
use gbind_types::{ArrayLength, Cleanup, Conversion, Meta, Ownership, TargetType, TypeMapper};

use crate::config::NormalizeConfig;
use crate::naming::bindable_name;
use crate::scalar::ExpandedDecl;

/// Native optional template used for nullable arguments.
pub const OPTIONAL_WRAPPER: &str = "c10::optional";

/// Name of the trailing error parameter.
pub const ERROR_ARGUMENT: &str = "error";

/// Target type of the success flag returned by status-channel functions.
pub const STATUS_TYPE: &str = "gboolean";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// One parameter of the bound function, or its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub target: TargetType,
    pub direction: Direction,
    pub transfer: Ownership,
    pub element_type: Option<TargetType>,
    pub array: Option<ArrayLength>,
    pub nullable: bool,
}

/// An input argument together with its conversion to native.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindArg {
    pub param: Param,
    /// Native type of the local holding the converted value.
    pub native_local: String,
    pub to_native: Conversion,
    pub meta: Meta,
}

/// A native return value together with its conversion to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindReturn {
    pub name: String,
    /// Native type as spelled by the call's declaration.
    pub native_spelling: String,
    pub target: TargetType,
    pub ownership: Ownership,
    pub element_type: Option<TargetType>,
    pub to_target: Conversion,
    pub cleanup: Cleanup,
    pub meta: Meta,
}

/// How the native entity is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStyle {
    /// `namespace::name (args)`
    Free { namespace: String },
    /// `first.name (rest)`
    Method,
}

/// How results reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnChannel {
    /// The single pointer-shaped value is the function's return value.
    Direct,
    /// The receiver is mutated in place and returned.
    Receiver,
    /// Values go through out-parameters; the function returns a success flag.
    Status,
}

/// A fully resolved bindable function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSignature {
    pub name: String,
    pub native_name: String,
    pub call: CallStyle,
    /// Lazy-initialization check applied to the receiver.
    pub receiver_init: Option<String>,
    pub arguments: Vec<BindArg>,
    pub returns: Vec<BindReturn>,
    /// Empty unless the channel is [`ReturnChannel::Status`].
    pub out_arguments: Vec<Param>,
    pub error_argument: Param,
    /// The function's own return type.
    pub result: Param,
    pub channel: ReturnChannel,
}

impl CanonicalSignature {
    /// Whether the single native return value is handed back as the
    /// function's return value.
    pub fn return_rv_directly(&self) -> bool {
        self.channel == ReturnChannel::Direct
    }

    /// Every parameter of the C function in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &Param> {
        self.arguments
            .iter()
            .map(|a| &a.param)
            .chain(self.out_arguments.iter())
            .chain(std::iter::once(&self.error_argument))
    }
}

impl Param {
    fn error() -> Self {
        Self {
            name: ERROR_ARGUMENT.to_string(),
            target: TargetType::new("GError **"),
            direction: Direction::Out,
            transfer: Ownership::Full,
            element_type: None,
            array: None,
            nullable: true,
        }
    }

    fn status() -> Self {
        Self {
            name: String::new(),
            target: TargetType::new(STATUS_TYPE),
            direction: Direction::Out,
            transfer: Ownership::None,
            element_type: None,
            array: None,
            nullable: false,
        }
    }
}

/// Build the canonical signature of an expanded declaration.
///
/// Every type must already be known to be mappable.
pub fn build(
    expanded: &ExpandedDecl,
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> MapResult<CanonicalSignature> {
    let decl = &expanded.decl;

    let arguments = decl
        .arguments
        .iter()
        .zip(&expanded.api_types)
        .map(|(arg, api)| bind_argument(arg, api, mapper))
        .collect::<MapResult<Vec<_>>>()?;

    let receiver_return = decl.mutates_receiver()
        && decl.returns.len() == 1
        && decl.arguments.first().is_some_and(|a| a.is_self());
    let names = out_names(decl);
    let returns = decl
        .returns
        .iter()
        .zip(names)
        .map(|(ret, name)| {
            let rule = mapper.resolve(&ret.native_type, None)?;
            let ownership = if receiver_return {
                Ownership::Receiver
            } else {
                rule.ownership()
            };
            Ok(BindReturn {
                name,
                native_spelling: ret.spelled_type.clone(),
                target: rule.target,
                ownership,
                element_type: rule.element_type,
                to_target: rule.to_target,
                cleanup: rule.cleanup,
                meta: rule.meta,
            })
        })
        .collect::<MapResult<Vec<_>>>()?;

    let channel = match returns.as_slice() {
        [only] if only.target.is_pointer() && only.ownership == Ownership::Receiver => {
            ReturnChannel::Receiver
        }
        [only] if only.target.is_pointer() => ReturnChannel::Direct,
        _ => ReturnChannel::Status,
    };

    let (out_arguments, result) = match channel {
        ReturnChannel::Status => {
            let outs = returns
                .iter()
                .map(|ret| Param {
                    name: ret.name.clone(),
                    target: ret.target.pointer_to(),
                    direction: Direction::Out,
                    transfer: ret.ownership,
                    element_type: ret.element_type.clone(),
                    array: None,
                    nullable: true,
                })
                .collect();
            (outs, Param::status())
        }
        ReturnChannel::Direct | ReturnChannel::Receiver => {
            let ret = &returns[0];
            let result = Param {
                name: String::new(),
                target: ret.target.clone(),
                direction: Direction::Out,
                transfer: ret.ownership,
                element_type: ret.element_type.clone(),
                array: None,
                nullable: false,
            };
            (Vec::new(), result)
        }
    };

    let call = if decl.is_free_function() || decl.arguments.is_empty() {
        CallStyle::Free {
            namespace: config
                .namespaces
                .for_call(&decl.name, &decl.overload_name)
                .to_string(),
        }
    } else {
        CallStyle::Method
    };

    // Only member calls go through the receiver's internal state.
    let receiver_init = decl
        .arguments
        .first()
        .filter(|a| a.is_self() && call == CallStyle::Method)
        .and_then(|_| config.receiver_for(&decl.method_of))
        .and_then(|r| r.init.clone());

    Ok(CanonicalSignature {
        name: bindable_name(decl, expanded.overload.as_deref(), config),
        native_name: decl.name.clone(),
        call,
        receiver_init,
        arguments,
        returns,
        out_arguments,
        error_argument: Param::error(),
        result,
        channel,
    })
}

fn bind_argument(
    arg: &gbind_extract::ArgumentDecl,
    api_type: &str,
    mapper: &TypeMapper,
) -> MapResult<BindArg> {
    let mut rule = mapper.resolve(&arg.native_type, None)?;
    let mut element_type = rule.element_type.clone();
    let mut array = rule.array.clone();

    if let Some(size) = arg.size {
        array = Some(ArrayLength::Fixed(size));
        // Fixed-size value lists are passed as plain C arrays.
        if rule.target.as_str() == "GArray *" {
            let element = rule
                .element_type
                .clone()
                .unwrap_or_else(|| TargetType::new("long"));
            rule.target = element.pointer_to().as_const();
            rule.to_native = Conversion::WithArgs {
                func: "torch_array_ref_from_fixed_array".to_string(),
                args: vec![size.to_string()],
            };
            element_type = None;
        }
    }

    let mut native_local = canonicalize(api_type);
    if arg.nullable && !rule.nullable && !rule.nullable_elements {
        rule = rule.into_optional(OPTIONAL_WRAPPER);
        native_local = format!("{OPTIONAL_WRAPPER}<{native_local}>");
    }

    Ok(BindArg {
        param: Param {
            name: arg.name.clone(),
            target: rule.target,
            direction: Direction::In,
            transfer: Ownership::None,
            element_type,
            array,
            nullable: rule.nullable,
        },
        native_local,
        to_native: rule.to_native,
        meta: rule.meta,
    })
}

/// Out-parameter names: the declared return name when it is unique and
/// free, `out{i}` otherwise.
fn out_names(decl: &gbind_extract::FunctionDecl) -> Vec<String> {
    let taken: BTreeSet<&str> = decl
        .arguments
        .iter()
        .map(|a| a.name.as_str())
        .chain(std::iter::once(ERROR_ARGUMENT))
        .collect();
    decl.returns
        .iter()
        .enumerate()
        .map(|(i, ret)| {
            let name = ret.name.as_str();
            let unique = decl.returns.iter().filter(|r| r.name == name).count() == 1;
            if !name.is_empty() && unique && !taken.contains(name) {
                name.to_string()
            } else {
                format!("out{i}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::expand;
    use gbind_extract::{ArgumentDecl, FunctionDecl, ReturnDecl};

    fn arg(name: &str, native: &str) -> ArgumentDecl {
        ArgumentDecl {
            name: name.into(),
            native_type: native.into(),
            spelled_type: native.into(),
            nullable: false,
            size: None,
            annotation: None,
        }
    }

    fn ret(name: &str, native: &str) -> ReturnDecl {
        ReturnDecl {
            name: name.into(),
            native_type: native.into(),
            spelled_type: native.into(),
        }
    }

    fn decl(name: &str, method_of: &[&str], args: Vec<ArgumentDecl>, returns: Vec<ReturnDecl>) -> FunctionDecl {
        FunctionDecl {
            name: name.into(),
            overload_name: String::new(),
            method_of: method_of.iter().map(|s| s.to_string()).collect(),
            schema_order_arguments: args.clone(),
            arguments: args,
            returns,
        }
    }

    fn build_one(d: &FunctionDecl) -> CanonicalSignature {
        let mapper = TypeMapper::with_defaults();
        let expanded = expand(d);
        build(&expanded[0], &mapper, &NormalizeConfig::default()).unwrap()
    }

    #[test]
    fn single_pointer_return_is_direct() {
        let d = decl(
            "abs",
            &["Tensor", "namespace"],
            vec![arg("self", "at::Tensor")],
            vec![ret("result", "at::Tensor")],
        );
        let sig = build_one(&d);
        assert!(sig.return_rv_directly());
        assert!(sig.out_arguments.is_empty());
        assert_eq!(sig.result.target.as_str(), "TorchTensor *");
        assert_eq!(sig.result.transfer, Ownership::Full);
        assert!(sig.receiver_init.is_none());
        assert_eq!(sig.call, CallStyle::Free { namespace: "torch".into() });

        let names: Vec<_> = sig.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "error"]);
    }

    #[test]
    fn tuple_return_uses_out_arguments() {
        let d = decl(
            "max",
            &["Tensor"],
            vec![arg("self", "at::Tensor"), arg("dim", "int64_t")],
            vec![ret("values", "at::Tensor"), ret("indices", "at::Tensor")],
        );
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Status);
        assert!(!sig.return_rv_directly());
        assert_eq!(sig.result.target.as_str(), STATUS_TYPE);
        assert_eq!(sig.call, CallStyle::Method);
        assert_eq!(sig.receiver_init.as_deref(), Some("torch_tensor_init_internal"));

        let params: Vec<_> = sig
            .parameters()
            .map(|p| (p.name.as_str(), p.target.as_str(), p.direction))
            .collect();
        assert_eq!(
            params,
            vec![
                ("self", "TorchTensor *", Direction::In),
                ("dim", "int64_t", Direction::In),
                ("values", "TorchTensor **", Direction::Out),
                ("indices", "TorchTensor **", Direction::Out),
                ("error", "GError **", Direction::Out),
            ]
        );
        assert!(sig.out_arguments.iter().all(|p| p.nullable && p.transfer == Ownership::Full));
    }

    #[test]
    fn value_return_goes_through_status() {
        let d = decl(
            "dim",
            &["Tensor"],
            vec![arg("self", "at::Tensor")],
            vec![ret("", "int64_t")],
        );
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Status);
        assert_eq!(sig.out_arguments[0].name, "out0");
        assert_eq!(sig.out_arguments[0].target.as_str(), "int64_t *");
        assert_eq!(sig.out_arguments[0].transfer, Ownership::None);
    }

    #[test]
    fn clashing_return_names_fall_back() {
        let d = decl(
            "f",
            &["namespace"],
            vec![arg("self", "at::Tensor")],
            vec![ret("self", "at::Tensor"), ret("x", "at::Tensor"), ret("x", "at::Tensor")],
        );
        let sig = build_one(&d);
        let names: Vec<_> = sig.out_arguments.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["out0", "out1", "out2"]);
    }

    #[test]
    fn in_place_method_returns_receiver() {
        let mut self_arg = arg("self", "at::Tensor");
        self_arg.annotation = Some("a!".into());
        let d = decl(
            "add_",
            &["Tensor"],
            vec![self_arg, arg("other", "at::Tensor")],
            vec![ret("", "at::Tensor")],
        );
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Receiver);
        assert!(!sig.return_rv_directly());
        assert!(sig.out_arguments.is_empty());
        assert_eq!(sig.returns[0].ownership, Ownership::Receiver);
        assert_eq!(sig.result.transfer.annotation(), "none");
    }

    #[test]
    fn receiver_alias_without_schema_order() {
        let mut self_arg = arg("self", "at::Tensor");
        self_arg.annotation = Some("a!".into());
        let mut d = decl(
            "mul_",
            &["Tensor"],
            vec![self_arg, arg("other", "at::Tensor")],
            vec![ret("", "at::Tensor")],
        );
        d.schema_order_arguments.clear();
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Receiver);
        assert_eq!(sig.returns[0].ownership, Ownership::Receiver);
        assert_eq!(sig.result.transfer.annotation(), "none");
    }

    #[test]
    fn two_value_returns_use_out_arguments() {
        let d = decl(
            "count_mean",
            &["Tensor"],
            vec![arg("self", "at::Tensor")],
            vec![ret("count", "int64_t"), ret("mean", "double")],
        );
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Status);
        assert!(!sig.return_rv_directly());
        assert_eq!(sig.result.target.as_str(), STATUS_TYPE);

        let outs: Vec<_> = sig
            .out_arguments
            .iter()
            .map(|p| (p.name.as_str(), p.target.as_str()))
            .collect();
        assert_eq!(outs, vec![("count", "int64_t *"), ("mean", "double *")]);
        assert!(sig.out_arguments.iter().all(|p| p.transfer == Ownership::None));

        let names: Vec<_> = sig.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "count", "mean", "error"]);
    }

    #[test]
    fn no_returns() {
        let d = decl("backward", &["Tensor"], vec![arg("self", "at::Tensor")], vec![]);
        let sig = build_one(&d);
        assert_eq!(sig.channel, ReturnChannel::Status);
        assert!(sig.out_arguments.is_empty());
        assert_eq!(sig.result.target.as_str(), STATUS_TYPE);
    }

    #[test]
    fn fixed_size_list_becomes_c_array() {
        let mut size = arg("kernel_size", "at::IntArrayRef");
        size.size = Some(2);
        let d = decl(
            "max_pool2d",
            &["namespace"],
            vec![arg("self", "at::Tensor"), size],
            vec![ret("", "at::Tensor")],
        );
        let sig = build_one(&d);
        let p = &sig.arguments[1];
        assert_eq!(p.param.target.as_str(), "const long *");
        assert_eq!(p.param.array, Some(ArrayLength::Fixed(2)));
        assert!(p.param.element_type.is_none());
        assert_eq!(
            p.to_native.apply("kernel_size", &p.meta),
            "torch_array_ref_from_fixed_array (kernel_size, 2)"
        );
        assert_eq!(p.native_local, "at::IntArrayRef");
    }

    #[test]
    fn nullable_value_becomes_optional_pointer() {
        let mut dim = arg("dim", "int64_t");
        dim.nullable = true;
        let d = decl(
            "argmax",
            &["namespace"],
            vec![arg("self", "at::Tensor"), dim],
            vec![ret("", "at::Tensor")],
        );
        let sig = build_one(&d);
        let p = &sig.arguments[1];
        assert_eq!(p.param.target.as_str(), "int64_t *");
        assert!(p.param.nullable);
        assert_eq!(p.native_local, "c10::optional<int64_t>");
        assert_eq!(
            p.to_native.apply("dim", &p.meta),
            "dim != NULL ? c10::optional<int64_t> (*dim) : c10::nullopt"
        );
    }

    #[test]
    fn scalar_variant_keeps_api_type() {
        let d = decl(
            "add",
            &["Tensor", "namespace"],
            vec![arg("self", "at::Tensor"), arg("other", "const at::Scalar &")],
            vec![ret("", "at::Tensor")],
        );
        let mapper = TypeMapper::with_defaults();
        let config = NormalizeConfig::default();
        let sigs: Vec<_> = expand(&d)
            .iter()
            .map(|e| build(e, &mapper, &config).unwrap())
            .collect();
        let names: Vec<_> = sigs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["torch_tensor_add_long", "torch_tensor_add_double", "torch_tensor_add_bool"]
        );
        assert_eq!(sigs[2].arguments[1].param.target.as_str(), "gboolean");
        assert_eq!(sigs[2].arguments[1].native_local, "at::Scalar");
    }

    #[test]
    fn namespace_override() {
        let mut d = decl(
            "normal",
            &["namespace"],
            vec![arg("mean", "at::Tensor"), arg("std", "double")],
            vec![ret("", "at::Tensor")],
        );
        d.overload_name = "Tensor_float".into();
        let sig = build_one(&d);
        assert_eq!(sig.call, CallStyle::Free { namespace: "at".into() });
        assert!(sig.receiver_init.is_none());
    }
}
