//! Options structs: header declarations → definitions → normalized structs.
//!
//! Header-scanned structs are first lowered to the same definition records
//! the JSON input provides, so both inputs share one normalization path.
//! Enum-only variant aliases become generated enums along the way.

use std::collections::BTreeSet;

use gbind_extract::decl::enum_tag;
use gbind_extract::{
    CallbackArgDef, CppConstructor, LengthSpec, OptionDef, OptionMeta, OptionsDefinition,
    OptionsStructDecl, RawDeclaration, VariantDecl,
};
use gbind_types::naming::{camel_to_lower_snake, camel_to_snake};
use gbind_types::native::canonicalize;
use gbind_types::rule::{render_template, CallbackArg, CallbackConversion, CallbackReturn};
use gbind_types::{storage, ArrayLength, Conversion, MapError, Meta, TargetType, TypeMapper, TypeRule};

use crate::config::NormalizeConfig;
use crate::error::{NormalizeError, Result};
use crate::inherit;

/// A C enum generated from an enum-only variant alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEnum {
    pub type_name: String,
    /// Function converting a constant into the native variant.
    pub converter: String,
    /// The native variant type the converter returns.
    pub native: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub constant: String,
    /// Qualified native tag type (`torch::enumtype::kMean`).
    pub native_tag: String,
}

/// User data slots of a callback field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackData {
    pub data: String,
    pub destroy: Option<String>,
}

/// One member of a normalized options struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionField {
    pub name: String,
    /// Type the constructor accepts.
    pub c_type: TargetType,
    /// Type the struct member holds.
    pub storage: TargetType,
    /// Element type inside a storage container.
    pub storage_element: Option<String>,
    /// Introspection spelling of `storage_element`.
    pub element_type: Option<String>,
    pub length: Option<LengthSpec>,
    pub callback: Option<CallbackData>,
    pub to_native: Conversion,
    pub meta: Meta,
    pub default: Option<String>,
    /// Ancestor the field was copied from.
    pub inherited_from: Option<String>,
}

impl OptionField {
    /// Native expression for the stored value held in `var`.
    pub fn native_expression(&self, var: &str) -> String {
        let mut meta = self.meta.clone();
        if self.storage_element.is_some() {
            if let Some(access) = storage::access_length_func(self.storage.as_str()) {
                meta.insert("length".to_string(), render_template(access, var, &Meta::new()));
            }
        }
        self.to_native.apply(var, &meta)
    }

    /// Parameters this field contributes to the struct constructor.
    pub fn constructor_params(&self) -> Vec<(TargetType, String)> {
        let mut params = vec![(self.c_type.clone(), self.name.clone())];
        if let Some(length) = self.length.as_ref().and_then(LengthSpec::parameter) {
            params.push((TargetType::new("size_t"), length.to_string()));
        }
        if let Some(callback) = &self.callback {
            params.push((TargetType::new("gpointer"), callback.data.clone()));
            if let Some(destroy) = &callback.destroy {
                params.push((TargetType::new("GDestroyNotify"), destroy.clone()));
            }
        }
        params
    }

    pub fn is_pointer(&self) -> bool {
        self.c_type.is_pointer()
    }
}

/// A normalized options struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsStruct {
    /// Definition name (`NNLinearOptions`).
    pub name: String,
    /// C type name (`TorchNNLinearOptions`).
    pub type_name: String,
    /// Function prefix (`torch_nn_linear_options`).
    pub snake: String,
    /// Native options type.
    pub cpp: String,
    pub parent: Option<String>,
    /// Own fields, then inherited ones.
    pub fields: Vec<OptionField>,
    /// Fields passed to the native constructor, in order.
    pub native_constructor: Vec<String>,
}

impl OptionsStruct {
    pub fn field(&self, name: &str) -> Option<&OptionField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `TORCH_TYPE_…` macro name: the upper snake name minus its first word.
    pub fn type_macro(&self) -> String {
        let upper = self.snake.to_uppercase();
        let rest = upper.split_once('_').map_or(upper.as_str(), |(_, r)| r);
        format!("TORCH_TYPE_{rest}")
    }

    /// Names of every constructor parameter, in order.
    pub fn constructor_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }
}

/// Normalized options output of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsUnit {
    pub enums: Vec<GeneratedEnum>,
    pub structs: Vec<OptionsStruct>,
}

/// Definitions lowered from header declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderDefinitions {
    pub enums: Vec<GeneratedEnum>,
    pub definitions: Vec<OptionsDefinition>,
}

/// Normalize options definitions, resolving inheritance.
pub fn normalize_definitions(
    defs: &[OptionsDefinition],
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> Result<Vec<OptionsStruct>> {
    let structs: Vec<OptionsStruct> = defs
        .iter()
        .map(|def| normalize_definition(def, mapper, config))
        .collect();
    let structs = inherit::propagate(structs)?;

    for s in &structs {
        for arg in &s.native_constructor {
            if s.field(arg).is_none() {
                return Err(NormalizeError::UnknownConstructorArg {
                    structure: s.name.clone(),
                    arg: arg.clone(),
                });
            }
        }
    }

    tracing::info!(structs = structs.len(), "normalized options structs");
    Ok(structs)
}

/// Lower header declarations to definitions, registering aliases and
/// generated enums with `mapper`, then normalize them.
pub fn normalize_header(
    decls: &[RawDeclaration],
    mapper: &mut TypeMapper,
    config: &NormalizeConfig,
) -> Result<OptionsUnit> {
    let lowered = definitions_from_header(decls, mapper, config)?;
    let structs = normalize_definitions(&lowered.definitions, mapper, config)?;
    Ok(OptionsUnit {
        enums: lowered.enums,
        structs,
    })
}

fn normalize_definition(def: &OptionsDefinition, mapper: &TypeMapper, config: &NormalizeConfig) -> OptionsStruct {
    let type_name = format!("{}{}", config.naming.type_prefix, def.name);
    OptionsStruct {
        name: def.name.clone(),
        snake: camel_to_lower_snake(&type_name),
        type_name,
        cpp: def.cpp.clone(),
        parent: def.parent.clone(),
        fields: def.opts.iter().map(|opt| field_from_def(opt, mapper)).collect(),
        native_constructor: def
            .cpp_constructor
            .as_ref()
            .map(|c| c.args.clone())
            .unwrap_or_default(),
    }
}

fn field_from_def(opt: &OptionDef, mapper: &TypeMapper) -> OptionField {
    let is_callback = opt.is_callback();
    let container = storage::storage_for(&opt.c_type).filter(|_| !is_callback);
    let storage_type = storage::storage_type(&opt.c_type, is_callback);

    let mut meta = Meta::new();
    if let Some(container) = &container {
        meta.insert("type".to_string(), container.element_type.to_string());
        meta.insert("convert_type".to_string(), container.element_type.to_string());
    }
    meta.extend(opt.meta.template_meta());

    let to_native = if is_callback {
        Conversion::Callback(Box::new(callback_conversion(opt, mapper)))
    } else if !opt.meta.convert_pipeline.is_empty() {
        Conversion::Pipeline(opt.meta.convert_pipeline.clone())
    } else {
        mapper
            .field_conversion(&storage_type)
            .cloned()
            .unwrap_or(Conversion::Identity)
    };

    OptionField {
        name: opt.name.clone(),
        c_type: TargetType::new(opt.c_type.as_str()),
        storage: TargetType::new(storage_type),
        storage_element: container.map(|c| c.element_type.to_string()),
        element_type: container
            .and_then(|c| storage::introspection_type(c.element_type))
            .map(str::to_string),
        length: opt.meta.length.clone(),
        callback: opt.meta.func_data_ptr.as_ref().map(|data| CallbackData {
            data: data.clone(),
            destroy: opt.meta.func_data_ptr_destroy.clone(),
        }),
        to_native,
        meta,
        default: opt.default.clone(),
        inherited_from: None,
    }
}

fn callback_conversion(opt: &OptionDef, mapper: &TypeMapper) -> CallbackConversion {
    let args = opt
        .meta
        .args
        .iter()
        .map(|a| CallbackArg {
            name: a.name.clone(),
            c_type: TargetType::new(a.c_type.as_str()),
            cpp_type: a.cpp_type.clone(),
            to_target: a
                .convert
                .as_deref()
                .map_or_else(|| storage::callback_arg_conversion(&a.cpp_type), Conversion::parse),
        })
        .collect();
    let ret = opt.meta.ret.as_ref().map(|r| CallbackReturn {
        c_type: TargetType::new(r.c_type.as_str()),
        cpp_type: r.cpp_type.clone(),
        to_native: match r.convert.as_deref() {
            Some(convert) => Conversion::parse(convert),
            None => mapper
                .field_conversion(&r.c_type)
                .cloned()
                .unwrap_or(Conversion::Identity),
        },
    });
    CallbackConversion {
        field: opt.name.clone(),
        signature: opt.meta.signature.clone().unwrap_or_else(|| opt.c_type.clone()),
        args,
        ret,
    }
}

/// Lower header declarations to options definitions.
///
/// Aliases are registered first (scoped to their enclosing struct), then
/// enum-only variants become generated enums with a scoped rule each, and
/// finally every options struct is resolved field by field. A field with
/// no rule aborts: a struct cannot drop a member.
pub fn definitions_from_header(
    decls: &[RawDeclaration],
    mapper: &mut TypeMapper,
    config: &NormalizeConfig,
) -> Result<HeaderDefinitions> {
    for decl in decls {
        if let RawDeclaration::TypeAlias(alias) = decl {
            match &alias.scope {
                Some(scope) => mapper.alias_scoped(scope, &alias.name, &alias.target),
                None => mapper.alias(&alias.name, &alias.target),
            }
        }
    }

    let mut lowered = HeaderDefinitions::default();
    let mut enum_names = BTreeSet::new();
    for decl in decls {
        let RawDeclaration::VariantEnum(variant) = decl else {
            continue;
        };
        if !variant.is_enum_only() {
            tracing::debug!(name = %variant.name, "variant with non-enum arms left to the rule tables");
            continue;
        }
        let generated = generated_enum(variant, config);
        let rule = TypeRule::new(variant.name.as_str(), generated.type_name.as_str())
            .with_to_native(Conversion::Call(generated.converter.clone()));
        match &variant.scope {
            Some(scope) => mapper.insert_scoped(scope, rule),
            None => mapper.insert(rule),
        }
        mapper.register_field_conversion(
            &generated.type_name,
            Conversion::Call(generated.converter.clone()),
        );
        if enum_names.insert(generated.type_name.clone()) {
            lowered.enums.push(generated);
        }
    }

    let mut struct_names = BTreeSet::new();
    for decl in decls {
        let RawDeclaration::OptionsStruct(decl) = decl else {
            continue;
        };
        let def = definition_from_struct(decl, mapper, config)?;
        if !struct_names.insert(def.name.clone()) {
            tracing::warn!(name = %def.name, cpp = %def.cpp, "duplicate options struct ignored");
            continue;
        }
        lowered.definitions.push(def);
    }

    tracing::debug!(
        enums = lowered.enums.len(),
        structs = lowered.definitions.len(),
        "lowered header declarations"
    );
    Ok(lowered)
}

/// `TorchNN` + scope without `Options` + alias without `_t`, camel-cased.
fn generated_enum(variant: &VariantDecl, config: &NormalizeConfig) -> GeneratedEnum {
    let scope = variant
        .scope
        .as_deref()
        .map(|s| s.strip_suffix("Options").unwrap_or(s))
        .unwrap_or("");
    let alias = variant.name.strip_suffix("_t").unwrap_or(&variant.name);
    let prefix = config.naming.options_prefix.as_str();
    let type_name = format!("{prefix}{}{}", snake_to_camel(scope), snake_to_camel(alias));

    let snake = camel_to_lower_snake(&type_name);
    let tail = camel_to_lower_snake(type_name.strip_prefix(prefix).unwrap_or(&type_name));
    let upper = camel_to_snake(&type_name);

    let members: Vec<EnumMember> = variant
        .arms
        .iter()
        .filter_map(|arm| {
            let tag = enum_tag(arm)?;
            Some(EnumMember {
                constant: format!("{upper}_{}", camel_to_snake(tag)),
                native_tag: qualify_tag(arm),
            })
        })
        .collect();
    let native = format!(
        "c10::variant<{}>",
        members
            .iter()
            .map(|m| m.native_tag.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    GeneratedEnum {
        converter: format!("{snake}_to_real_{tail}"),
        type_name,
        native,
        members,
    }
}

fn qualify_tag(arm: &str) -> String {
    let arm = canonicalize(arm);
    if arm.starts_with("enumtype::") {
        format!("torch::{arm}")
    } else {
        arm
    }
}

/// `padding_mode` → `PaddingMode`; already camel-cased input is kept.
fn snake_to_camel(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn definition_from_struct(
    decl: &OptionsStructDecl,
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> Result<OptionsDefinition> {
    let name_prefix = config
        .naming
        .options_prefix
        .strip_prefix(config.naming.type_prefix.as_str())
        .unwrap_or("");

    let mut cpp = decl.qualified_name();
    if !decl.template_params.is_empty() {
        cpp = format!("{cpp}<{}>", decl.template_params.join(", "));
    }

    let parent = decl.parent.as_deref().and_then(|p| {
        let base = p.split('<').next().unwrap_or(p);
        let base = base.rsplit("::").next().unwrap_or(base).trim();
        base.ends_with("Options").then(|| format!("{name_prefix}{base}"))
    });

    let opts = decl
        .args
        .iter()
        .map(|arg| {
            let rule = mapper
                .resolve(&arg.native_type, Some(&decl.name))
                .map_err(|e| match e {
                    MapError::UnmappableType { .. } | MapError::InvalidNativeType { .. } => {
                        NormalizeError::UnmappableField {
                            structure: decl.name.clone(),
                            field: arg.name.clone(),
                            native: arg.native_type.clone(),
                        }
                    }
                    other => other.into(),
                })?;
            Ok(option_from_rule(&arg.name, &arg.native_type, arg.default.clone(), &rule))
        })
        .collect::<Result<Vec<_>>>()?;

    let cpp_constructor = decl
        .constructor
        .as_ref()
        .filter(|params| !params.is_empty())
        .map(|params| CppConstructor {
            args: params.iter().map(|p| p.name.clone()).collect(),
        });

    Ok(OptionsDefinition {
        name: format!("{name_prefix}{}", decl.name),
        cpp,
        parent,
        cpp_constructor,
        opts,
    })
}

fn option_from_rule(name: &str, native: &str, default: Option<String>, rule: &TypeRule) -> OptionDef {
    let mut meta = OptionMeta::default();
    let template = |c: &Conversion| (!c.is_identity()).then(|| c.to_template()).flatten();

    if let Conversion::Callback(callback) = &rule.to_native {
        meta.func_data_ptr = Some(format!("{name}_data"));
        meta.func_data_ptr_destroy = Some(format!("{name}_data_destroy"));
        meta.signature = Some(callback.signature.clone());
        meta.args = callback
            .args
            .iter()
            .map(|a| CallbackArgDef {
                name: a.name.clone(),
                c_type: a.c_type.to_string(),
                cpp_type: a.cpp_type.clone(),
                convert: template(&a.to_target),
            })
            .collect();
        meta.ret = callback.ret.as_ref().map(|r| CallbackArgDef {
            name: String::new(),
            c_type: r.c_type.to_string(),
            cpp_type: r.cpp_type.clone(),
            convert: template(&r.to_native),
        });
    } else {
        if let Some(length) = &rule.array {
            meta.value_type = rule.element_type.as_ref().map(|e| e.to_string());
            meta.length = Some(match length {
                ArrayLength::Fixed(n) => LengthSpec::Fixed(*n as u64),
                ArrayLength::Param(_) => LengthSpec::Named(format!("{name}_len")),
            });
        } else if let Some(value_type) = rule.meta.get("type") {
            meta.value_type = Some(value_type.clone());
        }
        if storage::storage_for(rule.target.as_str()).is_none() {
            if let Some(t) = template(&rule.to_native) {
                meta.convert_pipeline = vec![t];
            }
        }
    }

    OptionDef {
        name: name.to_string(),
        c_type: rule.target.to_string(),
        cpp_type: Some(canonicalize(native)),
        default,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbind_extract::defs::parse_definitions;

    const HEADER: &str = r#"
namespace torch {
namespace nn {

struct TORCH_API HuberLossOptions {
  typedef c10::variant<enumtype::kNone, enumtype::kMean, enumtype::kSum> reduction_t;

  TORCH_ARG(reduction_t, reduction) = torch::kMean;
};

struct TORCH_API LinearOptions {
  LinearOptions(int64_t in_features, int64_t out_features);
  TORCH_ARG(int64_t, in_features);
  TORCH_ARG(int64_t, out_features);
  TORCH_ARG(bool, bias) = true;
};

template <size_t D>
struct ConvOptions {
  ConvOptions(int64_t in_channels, ExpandingArray<D> kernel_size);
  TORCH_ARG(int64_t, in_channels);
  TORCH_ARG(ExpandingArray<D>, kernel_size);
  TORCH_ARG(c10::optional<int64_t>, groups) = c10::nullopt;
};

struct TripletMarginWithDistanceLossOptions {
  TORCH_ARG(std::function<Tensor(const Tensor&, const Tensor&)>, distance_function);
};

} // namespace nn
} // namespace torch
"#;

    fn header_unit() -> (OptionsUnit, TypeMapper) {
        let decls: Vec<_> = gbind_extract::scan(HEADER).collect();
        let mut mapper = TypeMapper::with_defaults();
        let unit = normalize_header(&decls, &mut mapper, &NormalizeConfig::default()).unwrap();
        (unit, mapper)
    }

    #[test]
    fn enum_from_variant() {
        let (unit, _) = header_unit();
        assert_eq!(unit.enums.len(), 1);
        let e = &unit.enums[0];
        assert_eq!(e.type_name, "TorchNNHuberLossReduction");
        assert_eq!(e.converter, "torch_nn_huber_loss_reduction_to_real_huber_loss_reduction");
        let constants: Vec<_> = e.members.iter().map(|m| m.constant.as_str()).collect();
        assert_eq!(
            constants,
            vec![
                "TORCH_NN_HUBER_LOSS_REDUCTION_NONE",
                "TORCH_NN_HUBER_LOSS_REDUCTION_MEAN",
                "TORCH_NN_HUBER_LOSS_REDUCTION_SUM"
            ]
        );
        assert_eq!(e.members[1].native_tag, "torch::enumtype::kMean");

        let huber = &unit.structs[0];
        let field = &huber.fields[0];
        assert_eq!(field.c_type.as_str(), "TorchNNHuberLossReduction");
        assert_eq!(
            field.native_expression("opts->reduction"),
            "torch_nn_huber_loss_reduction_to_real_huber_loss_reduction (opts->reduction)"
        );
    }

    #[test]
    fn header_structs_lower_to_definitions() {
        let (unit, _) = header_unit();
        let names: Vec<_> = unit.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "NNHuberLossOptions",
                "NNLinearOptions",
                "NNConvOptions",
                "NNTripletMarginWithDistanceLossOptions"
            ]
        );

        let linear = &unit.structs[1];
        assert_eq!(linear.type_name, "TorchNNLinearOptions");
        assert_eq!(linear.snake, "torch_nn_linear_options");
        assert_eq!(linear.type_macro(), "TORCH_TYPE_NN_LINEAR_OPTIONS");
        assert_eq!(linear.cpp, "torch::nn::LinearOptions");
        assert_eq!(linear.native_constructor, vec!["in_features", "out_features"]);
        assert_eq!(linear.fields[2].c_type.as_str(), "gboolean");
        assert_eq!(linear.fields[2].default.as_deref(), Some("true"));
    }

    #[test]
    fn arrays_and_optionals_in_storage() {
        let (unit, _) = header_unit();
        let conv = &unit.structs[2];
        assert_eq!(conv.cpp, "torch::nn::ConvOptions<D>");

        let kernel = conv.field("kernel_size").unwrap();
        assert_eq!(kernel.c_type.as_str(), "int64_t *");
        assert_eq!(kernel.storage.as_str(), "GArray *");
        assert_eq!(kernel.element_type.as_deref(), Some("gint64"));
        assert_eq!(kernel.length, Some(LengthSpec::Named("kernel_size_len".into())));
        assert_eq!(
            kernel.native_expression("opts->kernel_size"),
            "torch_array_ref_from_garray <int64_t> (opts->kernel_size)"
        );
        let names: Vec<_> = kernel.constructor_params().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["kernel_size", "kernel_size_len"]);

        let groups = conv.field("groups").unwrap();
        assert_eq!(groups.c_type.as_str(), "TorchOptionalValue *");
        assert_eq!(
            groups.native_expression("opts->groups"),
            "torch_optional_value_to_c10_optional (opts->groups, torch_optional_value_get_int64_t)"
        );
    }

    #[test]
    fn callbacks_carry_user_data() {
        let (unit, _) = header_unit();
        let field = &unit.structs[3].fields[0];
        assert_eq!(field.storage.as_str(), storage::CALLBACK_STORAGE);
        let params: Vec<_> = field
            .constructor_params()
            .into_iter()
            .map(|(t, n)| format!("{t} {n}"))
            .collect();
        assert_eq!(
            params,
            vec![
                "GCallback distance_function",
                "gpointer distance_function_data",
                "GDestroyNotify distance_function_data_destroy"
            ]
        );
        let expr = field.native_expression("opts->distance_function");
        assert!(expr.starts_with("[distance_function_callback_data_callable_wrapper"));
        assert!(expr.contains("torch_tensor_new_from_real_tensor (arg0)"));
    }

    #[test]
    fn unmappable_field_is_fatal() {
        let header = "struct BadOptions {\n  TORCH_ARG(at::QScheme, scheme);\n};\n";
        let decls: Vec<_> = gbind_extract::scan(header).collect();
        let mut mapper = TypeMapper::with_defaults();
        let err = normalize_header(&decls, &mut mapper, &NormalizeConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnmappableField { ref field, .. } if field == "scheme"
        ));
    }

    #[test]
    fn json_definitions() {
        let json = r#"[
          {
            "name": "NNFoldOptions",
            "cpp": "torch::nn::FoldOptions",
            "cpp_constructor": { "args": ["output_size", "kernel_size"] },
            "opts": [
              { "name": "output_size", "c_type": "int64_t *", "meta": { "length": 2 } },
              { "name": "kernel_size", "c_type": "int64_t *", "meta": { "length": 2 } },
              { "name": "dilation", "c_type": "int64_t *", "meta": { "length": "n_dilation" } },
              { "name": "weight", "c_type": "TorchTensor *" },
              { "name": "p", "c_type": "double" }
            ]
          }
        ]"#;
        let defs = parse_definitions(json).unwrap();
        let mapper = TypeMapper::with_defaults();
        let structs = normalize_definitions(&defs, &mapper, &NormalizeConfig::default()).unwrap();
        let fold = &structs[0];
        assert_eq!(fold.type_name, "TorchNNFoldOptions");
        assert_eq!(
            fold.field("weight").unwrap().native_expression("opts->weight"),
            "torch_tensor_get_real_tensor (opts->weight)"
        );
        assert_eq!(fold.field("p").unwrap().native_expression("opts->p"), "opts->p");
        let dilation = fold.field("dilation").unwrap();
        assert_eq!(
            dilation.constructor_params()[1],
            (TargetType::new("size_t"), "n_dilation".to_string())
        );
    }

    #[test]
    fn unknown_constructor_arg() {
        let json = r#"[{ "name": "NNX", "cpp": "X", "cpp_constructor": { "args": ["missing"] }, "opts": [] }]"#;
        let defs = parse_definitions(json).unwrap();
        let err = normalize_definitions(&defs, &TypeMapper::with_defaults(), &NormalizeConfig::default())
            .unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownConstructorArg { .. }));
    }
}
