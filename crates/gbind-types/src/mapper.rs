//! The type mapping registry.
//!
//! Lookup order for `resolve(native, context)`:
//! 1. rule tables scoped to patterns matching `context`, longest pattern first;
//! 2. the context-free table;
//! 3. aliases, in the same order, followed recursively;
//! 4. the shape of the type (optional, sequence, expanding array, callback),
//!    resolving inner types recursively.

use std::collections::{BTreeMap, BTreeSet};

use crate::defaults;
use crate::error::{MapError, Result};
use crate::native::{canonicalize, Arity, NativeType, DEFAULT_EXPANDING_ELEMENT};
use crate::rule::{
    ArrayLength, CallbackArg, CallbackConversion, CallbackReturn, Cleanup, Conversion, TypeRule,
};
use crate::storage;
use crate::target::TargetType;

/// Target type of callback-shaped values.
pub const CALLBACK_TARGET: &str = "GCallback";

/// A glob over enclosing declaration names; `*` matches any run of characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContextPattern(String);

impl ContextPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Specificity used to order competing matches.
    pub fn specificity(&self) -> usize {
        self.0.len()
    }

    pub fn matches(&self, context: &str) -> bool {
        glob_match(self.0.as_bytes(), context.as_bytes())
    }
}

fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|i| glob_match(rest, &text[i..])),
        Some((&p, rest)) => text
            .split_first()
            .is_some_and(|(&t, text_rest)| t == p && glob_match(rest, text_rest)),
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    rules: BTreeMap<String, TypeRule>,
    aliases: BTreeMap<String, String>,
}

/// Registry of native → target type rules.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    global: Table,
    scoped: BTreeMap<ContextPattern, Table>,
    field_conversions: BTreeMap<String, Conversion>,
}

impl TypeMapper {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in tables.
    pub fn with_defaults() -> Self {
        let mut mapper = Self::new();
        for rule in defaults::default_rules() {
            mapper.insert(rule);
        }
        for rule in defaults::options_rules() {
            mapper.insert_scoped(defaults::OPTIONS_CONTEXT, rule);
        }
        for (name, target) in defaults::default_aliases() {
            mapper.alias(name, target);
        }
        for (c_type, conversion) in storage::default_field_conversions() {
            mapper.register_field_conversion(c_type, conversion);
        }
        mapper
    }

    /// Add or replace a context-free rule.
    pub fn insert(&mut self, mut rule: TypeRule) {
        rule.native = canonicalize(&rule.native);
        self.global.rules.insert(rule.native.clone(), rule);
    }

    /// Add or replace a rule that applies only in contexts matching `pattern`.
    pub fn insert_scoped(&mut self, pattern: &str, mut rule: TypeRule) {
        rule.native = canonicalize(&rule.native);
        self.scoped
            .entry(ContextPattern::new(pattern))
            .or_default()
            .rules
            .insert(rule.native.clone(), rule);
    }

    /// Make `name` resolve as `target` everywhere.
    pub fn alias(&mut self, name: &str, target: &str) {
        self.global
            .aliases
            .insert(canonicalize(name), canonicalize(target));
    }

    /// Make `name` resolve as `target` in contexts matching `pattern`.
    pub fn alias_scoped(&mut self, pattern: &str, name: &str, target: &str) {
        self.scoped
            .entry(ContextPattern::new(pattern))
            .or_default()
            .aliases
            .insert(canonicalize(name), canonicalize(target));
    }

    /// Register how a stored options field of `c_type` converts to native.
    pub fn register_field_conversion(&mut self, c_type: &str, conversion: Conversion) {
        self.field_conversions.insert(c_type.to_string(), conversion);
    }

    /// Conversion for a stored options field of `c_type`, if one is known.
    pub fn field_conversion(&self, c_type: &str) -> Option<&Conversion> {
        self.field_conversions.get(c_type)
    }

    /// Native spellings of every context-free rule.
    pub fn default_natives(&self) -> impl Iterator<Item = &str> {
        self.global.rules.keys().map(String::as_str)
    }

    /// Resolve a native type in an optional context.
    pub fn resolve(&self, native: &str, context: Option<&str>) -> Result<TypeRule> {
        let rule = self.resolve_canonical(&canonicalize(native), context, &mut BTreeSet::new())?;
        tracing::trace!(native, ?context, target = %rule.target, "resolved type");
        Ok(rule)
    }

    /// Whether `resolve` would succeed.
    pub fn is_mappable(&self, native: &str, context: Option<&str>) -> bool {
        self.resolve(native, context).is_ok()
    }

    fn tables_for<'a>(&'a self, context: Option<&str>) -> Vec<&'a Table> {
        let mut scoped: Vec<(&ContextPattern, &Table)> = match context {
            Some(ctx) => self.scoped.iter().filter(|(p, _)| p.matches(ctx)).collect(),
            None => Vec::new(),
        };
        // Longest pattern first; ties keep the map's lexical order.
        scoped.sort_by(|(a, _), (b, _)| b.specificity().cmp(&a.specificity()));
        scoped
            .into_iter()
            .map(|(_, t)| t)
            .chain(std::iter::once(&self.global))
            .collect()
    }

    fn resolve_canonical(
        &self,
        native: &str,
        context: Option<&str>,
        seen: &mut BTreeSet<String>,
    ) -> Result<TypeRule> {
        let tables = self.tables_for(context);

        if let Some(rule) = tables.iter().find_map(|t| t.rules.get(native)) {
            return Ok(rule.clone());
        }

        if let Some(target) = tables.iter().find_map(|t| t.aliases.get(native)) {
            if !seen.insert(native.to_string()) {
                return Err(MapError::AliasCycle {
                    name: native.to_string(),
                });
            }
            return self.resolve_canonical(target, context, seen);
        }

        let shape = NativeType::parse(native)?;
        self.resolve_shape(native, shape, context, seen)
    }

    fn resolve_shape(
        &self,
        native: &str,
        shape: NativeType,
        context: Option<&str>,
        seen: &BTreeSet<String>,
    ) -> Result<TypeRule> {
        // Sibling types may legitimately pass through the same alias, so each
        // inner resolution gets its own copy of the alias trail.
        let resolve_inner = |native: &str| self.resolve_canonical(native, context, &mut seen.clone());
        match shape {
            NativeType::Optional { wrapper, inner } => {
                let rule = resolve_inner(&inner.to_string())?;
                Ok(rule.into_optional(&wrapper))
            }
            NativeType::Sequence { container, element } => {
                let element = resolve_inner(&element.to_string())?;
                Ok(sequence_rule(&container, element))
            }
            NativeType::Expanding { ref arity, .. } => {
                let element = shape
                    .expanding_element()
                    .map_or_else(|| DEFAULT_EXPANDING_ELEMENT.to_string(), |e| e.to_string());
                let element = resolve_inner(&element)?;
                Ok(expanding_rule(native, arity, element))
            }
            NativeType::Callback { ret, args, .. } => {
                let args = args
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| {
                        let rule = resolve_inner(&arg.to_string())?;
                        Ok(CallbackArg {
                            name: format!("arg{i}"),
                            c_type: rule.target.clone(),
                            cpp_type: rule.native_param_spelling(),
                            to_target: rule.to_target,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let ret = if ret.is_void() {
                    None
                } else {
                    let rule = resolve_inner(&ret.to_string())?;
                    Some(CallbackReturn {
                        c_type: rule.target,
                        cpp_type: rule.native,
                        to_native: rule.to_native,
                    })
                };
                Ok(callback_rule(native, args, ret))
            }
            NativeType::Void
            | NativeType::Named(_)
            | NativeType::Variant { .. }
            | NativeType::Template { .. } => Err(MapError::UnmappableType {
                native: native.to_string(),
                context: context.map(str::to_string),
            }),
        }
    }
}

fn sequence_rule(container: &str, element: TypeRule) -> TypeRule {
    let native = format!("{container}<{}>", element.native);
    let (target, to_native, to_target) = if element.target.is_pointer() {
        ("GPtrArray *", "torch_list_from_gptrarray", "torch_new_gptrarray_from_list")
    } else {
        ("GArray *", "torch_array_ref_from_garray", "torch_new_garray_from_array_ref")
    };
    let mut rule = TypeRule::new(native, target)
        .with_element(element.target.clone())
        .with_meta("type", element.native.clone())
        .with_to_native(Conversion::Generic {
            func: to_native.into(),
            type_arg: element.native.clone(),
        })
        .with_to_target(Conversion::Generic {
            func: to_target.into(),
            type_arg: element.native.clone(),
        })
        .with_cleanup(Cleanup::AutoPtr);
    rule.nullable_elements = element.nullable;
    rule
}

fn expanding_rule(native: &str, arity: &Arity, element: TypeRule) -> TypeRule {
    let length = match arity {
        Arity::Fixed(n) => ArrayLength::Fixed(*n),
        Arity::Symbolic(p) => ArrayLength::Param(p.clone()),
    };
    let mut rule = TypeRule::new(native, element.target.pointer_to())
        .with_element(element.target.clone())
        .with_meta("type", element.target.to_string())
        .with_meta("length", length.to_string())
        .with_to_native(Conversion::WithArgs {
            func: "torch_array_ref_from_fixed_array".into(),
            args: vec![length.to_string()],
        });
    // Arrays only ever travel into the native side.
    rule.array = Some(length);
    rule
}

fn callback_rule(native: &str, args: Vec<CallbackArg>, ret: Option<CallbackReturn>) -> TypeRule {
    let mut params: Vec<String> = args.iter().map(|a| a.c_type.to_string()).collect();
    params.push("gpointer".to_string());
    let ret_c = ret
        .as_ref()
        .map_or_else(|| TargetType::new("void"), |r| r.c_type.clone());
    let signature = format!("{ret_c} (*) ({})", params.join(", "));
    TypeRule::new(native, CALLBACK_TARGET)
        .with_meta("signature", signature.clone())
        .with_to_native(Conversion::Callback(Box::new(CallbackConversion {
            field: "callback".to_string(),
            signature,
            args,
            ret,
        })))
}
