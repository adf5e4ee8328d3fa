//! Options structs and generated enums → header, source and
//! introspectable source.
//!
//! Struct members hold storage types: arrays live in `GArray`, callbacks
//! in `TorchCallbackData`. The constructor wraps its arguments into that
//! storage, the copy function takes new references member by member, and
//! `struct_to_options` rebuilds the native options object from a struct.

use gbind_extract::LengthSpec;
use gbind_normalize::options::{GeneratedEnum, OptionField, OptionsStruct};
use gbind_types::rule::render_template;
use gbind_types::{storage, ArrayLength, Ownership, TargetType};

use crate::annotation::{doc_comment, prototype, Annotated};
use crate::error::{EmitError, Result};
use crate::function::indent;

/// Names of the functions generated for one struct.
struct StructNames {
    new: String,
    copy: String,
    free: String,
    get_type: String,
    to_options: String,
    pointer: TargetType,
}

impl StructNames {
    fn of(s: &OptionsStruct) -> Self {
        Self {
            new: format!("{}_new", s.snake),
            copy: format!("{}_copy", s.snake),
            free: format!("{}_free", s.snake),
            get_type: format!("{}_get_type", s.snake),
            to_options: format!("{}_struct_to_options", s.snake),
            pointer: TargetType::new(format!("{} *", s.type_name)),
        }
    }
}

/// `typedef enum { … } TorchNN…;` with one documented constant per arm.
pub fn enum_header(e: &GeneratedEnum) -> String {
    let members: Vec<Annotated> = e
        .members
        .iter()
        .map(|m| Annotated::new(m.constant.as_str(), "int").described(format!("`{}`", m.native_tag)))
        .collect();
    let mut lines = vec![String::new(), doc_comment(&e.type_name, &members, None)];
    lines.push("typedef enum {".to_string());
    lines.extend(e.members.iter().map(|m| format!("  {},", m.constant)));
    lines.push(format!("}} {};", e.type_name));
    lines.join("\n")
}

/// `static` switch converting a constant into the native variant.
pub fn enum_converter(e: &GeneratedEnum) -> String {
    let mut lines = vec![
        String::new(),
        format!("static {} {} ({} value)", e.native, e.converter, e.type_name),
        "{".to_string(),
        "  switch (value)".to_string(),
        "    {".to_string(),
    ];
    for member in &e.members {
        lines.push(format!("      case {}:", member.constant));
        lines.push(format!("        return {} ();", member.native_tag));
    }
    lines.push("      default:".to_string());
    lines.push(format!(
        "        throw std::invalid_argument (\"Invalid {} value\");",
        e.type_name
    ));
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

/// Documentation, layout and prototypes of one struct.
pub fn struct_header(s: &OptionsStruct) -> String {
    let names = StructNames::of(s);
    let members: Vec<Annotated> = s.fields.iter().map(member_annotation).collect();

    let mut lines = vec![String::new(), doc_comment(&s.type_name, &members, None)];
    lines.push("typedef struct {".to_string());
    lines.extend(s.fields.iter().map(|f| format!("  {} {};", f.storage, f.name)));
    lines.push(format!("}} {};", s.type_name));
    lines.push(String::new());

    let params = constructor_params(s);
    lines.push(format!(
        "{};",
        prototype(&names.pointer, &names.new, params.iter().map(|(t, n)| (t, n.as_str())))
    ));
    lines.push(format!(
        "{};",
        prototype(&names.pointer, &names.copy, [(&names.pointer, "opts")])
    ));
    lines.push(format!(
        "{};",
        prototype(&TargetType::new("void"), &names.free, [(&names.pointer, "opts")])
    ));
    lines.push(String::new());
    lines.push(format!("{};", prototype(&TargetType::new("GType"), &names.get_type, [])));
    lines.push(format!("#define {} ({} ())", s.type_macro(), names.get_type));
    lines.join("\n")
}

fn member_annotation(field: &OptionField) -> Annotated {
    let pointer = field.is_pointer();
    let mut a = Annotated::new(field.name.as_str(), field.c_type.clone()).nullable(pointer);
    if pointer {
        a = a.transfer(Ownership::None);
    }
    a.element_type = field.element_type.clone();
    a
}

fn constructor_params(s: &OptionsStruct) -> Vec<(TargetType, String)> {
    s.fields.iter().flat_map(OptionField::constructor_params).collect()
}

/// `<cpp> …_struct_to_options (TorchX *opts)`.
///
/// The native-constructor fields are passed to the native constructor; every
/// other field goes through its setter, pointer-stored ones only when set.
pub fn struct_to_options(s: &OptionsStruct) -> Result<String> {
    let names = StructNames::of(s);
    let ctor_args = s
        .native_constructor
        .iter()
        .map(|name| {
            s.field(name)
                .map(|f| f.native_expression(&format!("opts->{name}")))
                .ok_or_else(|| EmitError::Invariant {
                    name: s.name.clone(),
                    detail: format!("constructor argument '{name}' is not a field"),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut lines = vec![
        String::new(),
        format!("{} {} ({} *opts)", s.cpp, names.to_options, s.type_name),
        "{".to_string(),
        format!("  auto options = {}({});", s.cpp, ctor_args.join(", ")),
    ];
    for field in &s.fields {
        if s.native_constructor.contains(&field.name) {
            continue;
        }
        let member = format!("opts->{}", field.name);
        let setter = format!(
            "options = options.{}({});",
            field.name,
            field.native_expression(&member)
        );
        lines.push(String::new());
        if field.storage.is_pointer() {
            lines.push(format!("  if ({member} != nullptr)"));
            lines.push("    {".to_string());
            lines.push(indent_block(&setter, 6));
            lines.push("    }".to_string());
        } else {
            lines.push(indent_block(&setter, 2));
        }
    }
    lines.push(String::new());
    lines.push("  return options;".to_string());
    lines.push("}".to_string());
    Ok(lines.join("\n"))
}

/// Constructor, copy and destructor bodies plus the boxed type registration.
pub fn introspectable_source(s: &OptionsStruct) -> Result<String> {
    let names = StructNames::of(s);
    let sections = [
        constructor_source(s, &names)?,
        copy_source(s, &names)?,
        destructor_source(s, &names),
        format!(
            "G_DEFINE_BOXED_TYPE ({}, {}, (GBoxedCopyFunc) {}, (GBoxedFreeFunc) {})",
            s.type_name, s.snake, names.copy, names.free
        ),
    ];
    Ok(format!("\n{}", sections.join("\n\n")))
}

fn constructor_source(s: &OptionsStruct, names: &StructNames) -> Result<String> {
    let params = constructor_params(s);
    let mut docs = Vec::new();
    for field in &s.fields {
        let mut a = member_annotation(field);
        a.element_type = None;
        a.array = field.length.as_ref().map(|len| match len {
            LengthSpec::Fixed(n) => ArrayLength::Fixed(*n as usize),
            LengthSpec::Named(n) => ArrayLength::parse(n),
        });
        if let Some(callback) = &field.callback {
            a.scope = callback.destroy.as_ref().map(|_| "notified".to_string());
            a.destroy = callback.destroy.clone();
        }
        docs.push(a);
        docs.extend(
            field
                .constructor_params()
                .into_iter()
                .skip(1)
                .map(|(ty, name)| Annotated::new(name, ty)),
        );
    }
    let ret = Annotated::new("", names.pointer.clone())
        .transfer(Ownership::Full)
        .described(format!("A new #{}", s.type_name));

    let mut lines = vec![
        doc_comment(&names.new, &docs, Some(&ret)),
        prototype(&names.pointer, &names.new, params.iter().map(|(t, n)| (t, n.as_str()))),
        "{".to_string(),
        format!("  {} *opts = g_new0 ({}, 1);", s.type_name, s.type_name),
        String::new(),
    ];
    for field in &s.fields {
        lines.push(format!("  opts->{} = {};", field.name, stored_value(s, field)?));
    }
    lines.push(String::new());
    lines.push("  return opts;".to_string());
    lines.push("}".to_string());
    Ok(lines.join("\n"))
}

/// The expression storing constructor argument `field` into its member.
fn stored_value(s: &OptionsStruct, field: &OptionField) -> Result<String> {
    let name = field.name.as_str();
    if let Some(callback) = &field.callback {
        return Ok(format!(
            "torch_callback_data_new ({name}, {}, {})",
            callback.data,
            callback.destroy.as_deref().unwrap_or("NULL")
        ));
    }
    if let Some(container) = storage::storage_for(field.c_type.as_str()) {
        if !field.meta.contains_key("length") {
            return Err(EmitError::Invariant {
                name: s.name.clone(),
                detail: format!("array field '{name}' has no length"),
            });
        }
        return Ok(render_template(container.convert_func, name, &field.meta));
    }
    Ok(match storage::copy_func(field.storage.as_str()) {
        Some(copy) => format!("{name} != NULL ? {copy} ({name}) : NULL"),
        None => name.to_string(),
    })
}

fn copy_source(s: &OptionsStruct, names: &StructNames) -> Result<String> {
    let args = [Annotated::new("opts", names.pointer.clone())
        .transfer(Ownership::None)
        .described(format!("The #{} to copy.", s.type_name))];
    let ret = Annotated::new("", names.pointer.clone())
        .transfer(Ownership::Full)
        .described(format!("A new #{} which is a copy of @opts.", s.type_name));

    let mut lines = vec![
        doc_comment(&names.copy, &args, Some(&ret)),
        prototype(&names.pointer, &names.copy, [(&names.pointer, "opts")]),
        "{".to_string(),
        format!("  {} *new_opts = g_new0 ({}, 1);", s.type_name, s.type_name),
        String::new(),
    ];
    for field in &s.fields {
        let member = format!("opts->{}", field.name);
        let copied = match storage::storage_for(field.c_type.as_str()).filter(|_| field.callback.is_none()) {
            Some(container) => Some(render_template(container.copy_func, &member, &field.meta)),
            None => storage::copy_func(field.storage.as_str()).map(|f| format!("{f} ({member})")),
        };
        let value = match copied {
            Some(copied) => format!("{member} != NULL ? {copied} : NULL"),
            None => member,
        };
        lines.push(format!("  new_opts->{} = {value};", field.name));
    }
    lines.push(String::new());
    lines.push("  return new_opts;".to_string());
    lines.push("}".to_string());
    Ok(lines.join("\n"))
}

fn destructor_source(s: &OptionsStruct, names: &StructNames) -> String {
    let args = [Annotated::new("opts", names.pointer.clone())
        .transfer(Ownership::Full)
        .described(format!("The #{} to free.", s.type_name))];
    let void = TargetType::new("void");

    let mut lines = vec![
        doc_comment(&names.free, &args, None),
        prototype(&void, &names.free, [(&names.pointer, "opts")]),
        "{".to_string(),
    ];
    for field in &s.fields {
        if let Some(destroy) = storage::destroy_func(field.storage.as_str()) {
            lines.push(format!("  g_clear_pointer (&opts->{}, {destroy});", field.name));
        }
    }
    lines.push("  g_clear_pointer ((gpointer **) &opts, g_free);".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

fn indent_block(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| indent(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}
