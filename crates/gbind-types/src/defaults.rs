//! The built-in type table.

use crate::rule::{Cleanup, Conversion, TypeRule};

/// Context pattern under which the options-struct rules apply.
pub const OPTIONS_CONTEXT: &str = "*Options";

fn object(native: &str, target: &str) -> TypeRule {
    TypeRule::new(native, target)
        .with_to_native(Conversion::Call("torch_convert_to_real".into()))
        .with_to_target(Conversion::Call("torch_convert_to_gobject".into()))
        .with_cleanup(Cleanup::AutoPtr)
        .by_reference()
}

fn value_array(native: &str, element: &str) -> TypeRule {
    TypeRule::new(native, "GArray *")
        .with_element(element)
        .with_meta("type", element)
        .with_to_native(Conversion::Generic {
            func: "torch_array_ref_from_garray".into(),
            type_arg: element.into(),
        })
        .with_to_target(Conversion::Generic {
            func: "torch_new_garray_from_array_ref".into(),
            type_arg: element.into(),
        })
        .with_cleanup(Cleanup::AutoPtr)
}

fn pointer_array(native: &str, element: &str, to_native: &str, to_target: &str) -> TypeRule {
    TypeRule::new(native, "GPtrArray *")
        .with_element(element)
        .with_meta("type", element)
        .with_to_native(Conversion::Call(to_native.into()))
        .with_to_target(Conversion::Call(to_target.into()))
        .with_cleanup(Cleanup::AutoPtr)
}

fn identity(native: &str, target: &str) -> TypeRule {
    TypeRule::new(native, target)
}

/// Context-free rules for the tensor API surface.
pub fn default_rules() -> Vec<TypeRule> {
    vec![
        value_array("at::ArrayRef<double>", "double"),
        value_array("at::IntArrayRef", "long"),
        object("at::Device", "TorchDevice *"),
        object("at::Dimname", "TorchDimname *"),
        pointer_array(
            "at::DimnameList",
            "TorchDimname *",
            "torch_dimname_list_from_dimname_ptr_array",
            "torch_dimname_ptr_array_from_dimname_list",
        ),
        object("at::Generator", "TorchGenerator *"),
        TypeRule::new("at::MemoryFormat", "TorchMemoryFormat")
            .with_to_native(Conversion::Call("torch_convert_to_real".into()))
            .with_to_target(Conversion::Call("torch_convert_to_gobject".into())),
        TypeRule::new("at::Scalar", "GValue *")
            .with_to_native(Conversion::Call("torch_scalar_from_gvalue".into()))
            .with_to_target(Conversion::Call("torch_gvalue_from_scalar".into()))
            .with_cleanup(Cleanup::AutoFree),
        TypeRule::new("at::ScalarType", "GType")
            .with_to_native(Conversion::Call("torch_scalar_type_from_gtype".into()))
            .with_to_target(Conversion::Call("torch_gtype_from_scalar_type".into())),
        object("at::Storage", "TorchStorage *"),
        object("at::Tensor", "TorchTensor *"),
        pointer_array(
            "at::TensorList",
            "TorchTensor *",
            "torch_tensor_list_from_tensor_ptr_array",
            "torch_tensor_ptr_array_from_tensor_list",
        ),
        object("at::TensorOptions", "TorchTensorOptions *"),
        identity("bool", "gboolean"),
        identity("double", "double"),
        identity("int64_t", "int64_t"),
        identity("long", "long"),
        TypeRule::new("std::string", "const char *")
            .with_to_native(Conversion::Call("std::string".into()))
            .with_to_target(Conversion::Accessor {
                func: "g_strdup".into(),
                accessor: "c_str".into(),
            })
            .with_cleanup(Cleanup::AutoFree),
        TypeRule::new("c10::string_view", "const char *")
            .with_to_native(Conversion::Call("c10::string_view".into()))
            .with_to_target(Conversion::Accessor {
                func: "g_strdup".into(),
                accessor: "data".into(),
            })
            .with_cleanup(Cleanup::AutoFree),
        pointer_array(
            "c10::List<c10::optional<at::Tensor>>",
            "TorchTensor *",
            "torch_optional_tensor_list_from_tensor_ptr_array",
            "torch_tensor_ptr_array_from_optional_tensor_list",
        )
        .with_nullable_elements(),
    ]
}

/// Rules that only apply inside options structs.
///
/// Options fields are stored in plain structs, so optionals go through
/// `TorchOptionalValue` and tensors use the unwrapping accessor.
pub fn options_rules() -> Vec<TypeRule> {
    let optional_value = |native: &str, getter: &str| {
        TypeRule::new(native, "TorchOptionalValue *")
            .with_meta("type", getter)
            .with_to_native(Conversion::Template(
                "torch_optional_value_to_c10_optional ({name}, torch_optional_value_get_{meta[type]|lower})"
                    .into(),
            ))
            .with_to_target(Conversion::Call(format!("torch_optional_value_new_{getter}")))
            .with_cleanup(Cleanup::AutoPtr)
    };

    vec![
        optional_value("c10::optional<int64_t>", "int64_t"),
        optional_value("c10::optional<double>", "double"),
        optional_value("c10::optional<at::ScalarType>", "gtype"),
        TypeRule::new("at::Tensor", "TorchTensor *")
            .with_to_native(Conversion::Call("torch_tensor_get_real_tensor".into()))
            .with_to_target(Conversion::Call("torch_tensor_new_from_real_tensor".into()))
            .with_cleanup(Cleanup::AutoPtr)
            .by_reference(),
    ]
}

/// Alternative spellings of table entries.
pub fn default_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tensor", "at::Tensor"),
        ("torch::Tensor", "at::Tensor"),
        ("TensorList", "at::TensorList"),
        ("IntArrayRef", "at::IntArrayRef"),
        ("c10::IntArrayRef", "at::IntArrayRef"),
        ("Scalar", "at::Scalar"),
        ("c10::Scalar", "at::Scalar"),
        ("ScalarType", "at::ScalarType"),
        ("c10::ScalarType", "at::ScalarType"),
        ("Device", "at::Device"),
        ("c10::Device", "at::Device"),
        ("Dimname", "at::Dimname"),
        ("DimnameList", "at::DimnameList"),
        ("Generator", "at::Generator"),
        ("MemoryFormat", "at::MemoryFormat"),
        ("c10::MemoryFormat", "at::MemoryFormat"),
        ("Storage", "at::Storage"),
        ("c10::Storage", "at::Storage"),
        ("TensorOptions", "at::TensorOptions"),
        ("c10::TensorOptions", "at::TensorOptions"),
        ("::std::string", "std::string"),
        ("std::string_view", "c10::string_view"),
    ]
}
