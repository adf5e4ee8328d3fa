//! How options-struct fields are stored, copied and released.
//!
//! A field's declared C type is what constructors accept; the storage type
//! is what the struct member holds. Plain C arrays are stored in `GArray`
//! so the struct owns its own copy; callbacks are stored as
//! `TorchCallbackData`.

use crate::rule::Conversion;

/// Storage type of callback fields.
pub const CALLBACK_STORAGE: &str = "TorchCallbackData *";

/// A container a field is wrapped into when stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Storage {
    pub container: &'static str,
    pub element_type: &'static str,
    /// Wraps a constructor argument into the container.
    pub convert_func: &'static str,
    pub copy_func: &'static str,
}

const C_ARRAY_CONVERT: &str = "torch_new_g_array_from_c_array ({name}, {meta[length]})";
const G_ARRAY_COPY: &str = "g_array_copy ({name})";

/// Storage container for a declared field type, if it needs one.
pub fn storage_for(c_type: &str) -> Option<Storage> {
    let element_type = match c_type {
        "int64_t *" => "int64_t",
        "double *" => "double",
        "TorchNNNamedshapeElement *" => "TorchNNNamedshapeElement",
        _ => return None,
    };
    Some(Storage {
        container: "GArray *",
        element_type,
        convert_func: C_ARRAY_CONVERT,
        copy_func: G_ARRAY_COPY,
    })
}

/// The member type a field of `c_type` is stored as.
pub fn storage_type(c_type: &str, is_callback: bool) -> String {
    if is_callback {
        return CALLBACK_STORAGE.to_string();
    }
    match storage_for(c_type) {
        Some(storage) => storage.container.to_string(),
        None => c_type.to_string(),
    }
}

/// Function taking a new reference to a stored value.
pub fn copy_func(storage_type: &str) -> Option<&'static str> {
    match storage_type {
        "GArray *" => Some("g_array_ref"),
        "TorchTensor *" => Some("g_object_ref"),
        "TorchOptionalValue *" => Some("torch_optional_value_copy"),
        "TorchNNConvPaddingOptions *" => Some("torch_nn_conv_padding_options_copy"),
        CALLBACK_STORAGE => Some("torch_callback_data_ref"),
        _ => None,
    }
}

/// Function releasing a stored value.
pub fn destroy_func(storage_type: &str) -> Option<&'static str> {
    match storage_type {
        "GArray *" => Some("g_array_unref"),
        "TorchTensor *" => Some("g_object_unref"),
        "TorchOptionalValue *" => Some("torch_optional_value_free"),
        "TorchNNConvPaddingOptions *" => Some("torch_nn_conv_padding_options_free"),
        CALLBACK_STORAGE => Some("torch_callback_data_unref"),
        _ => None,
    }
}

/// Expression template reading the length of a container.
pub fn access_length_func(container: &str) -> Option<&'static str> {
    match container {
        "GArray *" | "GPtrArray *" => Some("{name}->len"),
        _ => None,
    }
}

/// Introspection spelling of an array element type.
pub fn introspection_type(element_type: &str) -> Option<&'static str> {
    match element_type {
        "double" => Some("gdouble"),
        "int64_t" => Some("gint64"),
        "TorchNNNamedshapeElement" => Some("TorchNNNamedshapeElement"),
        _ => None,
    }
}

/// Native → target conversion of a callback argument, keyed by its native
/// spelling.
pub fn callback_arg_conversion(cpp_type: &str) -> Conversion {
    match cpp_type {
        "torch::Tensor const &" | "const torch::Tensor &" | "const at::Tensor &" => {
            Conversion::Call("torch_tensor_new_from_real_tensor".into())
        }
        _ => Conversion::Identity,
    }
}

/// Target → native conversions of stored field values, keyed by storage type.
pub fn default_field_conversions() -> Vec<(&'static str, Conversion)> {
    let call = |f: &str| Conversion::Call(f.to_string());
    let template = |t: &str| Conversion::Template(t.to_string());
    vec![
        ("GArray *", template("torch_array_ref_from_garray <{meta[type]}> ({name})")),
        ("GPtrArray *", template("torch_list_from_gptrarray <{meta[type]}> ({name})")),
        ("TorchTensor *", call("torch_tensor_get_real_tensor")),
        (
            "TorchOptionalValue *",
            template(
                "torch_optional_value_to_c10_optional ({name}, torch_optional_value_get_{meta[type]|lower})",
            ),
        ),
        (
            "TorchNNConvPaddingOptions *",
            template("torch_nn_conv_padding_options_to_real_padding_t <{meta[dims]}> ({name})"),
        ),
        ("TorchNNConvPaddingMode", call("torch_nn_conv_padding_mode_to_real_conv_padding_mode")),
        ("TorchNNEmbeddingBagMode", call("torch_nn_embedding_bag_mode_to_real_embedding_bag_mode")),
        ("TorchNNGridSampleMode", call("torch_nn_grid_sample_mode_to_real_grid_sample_mode")),
        (
            "TorchNNGridSamplePaddingMode",
            call("torch_nn_grid_sample_padding_mode_to_real_grid_sample_padding_mode"),
        ),
        ("TorchNNInterpolateMode", call("torch_nn_interpolate_mode_to_real_interpolate_mode")),
        (
            "TorchNNAnyModuleCastable *",
            call("torch_nn_any_module_castable_to_real_any_module"),
        ),
        ("TorchNNPadMode", call("torch_nn_pad_mode_to_real_pad_mode")),
        (
            "TorchNNRNNNonlinearityType",
            call("torch_nn_rnn_nonlinearity_type_to_real_rnn_nonlinearity_type"),
        ),
        (
            "TorchNNNamedshapeType",
            template("torch_nn_namedshape_array_to_real_namedshape ({name}, {name}->len)"),
        ),
        (
            "TorchNNTransformerDecoderLayer *",
            call("torch_nn_transformer_decoder_layer_to_real_transformer_decoder_layer"),
        ),
        (
            "TorchNNTransformerEncoderLayer *",
            call("torch_nn_transformer_encoder_layer_to_real_transformer_encoder_layer"),
        ),
        ("TorchNNUpsampleMode", call("torch_nn_upsample_mode_to_real_upsample_mode")),
    ]
}
