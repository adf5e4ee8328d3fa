//! Include lists and preamble of the generated files.

use serde::{Deserialize, Serialize};

/// `[output]` settings; every list defaults to the stock torch-gobject set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub header_includes: Vec<String>,
    pub source_includes: Vec<String>,
    /// Lines following the source includes of the functions source.
    pub source_preamble: Vec<String>,
    pub options_header_includes: Vec<String>,
    pub options_source_includes: Vec<String>,
    pub introspectable_includes: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header_includes: owned(&[
                "torch-gobject/torch-allocator.h",
                "torch-gobject/torch-device.h",
                "torch-gobject/torch-dimname.h",
                "torch-gobject/torch-errors.h",
                "torch-gobject/torch-generator.h",
                "torch-gobject/torch-storage.h",
                "torch-gobject/torch-memory-format.h",
                "torch-gobject/torch-tensor.h",
                "torch-gobject/torch-tensor-options.h",
            ]),
            source_includes: owned(&[
                "torch/torch.h",
                "gio/gio.h",
                "torch-gobject/torch-allocator-internal.h",
                "torch-gobject/torch-device-internal.h",
                "torch-gobject/torch-device-type-internal.h",
                "torch-gobject/torch-dimname-internal.h",
                "torch-gobject/torch-dimname-type-internal.h",
                "torch-gobject/torch-generator-internal.h",
                "torch-gobject/torch-layout-internal.h",
                "torch-gobject/torch-memory-format-internal.h",
                "torch-gobject/torch-storage-internal.h",
                "torch-gobject/torch-tensor.h",
                "torch-gobject/torch-tensor-internal.h",
                "torch-gobject/torch-tensor-options-internal.h",
                "torch-gobject/torch-tensor-generated.h",
                "torch-gobject/torch-util.h",
            ]),
            source_preamble: owned(&[
                "template <typename T> using ArrayRef = c10::ArrayRef<T>;",
                "using IntArrayRef = c10::IntArrayRef;",
                "using Device = c10::Device;",
                "using Dimname = at::Dimname;",
                "using Generator = at::Generator;",
                "using Layout = c10::Layout;",
                "using MemoryFormat = c10::MemoryFormat;",
                "using Scalar = c10::Scalar;",
                "using ScalarType = c10::ScalarType;",
                "using Storage = c10::Storage;",
                "using Tensor = torch::Tensor;",
                "using TensorList = at::TensorList;",
                "using TensorOptions = c10::TensorOptions;",
            ]),
            options_header_includes: owned(&[
                "torch-gobject/torch-optional-value.h",
                "torch-gobject/torch-tensor.h",
                "torch-gobject/torch-callback-data.h",
                "torch-gobject/nn/torch-nn-any-module-castable.h",
                "torch-gobject/nn/torch-nn-any-module.h",
                "torch-gobject/nn/torch-nn-distance-function.h",
                "torch-gobject/nn/torch-nn-transformer-decoder-layer.h",
                "torch-gobject/nn/torch-nn-transformer-encoder-layer.h",
                "torch-gobject/nn/torch-nn-module-base.h",
                "torch-gobject/nn/options/torch-nn-conv-padding-options.h",
                "torch-gobject/nn/options/torch-nn-namedshape-element.h",
                "\"torch-enums.h\"",
            ]),
            options_source_includes: owned(&[
                "gio/gio.h",
                "torch-gobject/torch-callback-data-internal.h",
                "torch-gobject/torch-tensor.h",
                "torch-gobject/torch-tensor-internal.h",
                "torch-gobject/torch-optional-value.h",
                "torch-gobject/torch-util.h",
                "torch-gobject/nn/torch-nn-any-module-internal.h",
                "torch-gobject/nn/torch-nn-any-module-castable-internal.h",
                "torch-gobject/nn/torch-nn-transformer-decoder-layer-internal.h",
                "torch-gobject/nn/torch-nn-transformer-encoder-layer-internal.h",
                "torch-gobject/nn/options/torch-nn-options-generated.h",
                "torch-gobject/nn/options/torch-nn-conv-padding-options-internal.h",
                "torch-gobject/nn/options/torch-nn-namedshape-element-internal.h",
                "string",
                "vector",
                "stdexcept",
                "torch/nn/options.h",
                "\"torch-enums.h\"",
            ]),
            introspectable_includes: owned(&[
                "torch-gobject/torch-util.h",
                "torch-gobject/nn/options/torch-nn-options-generated.h",
            ]),
        }
    }
}

/// `#include` line for an entry; quoted or bracketed entries are kept.
pub fn include_line(entry: &str) -> String {
    if entry.starts_with('"') || entry.starts_with('<') {
        format!("#include {entry}")
    } else {
        format!("#include <{entry}>")
    }
}
