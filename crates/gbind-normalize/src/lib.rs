//! Normalization of raw declarations into bindable shapes.
//!
//! Function declarations become [`CanonicalSignature`]s (or skip records);
//! options definitions become [`OptionsStruct`]s with inheritance resolved.
//!
//! ## Modules
//!
//! - [`config`]: naming, skip, namespace and receiver settings
//! - [`skip`]: skip policy and the skip manifest
//! - [`scalar`]: expansion of generic scalar arguments
//! - [`naming`]: bindable function names
//! - [`signature`]: canonical signatures and the return channel
//! - [`function`]: per-declaration and per-feed function normalization
//! - [`options`]: options structs and generated enums
//! - [`inherit`]: options-struct inheritance

pub mod config;
pub mod error;
pub mod function;
pub mod inherit;
pub mod naming;
pub mod options;
pub mod scalar;
pub mod signature;
pub mod skip;

pub use config::NormalizeConfig;
pub use error::NormalizeError;
pub use function::{normalize_function, normalize_functions, FunctionUnit, Normalized};
pub use options::{
    normalize_definitions, normalize_header, GeneratedEnum, OptionField, OptionsStruct, OptionsUnit,
};
pub use signature::{CanonicalSignature, ReturnChannel};
pub use skip::{SkipManifest, SkipReason, SkipRecord};
