//! C header and marshalling source emission.
//!
//! Canonical signatures become prototypes and try/catch-wrapped bodies;
//! options structs become boxed types with a converter back to the native
//! options object.
//!
//! ## Modules
//!
//! - [`annotation`]: documentation blocks and prototypes
//! - [`function`]: one function's prototype, documentation and body
//! - [`options`]: generated enums and options structs
//! - [`config`]: include lists and preamble
//! - [`writer`]: whole-file assembly

pub mod annotation;
pub mod config;
pub mod error;
pub mod function;
pub mod options;
pub mod writer;

pub use config::OutputConfig;
pub use error::EmitError;
pub use function::{emit, EmittedFunction};
pub use writer::{functions_header, functions_source, introspectable_source, options_header, options_source};
