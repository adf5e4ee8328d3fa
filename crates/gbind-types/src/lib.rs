//! Native type shapes and the native → target type mapping registry.
//!
//! ## Modules
//!
//! - [`native`]: native type spelling canonicalization and shape parsing
//! - [`target`]: target ABI type spellings
//! - [`rule`]: type rules, conversions, ownership and cleanup classes
//! - [`mapper`]: the context-aware [`TypeMapper`] registry
//! - [`defaults`]: the built-in rule table
//! - [`storage`]: options-struct storage, copy and destroy tables
//! - [`naming`]: identifier case conversion

pub mod defaults;
pub mod error;
pub mod mapper;
pub mod naming;
pub mod native;
pub mod rule;
pub mod storage;
pub mod target;

pub use error::MapError;
pub use mapper::{ContextPattern, TypeMapper};
pub use native::NativeType;
pub use rule::{ArrayLength, Cleanup, Conversion, Meta, Ownership, TypeRule};
pub use target::TargetType;
