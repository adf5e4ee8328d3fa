//! Declaration extraction for the binding generator.
//!
//! ## Modules
//!
//! - [`decl`]: raw declaration records
//! - [`feed`]: projection of the structured declarations feed
//! - [`header`]: options-struct scanning of header text
//! - [`defs`]: JSON options definitions

pub mod decl;
pub mod defs;
pub mod error;
pub mod feed;
pub mod header;

pub use decl::{
    AliasDecl, ArgumentDecl, ConstructorParam, FunctionDecl, OptionArgDecl, OptionsStructDecl,
    RawDeclaration, ReturnDecl, VariantDecl,
};
pub use defs::{CallbackArgDef, CppConstructor, LengthSpec, OptionDef, OptionMeta, OptionsDefinition};
pub use error::ExtractError;
pub use feed::{load_feed, parse_feed};
pub use header::{load_header, scan, HeaderScanner, ScannerConfig};
