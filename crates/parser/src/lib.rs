//! OpenAPI document lowering
//!
//! This crate turns an OpenAPI 3 document into the target-neutral IR defined
//! in `openapi2idl-common`.
//!
//! ## Lowering Strategy
//!
//! - Component schemas are lowered first, in document order
//! - Paths are visited in document order, verbs in a fixed order
//!   (get, put, post, delete, options, head, patch, trace)
//! - Every synthesized declaration goes through the [`DeclarationRegistry`],
//!   which merges structs by field name and reports conflicting enums/unions
//!
//! Nested declarations stay inside their owning struct for Protobuf and are
//! hoisted to the top level for Thrift.

pub mod openapi;
mod operation_mapper;
mod registry;
mod type_mapper;

pub use openapi::{Conversion, OpenApiParser};
pub use operation_mapper::{
    body_option_key, operations, parameter_option_key, response_option_key, HttpVerb,
    HEADER_OPTION,
};
pub use registry::DeclarationRegistry;
pub use type_mapper::TypeMapper;

use openapi2idl_common::{ConvertOptions, Result};
use std::path::Path;

/// Load an OpenAPI document and convert it in one step
///
/// # Arguments
/// * `path` - JSON or YAML OpenAPI document
/// * `options` - Target and emission options
///
/// # Returns
/// * `Conversion` - The IR file plus any name collisions
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Conversion> {
    OpenApiParser::from_file(path)?.convert(options)
}
