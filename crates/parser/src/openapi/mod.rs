//! OpenAPI 3 front end
//!
//! Loads OpenAPI 3 documents (JSON or YAML) and lowers them into the IDL IR.
//!
//! ## Pipeline
//! 1. [`OpenApiParser`] deserializes the document into [`OpenApiSpec`].
//! 2. Component schemas are lowered by [`LoweringContext::lower`].
//! 3. Every operation becomes a service method with request and response
//!    declarations.
//! 4. The registry is assembled into an [`IdlFile`](openapi2idl_common::IdlFile).
//!
//! ## Usage
//! ```rust,ignore
//! use openapi2idl_common::ConvertOptions;
//! use openapi2idl_parser::openapi::OpenApiParser;
//!
//! let parser = OpenApiParser::from_file("petstore.json")?;
//! let conversion = parser.convert(&ConvertOptions::default())?;
//! ```

mod converter;
mod documentation;
mod operation;
mod parser;
mod schema;
mod types;

pub use converter::{convert_openapi_to_idl, Conversion, DEFAULT_PACKAGE};
pub use documentation::{DOCUMENT_OPTION, OPERATION_OPTION, PROPERTY_OPTION, SCHEMA_OPTION};
pub use operation::DEFAULT_SERVICE;
pub use parser::OpenApiParser;
pub use schema::{Lowered, LoweringContext};
pub use types::*;
