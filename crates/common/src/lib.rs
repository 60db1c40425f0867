//! Common types and utilities for openapi2idl
//!
//! This crate contains the intermediate representation shared by the parser
//! (which lowers OpenAPI documents into it) and the generator (which renders
//! it as Protobuf or Thrift text), together with the naming policy, the
//! conversion options and the error type used across the workspace.

pub mod ir;
pub mod naming;
mod options;

pub use ir::*;
pub use naming::NamingPolicy;
pub use options::{ConvertOptions, Target};

use thiserror::Error;

/// Errors that can occur while converting a document into an IDL file
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Parse error: {0}")]
    Parse(String),

    /// A schema node has no usable type or declares an unsupported format
    #[error("schema '{name}': {message}")]
    Schema { name: String, message: String },

    /// A `$ref` string that cannot be interpreted or resolved
    #[error("Reference error: {0}")]
    Reference(String),

    /// The IR reached the serializer in a shape the target cannot express
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConvertError {
    /// Build a schema error for the node lowered under `name`
    pub fn schema(name: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Schema {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap this error with a description of where it happened
    pub fn context(self, context: impl Into<String>) -> Self {
        ConvertError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Context` layers
    pub fn root_cause(&self) -> &ConvertError {
        match self {
            ConvertError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Attach context to the error side of a [`Result`]
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
