//! Conversion options and target selection
//!
//! Options can be built in code, or loaded from a YAML file such as:
//!
//! ```yaml
//! target: thrift
//! naming: true
//! api_options: true
//! openapi_options: false
//! package: petstore
//! ```

use crate::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Output IDL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Protocol Buffers, proto3 syntax
    #[default]
    Proto,
    /// Apache Thrift
    Thrift,
}

impl Target {
    /// Whether synthesized declarations are nested inside their owning struct
    pub fn nests_declarations(self) -> bool {
        matches!(self, Target::Proto)
    }

    /// Type used when a request or response carries nothing
    ///
    /// Thrift expresses an empty request as a method without arguments, so
    /// only the response side has a name there.
    pub fn empty_request(self) -> Option<&'static str> {
        match self {
            Target::Proto => Some("google.protobuf.Empty"),
            Target::Thrift => None,
        }
    }

    pub fn empty_response(self) -> &'static str {
        match self {
            Target::Proto => "google.protobuf.Empty",
            Target::Thrift => "void",
        }
    }

    /// Import that must accompany the empty type
    pub fn empty_import(self) -> Option<&'static str> {
        match self {
            Target::Proto => Some("google/protobuf/empty.proto"),
            Target::Thrift => None,
        }
    }

    /// Import defining the `api.*` binding options
    pub fn api_import(self) -> Option<&'static str> {
        match self {
            Target::Proto => Some("api.proto"),
            Target::Thrift => None,
        }
    }

    pub fn timestamp_import(self) -> Option<&'static str> {
        match self {
            Target::Proto => Some("google/protobuf/timestamp.proto"),
            Target::Thrift => None,
        }
    }

    /// Import defining the `openapi.*` documentation options
    pub fn openapi_import(self) -> Option<&'static str> {
        match self {
            Target::Proto => Some("openapi/annotations.proto"),
            Target::Thrift => None,
        }
    }

    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            Target::Proto => "proto",
            Target::Thrift => "thrift",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Proto => write!(f, "Protobuf"),
            Target::Thrift => write!(f, "Thrift"),
        }
    }
}

/// Options controlling one conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub target: Target,
    /// Apply the naming convention (PascalCase types, snake_case fields)
    pub naming: bool,
    /// Emit `api.*` HTTP binding options
    pub api_options: bool,
    /// Emit `openapi.*` documentation options (Protobuf only)
    pub openapi_options: bool,
    /// Package name; derived from `info.title` when unset
    pub package: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target: Target::Proto,
            naming: true,
            api_options: true,
            openapi_options: false,
            package: None,
        }
    }
}

impl ConvertOptions {
    pub fn for_target(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Load options from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Parse(format!("Failed to read options file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            ConvertError::Parse(format!("Failed to parse options YAML from {:?}: {}", path, e))
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
