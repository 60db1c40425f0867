//! OpenAPI 3 document types
//!
//! Only the parts of the document that influence the generated IDL are
//! modelled. Maps use `IndexMap` so that lowering visits paths, properties and
//! responses in document order.

use indexmap::IndexMap;
use openapi2idl_common::{ConvertError, Result};
use serde::{Deserialize, Serialize};

/// OpenAPI document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    #[serde(default)]
    pub openapi: String,

    /// API metadata
    pub info: Info,

    /// API paths (endpoints)
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Tag descriptions
    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Remaining keys, including `x-*` extensions
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    /// API title
    #[serde(default)]
    pub title: String,

    /// API version
    #[serde(default)]
    pub version: String,

    /// API description
    #[serde(default)]
    pub description: Option<String>,

    /// Remaining keys, including `x-*` extensions
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Top-level tag entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default)]
    pub parameters: Vec<ObjectOrRef<Parameter>>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(rename = "operationId")]
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ObjectOrRef<Parameter>>,

    #[serde(rename = "requestBody")]
    #[serde(default)]
    pub request_body: Option<ObjectOrRef<RequestBody>>,

    /// Responses keyed by status code (or `default`)
    #[serde(default)]
    pub responses: IndexMap<String, ObjectOrRef<Response>>,

    /// Tags (for grouping)
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,
}

/// Parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<SchemaOrRef>,
}

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    /// Content types
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub headers: IndexMap<String, ObjectOrRef<Header>>,

    /// Content types
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Response header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<SchemaOrRef>,
}

/// Media type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<SchemaOrRef>,
}

/// An inline object or a `$ref` to a reusable component
///
/// The reference variant is listed first: the object types accept any map,
/// so a bare `{"$ref": ...}` would otherwise deserialize as an empty object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectOrRef<T> {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Object(T),
}

/// Schema or reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    /// Reference to schema
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },

    /// Direct schema
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Reference { .. } => None,
        }
    }
}

/// `type` as a single name or, in OpenAPI 3.1, a list such as `["string", "null"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The first type that is not `null`
    pub fn primary(&self) -> Option<&str> {
        match self {
            SchemaType::Single(t) => Some(t.as_str()).filter(|t| *t != "null"),
            SchemaType::Multiple(types) => {
                types.iter().map(String::as_str).find(|t| *t != "null")
            }
        }
    }
}

/// `additionalProperties`: either a flag or a value schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(SchemaOrRef),
}

/// Schema definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Type: string, number, integer, boolean, array, object
    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<SchemaType>,

    /// Format (e.g., int32, int64, date-time)
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Properties (for object type)
    #[serde(default)]
    pub properties: IndexMap<String, SchemaOrRef>,

    /// Required properties
    #[serde(default)]
    pub required: Vec<String>,

    /// Items schema (for array type)
    #[serde(default)]
    pub items: Option<Box<SchemaOrRef>>,

    #[serde(rename = "additionalProperties")]
    #[serde(default)]
    pub additional_properties: Option<AdditionalProperties>,

    /// Enum values
    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "oneOf")]
    #[serde(default)]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf")]
    #[serde(default)]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(rename = "allOf")]
    #[serde(default)]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(rename = "readOnly")]
    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

impl Schema {
    /// Primary type name, ignoring `null`
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }
}

/// Reusable components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default)]
    pub parameters: IndexMap<String, ObjectOrRef<Parameter>>,

    #[serde(rename = "requestBodies")]
    #[serde(default)]
    pub request_bodies: IndexMap<String, ObjectOrRef<RequestBody>>,

    #[serde(default)]
    pub responses: IndexMap<String, ObjectOrRef<Response>>,

    #[serde(default)]
    pub headers: IndexMap<String, ObjectOrRef<Header>>,
}

/// Longest `$ref` chain followed before giving up
const MAX_REF_DEPTH: usize = 32;

/// Name a local reference points at: the segment after the last `/`
///
/// ```
/// use openapi2idl_parser::openapi::ref_name;
///
/// assert_eq!(ref_name("#/components/schemas/Pet").unwrap(), "Pet");
/// assert!(ref_name("Pet").is_err());
/// ```
pub fn ref_name(ref_path: &str) -> Result<&str> {
    let malformed = || ConvertError::Reference(format!("malformed reference '{}'", ref_path));
    if !ref_path.starts_with("#/") {
        return Err(malformed());
    }
    match ref_path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(malformed()),
    }
}

fn lookup<'a, T>(
    section: &'a IndexMap<String, ObjectOrRef<T>>,
    prefix: &str,
    ref_path: &str,
) -> Result<&'a T> {
    let mut current = ref_path;
    for _ in 0..MAX_REF_DEPTH {
        ref_name(current)?;
        let name = current.strip_prefix(prefix).ok_or_else(|| {
            ConvertError::Reference(format!("'{}' does not point into {}", current, prefix))
        })?;
        match section.get(name) {
            Some(ObjectOrRef::Object(object)) => return Ok(object),
            Some(ObjectOrRef::Reference { ref_path }) => current = ref_path,
            None => {
                return Err(ConvertError::Reference(format!(
                    "unresolved reference '{}'",
                    current
                )))
            }
        }
    }
    Err(ConvertError::Reference(format!(
        "reference chain starting at '{}' is too deep",
        ref_path
    )))
}

impl OpenApiSpec {
    fn components(&self) -> &Components {
        static EMPTY: std::sync::OnceLock<Components> = std::sync::OnceLock::new();
        self.components
            .as_ref()
            .unwrap_or_else(|| EMPTY.get_or_init(Components::default))
    }

    /// Get a schema by reference path, following reference chains
    /// e.g., "#/components/schemas/Pet" -> returns the Pet schema
    pub fn resolve_schema_ref(&self, ref_path: &str) -> Option<&Schema> {
        let mut current = ref_path;
        for _ in 0..MAX_REF_DEPTH {
            let name = current.strip_prefix("#/components/schemas/")?;
            match self.components().schemas.get(name)? {
                SchemaOrRef::Schema(schema) => return Some(schema),
                SchemaOrRef::Reference { ref_path } => current = ref_path,
            }
        }
        None
    }

    pub fn resolve_parameter<'a>(&'a self, param: &'a ObjectOrRef<Parameter>) -> Result<&'a Parameter> {
        match param {
            ObjectOrRef::Object(p) => Ok(p),
            ObjectOrRef::Reference { ref_path } => {
                lookup(&self.components().parameters, "#/components/parameters/", ref_path)
            }
        }
    }

    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a ObjectOrRef<RequestBody>,
    ) -> Result<&'a RequestBody> {
        match body {
            ObjectOrRef::Object(b) => Ok(b),
            ObjectOrRef::Reference { ref_path } => lookup(
                &self.components().request_bodies,
                "#/components/requestBodies/",
                ref_path,
            ),
        }
    }

    pub fn resolve_response<'a>(&'a self, response: &'a ObjectOrRef<Response>) -> Result<&'a Response> {
        match response {
            ObjectOrRef::Object(r) => Ok(r),
            ObjectOrRef::Reference { ref_path } => {
                lookup(&self.components().responses, "#/components/responses/", ref_path)
            }
        }
    }

    pub fn resolve_header<'a>(&'a self, header: &'a ObjectOrRef<Header>) -> Result<&'a Header> {
        match header {
            ObjectOrRef::Object(h) => Ok(h),
            ObjectOrRef::Reference { ref_path } => {
                lookup(&self.components().headers, "#/components/headers/", ref_path)
            }
        }
    }

    /// Description of a top-level tag
    pub fn tag_description(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.description.as_deref())
    }

    /// `x-options` entries from the document root, then from `info`
    ///
    /// Non-string values are rendered as JSON text.
    pub fn x_options(&self) -> Vec<(String, String)> {
        [&self.extensions, &self.info.extensions]
            .into_iter()
            .filter_map(|extensions| extensions.get("x-options"))
            .filter_map(serde_json::Value::as_object)
            .flat_map(|map| {
                map.iter().map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_variant_wins_over_empty_schema() {
        let parsed: SchemaOrRef =
            serde_json::from_str(r##"{"$ref": "#/components/schemas/Pet"}"##).unwrap();
        assert!(matches!(parsed, SchemaOrRef::Reference { ref_path } if ref_path == "#/components/schemas/Pet"));

        let parsed: ObjectOrRef<Response> =
            serde_json::from_str(r##"{"$ref": "#/components/responses/NotFound"}"##).unwrap();
        assert!(matches!(parsed, ObjectOrRef::Reference { .. }));
    }

    #[test]
    fn test_schema_type_primary_skips_null() {
        let schema: Schema = serde_json::from_str(r#"{"type": ["null", "string"]}"#).unwrap();
        assert_eq!(schema.type_name(), Some("string"));

        let schema: Schema = serde_json::from_str(r#"{"type": "null"}"#).unwrap();
        assert_eq!(schema.type_name(), None);
    }

    #[test]
    fn test_additional_properties_forms() {
        let schema: Schema =
            serde_json::from_str(r#"{"type": "object", "additionalProperties": true}"#).unwrap();
        assert!(matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Allowed(true))
        ));

        let schema: Schema = serde_json::from_str(
            r#"{"type": "object", "additionalProperties": {"type": "integer"}}"#,
        )
        .unwrap();
        assert!(matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Schema(SchemaOrRef::Schema(_)))
        ));
    }

    #[test]
    fn test_ref_name() {
        assert_eq!(ref_name("#/components/schemas/Order").unwrap(), "Order");
        assert!(matches!(ref_name(""), Err(ConvertError::Reference(_))));
        assert!(matches!(ref_name("#/components/schemas/"), Err(ConvertError::Reference(_))));
        assert!(matches!(ref_name("other.json#/Pet"), Err(ConvertError::Reference(_))));
    }

    #[test]
    fn test_resolve_chained_schema_and_response() {
        let spec: OpenApiSpec = serde_json::from_str(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "t", "version": "1"},
                "components": {
                    "schemas": {
                        "Alias": {"$ref": "#/components/schemas/Pet"},
                        "Pet": {"type": "object"}
                    },
                    "responses": {
                        "NotFound": {"description": "missing"}
                    }
                }
            }"##,
        )
        .unwrap();

        let pet = spec.resolve_schema_ref("#/components/schemas/Alias").unwrap();
        assert_eq!(pet.type_name(), Some("object"));
        assert!(spec.resolve_schema_ref("#/components/schemas/Missing").is_none());

        let reference = ObjectOrRef::Reference {
            ref_path: "#/components/responses/NotFound".to_string(),
        };
        assert_eq!(spec.resolve_response(&reference).unwrap().description, "missing");

        let dangling = ObjectOrRef::<Response>::Reference {
            ref_path: "#/components/responses/Gone".to_string(),
        };
        assert!(matches!(spec.resolve_response(&dangling), Err(ConvertError::Reference(_))));
    }

    #[test]
    fn test_x_options_root_then_info() {
        let spec: OpenApiSpec = serde_json::from_str(
            r#"{
                "openapi": "3.0.0",
                "x-options": {"go_package": "example.com/pets"},
                "info": {
                    "title": "Pets",
                    "version": "1",
                    "x-options": {"java_multiple_files": true}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            spec.x_options(),
            vec![
                ("go_package".to_string(), "example.com/pets".to_string()),
                ("java_multiple_files".to_string(), "true".to_string()),
            ]
        );
    }
}
