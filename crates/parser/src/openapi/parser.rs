//! OpenAPI document loader

use super::converter::{convert_openapi_to_idl, Conversion};
use super::types::OpenApiSpec;
use openapi2idl_common::{ConvertError, ConvertOptions, Result};
use std::fs;
use std::path::Path;

/// OpenAPI document parser
///
/// Loads a JSON or YAML OpenAPI 3 document and converts it into an IDL file.
pub struct OpenApiParser {
    /// Loaded OpenAPI document
    spec: OpenApiSpec,
}

impl OpenApiParser {
    /// Load an OpenAPI document from a file
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, everything else as JSON.
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_file("petstore.yaml")?;
    /// let conversion = parser.convert(&ConvertOptions::default())?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Parse(format!(
                "Failed to read OpenAPI file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        tracing::debug!(path = %path.display(), yaml = is_yaml, "loading OpenAPI document");
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse an OpenAPI document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: OpenApiSpec = serde_json::from_str(json)
            .map_err(|e| ConvertError::Parse(format!("Failed to parse OpenAPI JSON: {}", e)))?;
        Ok(Self { spec })
    }

    /// Parse an OpenAPI document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let spec: OpenApiSpec = serde_yaml::from_str(yaml)
            .map_err(|e| ConvertError::Parse(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        Ok(Self { spec })
    }

    /// Convert the document into the IR of one target IDL file
    pub fn convert(&self, options: &ConvertOptions) -> Result<Conversion> {
        convert_openapi_to_idl(&self.spec, options)
    }

    /// Get reference to the underlying OpenAPI document
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_openapi() {
        let openapi_json = r#"{
            "openapi": "3.0.0",
            "info": {
                "title": "Test API",
                "version": "1.0.0"
            },
            "paths": {}
        }"#;

        let parser = OpenApiParser::from_json(openapi_json);
        assert!(parser.is_ok());

        let parser = parser.unwrap();
        assert_eq!(parser.spec.openapi, "3.0.0");
        assert_eq!(parser.spec.info.title, "Test API");
    }

    #[test]
    fn test_parse_yaml_with_quoted_status_codes() {
        let yaml = r#"
openapi: 3.0.0
info:
  title: Test API
  version: 1.0.0
paths:
  /health:
    get:
      responses:
        '200':
          description: ok
"#;
        let parser = OpenApiParser::from_yaml(yaml).unwrap();
        let item = &parser.spec().paths["/health"];
        assert!(item.get.as_ref().unwrap().responses.contains_key("200"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = OpenApiParser::from_json("{ not json");
        assert!(matches!(result, Err(ConvertError::Parse(_))));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "openapi: 3.0.1\ninfo:\n  title: Yaml API\n  version: '2'").unwrap();

        let parser = OpenApiParser::from_file(file.path()).unwrap();
        assert_eq!(parser.spec().info.title, "Yaml API");
        assert_eq!(parser.spec().info.version, "2");
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let result = OpenApiParser::from_file("/nonexistent/openapi.json");
        match result {
            Err(ConvertError::Parse(message)) => {
                assert!(message.contains("Failed to read OpenAPI file"))
            }
            _ => panic!("expected parse error"),
        }
    }
}
