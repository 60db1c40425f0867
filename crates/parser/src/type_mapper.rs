//! Type mapping from OpenAPI primitive types to IR scalars

use openapi2idl_common::{ConvertError, Result, Scalar};

/// Maps an OpenAPI `type`/`format` pair to a [`Scalar`]
pub struct TypeMapper;

impl TypeMapper {
    /// Map a primitive schema type to a scalar
    ///
    /// Returns `Ok(None)` when `schema_type` is not a primitive (array,
    /// object). `name` is only used to locate errors.
    ///
    /// # Examples
    /// ```
    /// use openapi2idl_parser::TypeMapper;
    /// use openapi2idl_common::Scalar;
    ///
    /// assert_eq!(TypeMapper::map_scalar("x", "string", Some("date-time")).unwrap(), Some(Scalar::Timestamp));
    /// assert_eq!(TypeMapper::map_scalar("x", "integer", None).unwrap(), Some(Scalar::Int64));
    /// assert_eq!(TypeMapper::map_scalar("x", "number", Some("float")).unwrap(), Some(Scalar::Float));
    /// assert!(TypeMapper::map_scalar("x", "integer", Some("uuid")).is_err());
    /// ```
    pub fn map_scalar(name: &str, schema_type: &str, format: Option<&str>) -> Result<Option<Scalar>> {
        let scalar = match schema_type {
            "string" => match format {
                Some("date") | Some("date-time") => Scalar::Timestamp,
                Some("byte") | Some("binary") => Scalar::Bytes,
                // uuid, email, uri, password ... stay plain strings
                _ => Scalar::String,
            },
            "integer" => match format {
                Some("int32") => Scalar::Int32,
                None | Some("int64") => Scalar::Int64,
                Some(other) => return Err(Self::unsupported(name, schema_type, other)),
            },
            "number" => match format {
                Some("float") => Scalar::Float,
                None | Some("double") => Scalar::Double,
                Some(other) => return Err(Self::unsupported(name, schema_type, other)),
            },
            "boolean" => Scalar::Bool,
            _ => return Ok(None),
        };
        Ok(Some(scalar))
    }

    /// Whether `schema_type` can carry an `enum` list that becomes an IDL enum
    pub fn is_enumerable(schema_type: Option<&str>) -> bool {
        matches!(schema_type, None | Some("string") | Some("integer") | Some("number"))
    }

    fn unsupported(name: &str, schema_type: &str, format: &str) -> ConvertError {
        ConvertError::schema(
            name,
            format!("unsupported format '{}' for type '{}'", format, schema_type),
        )
    }
}
