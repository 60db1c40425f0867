//! Template loading for the IDL file envelopes

use crate::encoding;
use openapi2idl_common::{ConvertError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Protobuf envelope: syntax, package, imports, file options, body
pub const PROTO_TEMPLATE: &str = "idl.proto";

/// Thrift envelope: namespaces, includes, body
pub const THRIFT_TEMPLATE: &str = "idl.thrift";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);

    tera.register_filter("quoted", quoted_filter);

    tera.add_raw_template(PROTO_TEMPLATE, include_str!("../templates/proto.tera"))
        .map_err(|e| {
            ConvertError::Serialization(format!("Failed to load {} template: {}", PROTO_TEMPLATE, e))
        })?;

    tera.add_raw_template(THRIFT_TEMPLATE, include_str!("../templates/thrift.tera"))
        .map_err(|e| {
            ConvertError::Serialization(format!("Failed to load {} template: {}", THRIFT_TEMPLATE, e))
        })?;

    Ok(tera)
}

/// Filter to render a string as a quoted, escaped literal
fn quoted_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("quoted filter expects a string"))?;

    Ok(Value::String(encoding::quote(s)))
}
