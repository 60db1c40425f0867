//! `openapi.*` documentation options
//!
//! These carry source metadata (document info, schema facets, operation
//! details) into the Protobuf output. They are off by default and never
//! emitted for Thrift.

use super::schema::LoweringContext;
use super::types::{Operation, Schema, SchemaOrRef};
use openapi2idl_common::{IdlOption, OptionValue};
use std::collections::BTreeMap;

pub const DOCUMENT_OPTION: &str = "openapi.document";
pub const SCHEMA_OPTION: &str = "openapi.schema";
pub const OPERATION_OPTION: &str = "openapi.operation";
pub const PROPERTY_OPTION: &str = "openapi.property";

type OptionMap = BTreeMap<String, OptionValue>;

fn insert_text(map: &mut OptionMap, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        map.insert(key.to_string(), OptionValue::from(value));
    }
}

/// Facets of a schema node shared by declaration and field options
fn schema_facets(schema: &Schema) -> OptionMap {
    let mut map = OptionMap::new();
    insert_text(&mut map, "title", schema.title.as_deref());
    insert_text(&mut map, "description", schema.description.as_deref());
    insert_text(&mut map, "type", schema.type_name());
    insert_text(&mut map, "format", schema.format.as_deref());
    insert_list(&mut map, "required", &schema.required);
    if schema.deprecated {
        map.insert("deprecated".to_string(), OptionValue::Bool(true));
    }
    if schema.read_only {
        map.insert("read_only".to_string(), OptionValue::Bool(true));
    }
    if let Some(example) = &schema.example {
        let text = match example {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        map.insert("example".to_string(), OptionValue::Str(text));
    }
    map
}

fn insert_list(map: &mut OptionMap, key: &str, values: &[String]) {
    if !values.is_empty() {
        let list = values.iter().map(|v| OptionValue::from(v.as_str())).collect();
        map.insert(key.to_string(), OptionValue::List(list));
    }
}

impl LoweringContext<'_> {
    /// Whether documentation options are emitted; registers the annotations import on first use
    fn use_openapi_options(&mut self) -> bool {
        if !self.options.openapi_options {
            return false;
        }
        match self.target().openapi_import() {
            Some(import) => {
                self.registry.add_import(import);
                true
            }
            None => false,
        }
    }

    fn documentation(&mut self, name: &str, map: OptionMap) -> Option<IdlOption> {
        if map.is_empty() || !self.use_openapi_options() {
            return None;
        }
        Some(IdlOption::new(name, map))
    }

    /// File option with the document `info` block
    pub fn document_option(&mut self) -> Option<IdlOption> {
        let info = &self.spec.info;
        let mut map = OptionMap::new();
        insert_text(&mut map, "title", Some(&info.title));
        insert_text(&mut map, "version", Some(&info.version));
        insert_text(&mut map, "description", info.description.as_deref());
        insert_text(&mut map, "openapi", Some(&self.spec.openapi));
        self.documentation(DOCUMENT_OPTION, map)
    }

    /// Declaration option describing a component schema
    pub fn schema_option(&mut self, node: &SchemaOrRef) -> Option<IdlOption> {
        let map = schema_facets(node.as_schema()?);
        self.documentation(SCHEMA_OPTION, map)
    }

    /// Field option describing the schema a property, parameter, header or body was lowered from
    pub fn property_option(&mut self, node: &SchemaOrRef) -> Option<IdlOption> {
        let map = schema_facets(node.as_schema()?);
        self.documentation(PROPERTY_OPTION, map)
    }

    /// Method option with operation metadata
    pub fn operation_option(&mut self, operation: &Operation) -> Option<IdlOption> {
        let mut map = OptionMap::new();
        insert_text(&mut map, "operation_id", operation.operation_id.as_deref());
        insert_text(&mut map, "summary", operation.summary.as_deref());
        insert_text(&mut map, "description", operation.description.as_deref());
        insert_list(&mut map, "tags", &operation.tags);
        if operation.deprecated {
            map.insert("deprecated".to_string(), OptionValue::Bool(true));
        }
        self.documentation(OPERATION_OPTION, map)
    }
}
