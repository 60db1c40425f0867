//! Schema lowering: OpenAPI schema nodes into IR declarations
//!
//! [`LoweringContext::lower`] turns one schema node into a [`Lowered`] value.
//! Primitives and references become fields; objects, combinators and
//! enumerations become declarations that the caller attaches either to the
//! owning struct (Protobuf nesting) or to the registry.

use super::types::{ref_name, AdditionalProperties, OpenApiSpec, Schema, SchemaOrRef};
use crate::registry::DeclarationRegistry;
use crate::type_mapper::TypeMapper;
use openapi2idl_common::naming::sanitize;
use openapi2idl_common::{
    ConvertError, ConvertOptions, Declaration, Enum, EnumLiteral, EnumValue, Field, FieldType,
    NamingPolicy, Result, ResultExt, Scalar, Struct, Target, Union,
};

/// Result of lowering one schema node
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Field(Field),
    Struct(Struct),
    Enum(Enum),
    Union(Union),
}

impl Lowered {
    /// Split into a declaration, or give back the plain field
    pub fn into_declaration(self) -> std::result::Result<Declaration, Field> {
        match self {
            Lowered::Field(field) => Err(field),
            Lowered::Struct(s) => Ok(Declaration::Struct(s)),
            Lowered::Enum(e) => Ok(Declaration::Enum(e)),
            Lowered::Union(u) => Ok(Declaration::Union(u)),
        }
    }
}

/// State shared by every lowering step of one conversion run
pub struct LoweringContext<'a> {
    pub(crate) spec: &'a OpenApiSpec,
    pub(crate) registry: DeclarationRegistry,
    pub(crate) options: ConvertOptions,
    pub(crate) naming: NamingPolicy,
    /// Component names currently being flattened into an `allOf`
    composing: Vec<String>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(spec: &'a OpenApiSpec, options: &ConvertOptions) -> Self {
        Self {
            spec,
            registry: DeclarationRegistry::new(),
            options: options.clone(),
            naming: NamingPolicy::new(options.naming),
            composing: Vec::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.options.target
    }

    pub fn naming(&self) -> NamingPolicy {
        self.naming
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> DeclarationRegistry {
        self.registry
    }

    /// Lower one schema node under `proposed`, optionally inside `parent`
    pub fn lower(
        &mut self,
        node: &SchemaOrRef,
        proposed: &str,
        parent: Option<&mut Struct>,
    ) -> Result<Lowered> {
        match node {
            SchemaOrRef::Reference { ref_path } => self.lower_reference(ref_path).map(Lowered::Field),
            SchemaOrRef::Schema(schema) => self.lower_schema(schema, proposed, parent),
        }
    }

    /// References are never followed here, which keeps recursive schemas finite
    fn lower_reference(&self, ref_path: &str) -> Result<Field> {
        let name = ref_name(ref_path)?;
        Ok(Field::new(
            self.naming.field_name(name),
            FieldType::named(self.naming.type_name(name)),
        ))
    }

    pub fn lower_schema(
        &mut self,
        schema: &Schema,
        proposed: &str,
        mut parent: Option<&mut Struct>,
    ) -> Result<Lowered> {
        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            let branches: Vec<&SchemaOrRef> =
                schema.one_of.iter().chain(schema.any_of.iter()).collect();
            return self
                .lower_union(schema, &branches, proposed, parent)
                .map(Lowered::Union);
        }

        if !schema.all_of.is_empty() {
            return self
                .lower_all_of(schema, proposed, parent)
                .map(Lowered::Struct);
        }

        let schema_type = schema.type_name();
        if TypeMapper::is_enumerable(schema_type) && schema.enum_values.iter().any(|v| !v.is_null()) {
            let parent_name = parent.as_deref().map(|p| p.name.as_str());
            return Ok(Lowered::Enum(self.lower_enum(schema, proposed, parent_name)));
        }

        match schema_type {
            Some("array") => self.lower_array(schema, proposed, parent).map(Lowered::Field),
            Some("object") => self.lower_object(schema, proposed, parent).map(Lowered::Struct),
            Some(other) => {
                let scalar = TypeMapper::map_scalar(proposed, other, schema.format.as_deref())?
                    .ok_or_else(|| {
                        ConvertError::schema(proposed, format!("unknown schema type '{}'", other))
                    })?;
                Ok(Lowered::Field(self.scalar_field(schema, proposed, scalar)))
            }
            None if !schema.properties.is_empty() || schema.additional_properties.is_some() => {
                self.lower_object(schema, proposed, parent.as_deref_mut())
                    .map(Lowered::Struct)
            }
            None => Err(ConvertError::schema(proposed, "schema type is required")),
        }
    }

    fn scalar_field(&mut self, schema: &Schema, proposed: &str, scalar: Scalar) -> Field {
        if scalar == Scalar::Timestamp {
            if let Some(import) = self.target().timestamp_import() {
                self.registry.add_import(import);
            }
        }
        let mut field = Field::new(self.naming.field_name(proposed), FieldType::Scalar(scalar));
        field.description = schema.description.clone();
        field
    }

    fn compose_name(&self, parent: Option<&Struct>, proposed: &str) -> String {
        self.naming.compose(parent.map(|p| p.name.as_str()), proposed)
    }

    /// Place a synthesized declaration: nested in `parent` for targets that
    /// nest, otherwise in the registry
    pub fn attach(&mut self, declaration: Declaration, parent: Option<&mut Struct>) {
        match parent {
            Some(parent) if self.target().nests_declarations() => {
                let collisions = parent.add_nested(declaration);
                self.registry.record_collisions(collisions);
            }
            _ => self.registry.register(declaration),
        }
    }

    /// Turn a lowering result into a field named `name`, attaching any declaration
    pub fn make_field(&mut self, lowered: Lowered, name: String, parent: Option<&mut Struct>) -> Field {
        match lowered.into_declaration() {
            Ok(declaration) => {
                let field = Field::new(name, FieldType::named(declaration.name()));
                self.attach(declaration, parent);
                field
            }
            Err(mut field) => {
                field.name = name;
                field
            }
        }
    }

    /// Protobuf cannot nest repetition directly: move the repeated field into
    /// a single-field wrapper message and return a field referencing it
    fn wrap_repeated(&mut self, field: Field, wrapper_name: String, parent: Option<&mut Struct>) -> Field {
        let mut inner = Field::new(self.naming.field_name("items"), field.ty);
        inner.repeated = true;

        let mut wrapper = Struct::new(wrapper_name.clone());
        wrapper.add_field(inner);
        self.attach(Declaration::Struct(wrapper), parent);

        Field {
            name: field.name,
            ty: FieldType::Named(wrapper_name),
            repeated: false,
            optional: field.optional,
            description: field.description,
            options: field.options,
        }
    }

    /// Element type for a value that may itself be repeated
    fn element_type(&mut self, field: Field, synthesized: &str, parent: Option<&mut Struct>) -> FieldType {
        if !field.repeated {
            return field.ty;
        }
        match self.target() {
            Target::Thrift => FieldType::List(Box::new(field.ty)),
            Target::Proto => {
                let wrapper_name = self.compose_name(parent.as_deref(), &format!("{}Wrapper", synthesized));
                self.wrap_repeated(field, wrapper_name, parent).ty
            }
        }
    }

    fn lower_union(
        &mut self,
        schema: &Schema,
        branches: &[&SchemaOrRef],
        proposed: &str,
        mut parent: Option<&mut Struct>,
    ) -> Result<Union> {
        let mut union = Union {
            name: self.compose_name(parent.as_deref(), proposed),
            description: schema.description.clone(),
            fields: Vec::new(),
            options: Vec::new(),
        };

        for (k, branch) in branches.iter().enumerate() {
            let branch_name = format!("{}Option{}", proposed, k + 1);
            let lowered = self
                .lower(branch, &branch_name, parent.as_deref_mut())
                .with_context(|| format!("oneOf branch {} of '{}'", k + 1, proposed))?;

            let mut field = match lowered.into_declaration() {
                Ok(declaration) => {
                    let field = Field::new(
                        format!("{}Field", declaration.name()),
                        FieldType::named(declaration.name()),
                    );
                    self.attach(declaration, parent.as_deref_mut());
                    field
                }
                Err(field) => field,
            };

            if field.repeated && self.target() == Target::Proto {
                let wrapper_name =
                    self.compose_name(parent.as_deref(), &format!("{}Wrapper", branch_name));
                field = self.wrap_repeated(field, wrapper_name, parent.as_deref_mut());
            }
            field.optional = false;

            if union.fields.iter().all(|f| f.name != field.name) {
                union.fields.push(field);
            }
        }

        Ok(union)
    }

    fn lower_all_of(
        &mut self,
        schema: &Schema,
        proposed: &str,
        mut parent: Option<&mut Struct>,
    ) -> Result<Struct> {
        let mut composed = Struct::new(self.compose_name(parent.as_deref(), proposed));
        composed.description = schema.description.clone();

        for (k, part) in schema.all_of.iter().enumerate() {
            let part_name = format!("{}Part{}", proposed, k + 1);
            let lowered = match part {
                SchemaOrRef::Reference { ref_path } => self
                    .flatten_reference(ref_path)
                    .with_context(|| format!("allOf part {} of '{}'", k + 1, proposed))?,
                SchemaOrRef::Schema(inline) => self
                    .lower_schema(inline, &part_name, parent.as_deref_mut())
                    .with_context(|| format!("allOf part {} of '{}'", k + 1, proposed))?,
            };

            match lowered {
                Lowered::Struct(part) => {
                    for field in part.fields {
                        composed.add_field(field);
                    }
                    for nested in part.nested {
                        let collisions = composed.add_nested(nested);
                        self.registry.record_collisions(collisions);
                    }
                }
                Lowered::Field(field) => {
                    composed.add_field(field);
                }
                other => {
                    if let Ok(declaration) = other.into_declaration() {
                        let field = Field::new(
                            format!("{}Field", declaration.name()),
                            FieldType::named(declaration.name()),
                        );
                        self.attach(declaration, Some(&mut composed));
                        composed.add_field(field);
                    }
                }
            }
        }

        // Properties declared next to allOf form a trailing part
        self.fill_object(schema, proposed, parent, &mut composed)?;
        Ok(composed)
    }

    /// Resolve an allOf reference and lower its target for flattening
    fn flatten_reference(&mut self, ref_path: &str) -> Result<Lowered> {
        let name = ref_name(ref_path)?;
        let spec = self.spec;
        let Some(target) = spec.resolve_schema_ref(ref_path) else {
            return self.lower_reference(ref_path).map(Lowered::Field);
        };

        if self.composing.iter().any(|n| n == name) {
            let chain = self.composing.join(" -> ");
            return Err(ConvertError::schema(
                name,
                format!("cyclic allOf composition: {} -> {}", chain, name),
            ));
        }

        self.composing.push(name.to_string());
        let result = self.lower_schema(target, name, None);
        self.composing.pop();
        result
    }

    fn lower_enum(&mut self, schema: &Schema, proposed: &str, parent: Option<&str>) -> Enum {
        let name = self.naming.compose(parent, proposed);

        let values = schema
            .enum_values
            .iter()
            .filter(|v| !v.is_null())
            .enumerate()
            .map(|(index, raw)| {
                let value = match raw {
                    serde_json::Value::String(s) => EnumLiteral::Str(s.clone()),
                    serde_json::Value::Bool(b) => EnumLiteral::Bool(*b),
                    serde_json::Value::Number(n) => match n.as_i64() {
                        Some(i) => EnumLiteral::Int(i),
                        None => EnumLiteral::Float(n.as_f64().unwrap_or(f64::NAN)),
                    },
                    other => EnumLiteral::Str(other.to_string()),
                };
                EnumValue {
                    index,
                    name: enum_value_name(&name, &value),
                    value,
                }
            })
            .collect();

        Enum {
            name,
            description: schema.description.clone(),
            values,
            options: Vec::new(),
        }
    }

    fn lower_array(
        &mut self,
        schema: &Schema,
        proposed: &str,
        mut parent: Option<&mut Struct>,
    ) -> Result<Field> {
        let items = schema
            .items
            .as_deref()
            .ok_or_else(|| ConvertError::schema(proposed, "array schema requires 'items'"))?;

        let item_name = format!("{}Item", proposed);
        let lowered = self.lower(items, &item_name, parent.as_deref_mut())?;
        let item = self.make_field(lowered, String::new(), parent.as_deref_mut());
        let ty = self.element_type(item, &item_name, parent);

        let mut field = Field::new(self.naming.field_name(proposed), ty);
        field.repeated = true;
        field.description = schema.description.clone();
        Ok(field)
    }

    fn lower_object(
        &mut self,
        schema: &Schema,
        proposed: &str,
        parent: Option<&mut Struct>,
    ) -> Result<Struct> {
        let mut object = Struct::new(self.compose_name(parent.as_deref(), proposed));
        object.description = schema.description.clone();
        self.fill_object(schema, proposed, parent, &mut object)?;
        Ok(object)
    }

    /// Add the fields for `properties` and `additionalProperties` to `object`
    fn fill_object(
        &mut self,
        schema: &Schema,
        proposed: &str,
        outer: Option<&mut Struct>,
        object: &mut Struct,
    ) -> Result<()> {
        for (property, node) in &schema.properties {
            let lowered = self
                .lower(node, property, Some(&mut *object))
                .with_context(|| format!("property '{}'", property))?;

            let name = self.naming.field_name(property);
            let mut field = self.make_field(lowered, name, Some(&mut *object));
            field.optional = !schema.required.contains(property);
            if field.description.is_none() {
                field.description = node.as_schema().and_then(|s| s.description.clone());
            }
            if let Some(option) = self.property_option(node) {
                field.options.push(option);
            }
            object.add_field(field);
        }

        if let Some(AdditionalProperties::Schema(node)) = &schema.additional_properties {
            let value_name = format!("{}AdditionalProperties", proposed);
            let lowered = self
                .lower(node, &value_name, outer)
                .with_context(|| format!("additionalProperties of '{}'", proposed))?;
            let value = self.make_field(lowered, String::new(), Some(&mut *object));
            let value_ty = self.element_type(value, &value_name, Some(&mut *object));

            let mut field = Field::new("additionalProperties", FieldType::Map(Box::new(value_ty)));
            field.optional = true;
            object.add_field(field);
        }

        Ok(())
    }
}

/// Identifier for an enum member; numeric literals get the enum name prefixed
fn enum_value_name(enum_name: &str, value: &EnumLiteral) -> String {
    let text = value.to_string();
    let sanitized = sanitize(&text);
    let numeric = matches!(value, EnumLiteral::Int(_) | EnumLiteral::Float(_))
        || text.parse::<f64>().is_ok();
    let starts_with_digit = sanitized.chars().next().is_none_or(|c| c.is_ascii_digit());

    if numeric || starts_with_digit {
        format!("{}{}", enum_name, sanitized)
    } else {
        sanitized
    }
}
