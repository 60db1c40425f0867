//! Intermediate representation of a target IDL file
//!
//! The parser lowers OpenAPI documents into these types and the generator
//! renders them. Apart from the merge rules on [`Declaration`] the types are
//! passive data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primitive type tokens shared by both targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    String,
    Bytes,
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    Timestamp,
}

/// Type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(Scalar),
    /// Reference to a declaration by name
    Named(String),
    /// String-keyed map
    Map(Box<FieldType>),
    /// Nested list, only produced for the Thrift target
    List(Box<FieldType>),
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named(name.into())
    }

    /// Whether the type mentions `scalar` at any depth
    pub fn contains_scalar(&self, scalar: Scalar) -> bool {
        match self {
            FieldType::Scalar(s) => *s == scalar,
            FieldType::Named(_) => false,
            FieldType::Map(inner) | FieldType::List(inner) => inner.contains_scalar(scalar),
        }
    }
}

/// Value of an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<OptionValue>),
    /// Keys are kept sorted so rendering never depends on insertion order
    Map(BTreeMap<String, OptionValue>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<BTreeMap<String, OptionValue>> for OptionValue {
    fn from(value: BTreeMap<String, OptionValue>) -> Self {
        OptionValue::Map(value)
    }
}

/// A named option attached to a file, declaration, field or method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlOption {
    /// Namespaced key, e.g. `api.get` or `openapi.schema`
    pub name: String,
    pub value: OptionValue,
}

impl IdlOption {
    pub fn new(name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Add `option` unless an option with the same name is already present
pub fn add_option(options: &mut Vec<IdlOption>, option: IdlOption) -> bool {
    if options.iter().any(|o| o.name == option.name) {
        return false;
    }
    options.push(option);
    true
}

/// A field of a struct or union
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            repeated: false,
            optional: false,
            description: None,
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: IdlOption) -> Self {
        add_option(&mut self.options, option);
        self
    }

    pub fn option(&self, name: &str) -> Option<&IdlOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// Literal value of an enum member as written in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumLiteral {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::Bool(b) => write!(f, "{}", b),
            EnumLiteral::Int(i) => write!(f, "{}", i),
            EnumLiteral::Float(x) => write!(f, "{}", x),
            EnumLiteral::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Emission index, the position in the source list
    pub index: usize,
    pub name: String,
    pub value: EnumLiteral,
}

/// Struct (Thrift) or message (Protobuf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Declarations scoped inside this struct
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            nested: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Append `field` unless a field with the same name exists. First wins.
    pub fn add_field(&mut self, field: Field) -> bool {
        if self.field(&field.name).is_some() {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Attach a nested declaration, merging with an existing one of the same name
    pub fn add_nested(&mut self, declaration: Declaration) -> Vec<NameCollision> {
        merge_into(&mut self.nested, declaration)
    }

    pub fn nested_declaration(&self, name: &str) -> Option<&Declaration> {
        self.nested.iter().find(|d| d.name() == name)
    }

    /// Union `other` into this struct: absent fields appended, nested
    /// declarations and options merged by name.
    pub fn merge(&mut self, other: Struct) -> Vec<NameCollision> {
        if self.description.is_none() {
            self.description = other.description;
        }
        for field in other.fields {
            self.add_field(field);
        }
        for option in other.options {
            add_option(&mut self.options, option);
        }
        let mut collisions = Vec::new();
        for declaration in other.nested {
            collisions.extend(self.add_nested(declaration));
        }
        collisions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

/// Sum type: at most one field is populated at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Struct,
    Enum,
    Union,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Struct => f.write_str("struct"),
            DeclarationKind::Enum => f.write_str("enum"),
            DeclarationKind::Union => f.write_str("union"),
        }
    }
}

/// A named top-level or nested declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Struct(Struct),
    Enum(Enum),
    Union(Union),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct(s) => &s.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Union(u) => &u.name,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Struct(_) => DeclarationKind::Struct,
            Declaration::Enum(_) => DeclarationKind::Enum,
            Declaration::Union(_) => DeclarationKind::Union,
        }
    }

    pub fn options_mut(&mut self) -> &mut Vec<IdlOption> {
        match self {
            Declaration::Struct(s) => &mut s.options,
            Declaration::Enum(e) => &mut e.options,
            Declaration::Union(u) => &mut u.options,
        }
    }

    /// Merge a same-named declaration into this one.
    ///
    /// Structs are unioned by field name. Enums and unions keep the first
    /// definition; an identical duplicate is accepted silently, anything else
    /// (including a kind mismatch) is reported as a collision.
    pub fn absorb(&mut self, incoming: Declaration) -> Vec<NameCollision> {
        match (self, incoming) {
            (Declaration::Struct(existing), Declaration::Struct(incoming)) => {
                existing.merge(incoming)
            }
            (existing, incoming) if *existing == incoming => Vec::new(),
            (existing, incoming) => vec![NameCollision {
                name: incoming.name().to_string(),
                existing: existing.kind(),
                incoming: incoming.kind(),
            }],
        }
    }
}

/// Merge `declaration` into `list` by name, appending it when new
pub fn merge_into(list: &mut Vec<Declaration>, declaration: Declaration) -> Vec<NameCollision> {
    match list.iter_mut().find(|d| d.name() == declaration.name()) {
        Some(existing) => existing.absorb(declaration),
        None => {
            list.push(declaration);
            Vec::new()
        }
    }
}

/// Two different declarations that received the same name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCollision {
    pub name: String,
    pub existing: DeclarationKind,
    pub incoming: DeclarationKind,
}

impl fmt::Display for NameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' conflicts with an existing {} of the same name; the first definition was kept",
            self.incoming, self.name, self.existing
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input type names. Empty means "no input" (Thrift only).
    pub inputs: Vec<String>,
    pub output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

impl Method {
    pub fn option(&self, name: &str) -> Option<&IdlOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub methods: Vec<Method>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<IdlOption>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            methods: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Add `method` unless one with the same name exists. First wins.
    pub fn add_method(&mut self, method: Method) -> bool {
        if self.has_method(&method.name) {
            return false;
        }
        self.methods.push(method);
        true
    }
}

/// Root of the IR: one target IDL file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdlFile {
    pub package: String,
    /// Deduplicated, in first-registration order
    pub imports: Vec<String>,
    pub enums: Vec<Enum>,
    pub structs: Vec<Struct>,
    pub unions: Vec<Union>,
    pub services: Vec<Service>,
    /// File-level options; namespaces for the Thrift target
    pub options: Vec<IdlOption>,
}

impl IdlFile {
    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn find_union(&self, name: &str) -> Option<&Union> {
        self.unions.iter().find(|u| u.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn method_count(&self) -> usize {
        self.services.iter().map(|s| s.methods.len()).sum()
    }
}
