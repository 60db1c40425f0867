//! Protobuf (proto3) serializer
//!
//! Declarations are rendered in code; the file envelope (syntax, package,
//! imports, file options) comes from the `idl.proto` template.

use crate::encoding::{
    check_identifier, check_type_reference, comment, option_name, proto_value, sorted_options,
};
use openapi2idl_common::naming::to_snake_case;
use openapi2idl_common::{
    ConvertError, Declaration, Enum, Field, FieldType, IdlFile, IdlOption, Result, Scalar,
    Service, Struct, Union,
};
use std::collections::BTreeSet;
use tera::Context;

const INDENT: &str = "  ";

/// Messages are emitted as one group, structs and unions together
enum Message<'a> {
    Struct(&'a Struct),
    Union(&'a Union),
}

impl Message<'_> {
    fn name(&self) -> &str {
        match self {
            Message::Struct(s) => &s.name,
            Message::Union(u) => &u.name,
        }
    }

    fn encode(&self, depth: usize) -> Result<String> {
        match self {
            Message::Struct(s) => encode_struct(s, depth),
            Message::Union(u) => encode_union(u, depth),
        }
    }
}

/// Template context for one IR file
pub fn context(file: &IdlFile) -> Result<Context> {
    check_type_reference(&file.package)?;

    let options: Vec<String> = sorted_options(&file.options)
        .into_iter()
        .map(|option| format!("option {};", encode_option(option, 0)))
        .collect();

    let mut blocks = Vec::new();

    let mut enums: Vec<&Enum> = file.enums.iter().collect();
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    for e in enums {
        blocks.push(encode_enum(e, 0)?);
    }

    let mut messages: Vec<Message<'_>> = file
        .structs
        .iter()
        .map(Message::Struct)
        .chain(file.unions.iter().map(Message::Union))
        .collect();
    messages.sort_by(|a, b| a.name().cmp(b.name()));
    for message in &messages {
        blocks.push(message.encode(0)?);
    }

    let mut services: Vec<&Service> = file.services.iter().collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    for service in services {
        blocks.push(encode_service(service)?);
    }

    let mut context = Context::new();
    context.insert("package", &file.package);
    context.insert("imports", &file.imports);
    context.insert("options", &options);
    context.insert("body", &blocks.join("\n"));
    Ok(context)
}

/// `(api.get) = "/p"` style option text, without the `option` keyword
fn encode_option(option: &IdlOption, depth: usize) -> String {
    format!(
        "{} = {}",
        option_name(&option.name),
        proto_value(&option.value, depth, INDENT)
    )
}

fn statement_options(options: &[IdlOption], depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    sorted_options(options)
        .into_iter()
        .map(|option| format!("{}option {};\n", indent, encode_option(option, depth)))
        .collect()
}

/// Protobuf spelling of a field type
fn proto_type(ty: &FieldType) -> Result<String> {
    match ty {
        FieldType::Scalar(scalar) => Ok(scalar_type(*scalar).to_string()),
        FieldType::Named(name) => {
            check_type_reference(name)?;
            Ok(name.clone())
        }
        FieldType::Map(value) => match value.as_ref() {
            FieldType::Map(_) => Err(ConvertError::Serialization(
                "map values cannot be maps".to_string(),
            )),
            FieldType::List(_) => Err(ConvertError::Serialization(
                "map values cannot be lists in Protobuf".to_string(),
            )),
            value => Ok(format!("map<string, {}>", proto_type(value)?)),
        },
        FieldType::List(_) => Err(ConvertError::Serialization(
            "list types are not supported by Protobuf".to_string(),
        )),
    }
}

fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::String => "string",
        Scalar::Bytes => "bytes",
        Scalar::Int32 => "int32",
        Scalar::Int64 => "int64",
        Scalar::Float => "float",
        Scalar::Double => "double",
        Scalar::Bool => "bool",
        Scalar::Timestamp => "google.protobuf.Timestamp",
    }
}

fn sorted_fields(fields: &[Field]) -> Vec<&Field> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

fn encode_field(field: &Field, number: usize, depth: usize) -> Result<String> {
    check_identifier(&field.name, "field")?;
    let ty = proto_type(&field.ty)?;
    if field.repeated && matches!(field.ty, FieldType::Map(_)) {
        return Err(ConvertError::Serialization(format!(
            "map field '{}' cannot be repeated",
            field.name
        )));
    }

    let indent = INDENT.repeat(depth);
    let mut out = comment(field.description.as_deref(), &indent);
    out.push_str(&indent);
    if field.repeated {
        out.push_str("repeated ");
    }
    out.push_str(&format!("{} {} = {}", ty, field.name, number));

    if !field.options.is_empty() {
        let options: Vec<String> = sorted_options(&field.options)
            .into_iter()
            .map(|option| encode_option(option, depth))
            .collect();
        out.push_str(&format!(" [{}]", options.join(", ")));
    }
    out.push_str(";\n");
    Ok(out)
}

fn encode_enum(e: &Enum, depth: usize) -> Result<String> {
    check_identifier(&e.name, "enum")?;
    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    let mut out = comment(e.description.as_deref(), &indent);
    out.push_str(&format!("{}enum {} {{\n", indent, e.name));
    out.push_str(&statement_options(&e.options, depth + 1));
    let mut seen = BTreeSet::new();
    for value in &e.values {
        let name = value.name.to_uppercase();
        check_identifier(&name, "enum value")?;
        if !seen.insert(name.clone()) {
            return Err(ConvertError::Serialization(format!(
                "enum '{}' has more than one value named '{}'",
                e.name, name
            )));
        }
        out.push_str(&format!("{}{} = {};\n", inner, name, value.index));
    }
    out.push_str(&format!("{}}}\n", indent));
    Ok(out)
}

fn encode_struct(s: &Struct, depth: usize) -> Result<String> {
    check_identifier(&s.name, "message")?;
    let indent = INDENT.repeat(depth);

    let mut out = comment(s.description.as_deref(), &indent);
    out.push_str(&format!("{}message {} {{\n", indent, s.name));
    out.push_str(&statement_options(&s.options, depth + 1));
    for (i, field) in sorted_fields(&s.fields).into_iter().enumerate() {
        out.push_str(&encode_field(field, i + 1, depth + 1)?);
    }

    if !s.nested.is_empty() {
        out.push('\n');
        out.push_str(&encode_nested(&s.nested, depth + 1)?);
    }

    out.push_str(&format!("{}}}\n", indent));
    Ok(out)
}

/// Nested enums first, then nested messages, each sorted by name
fn encode_nested(nested: &[Declaration], depth: usize) -> Result<String> {
    let mut enums: Vec<&Enum> = Vec::new();
    let mut messages: Vec<Message<'_>> = Vec::new();
    for declaration in nested {
        match declaration {
            Declaration::Enum(e) => enums.push(e),
            Declaration::Struct(s) => messages.push(Message::Struct(s)),
            Declaration::Union(u) => messages.push(Message::Union(u)),
        }
    }
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    messages.sort_by(|a, b| a.name().cmp(b.name()));

    let mut blocks = Vec::new();
    for e in enums {
        blocks.push(encode_enum(e, depth)?);
    }
    for message in &messages {
        blocks.push(message.encode(depth)?);
    }
    Ok(blocks.join("\n"))
}

fn encode_union(u: &Union, depth: usize) -> Result<String> {
    check_identifier(&u.name, "message")?;
    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    let mut out = comment(u.description.as_deref(), &indent);
    out.push_str(&format!("{}message {} {{\n", indent, u.name));
    out.push_str(&statement_options(&u.options, depth + 1));
    out.push_str(&format!("{}oneof {} {{\n", inner, to_snake_case(&u.name)));
    for (i, field) in sorted_fields(&u.fields).into_iter().enumerate() {
        if field.repeated || matches!(field.ty, FieldType::Map(_)) {
            return Err(ConvertError::Serialization(format!(
                "oneof member '{}' of '{}' cannot be repeated or a map",
                field.name, u.name
            )));
        }
        out.push_str(&encode_field(field, i + 1, depth + 2)?);
    }
    out.push_str(&format!("{}}}\n", inner));
    out.push_str(&format!("{}}}\n", indent));
    Ok(out)
}

fn encode_service(service: &Service) -> Result<String> {
    check_identifier(&service.name, "service")?;

    let mut out = comment(service.description.as_deref(), "");
    out.push_str(&format!("service {} {{\n", service.name));
    out.push_str(&statement_options(&service.options, 1));

    let mut methods: Vec<_> = service.methods.iter().collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    for method in methods {
        check_identifier(&method.name, "rpc")?;
        let [input] = method.inputs.as_slice() else {
            return Err(ConvertError::Serialization(format!(
                "rpc '{}' must have exactly one input, found {}",
                method.name,
                method.inputs.len()
            )));
        };
        check_type_reference(input)?;
        check_type_reference(&method.output)?;

        out.push_str(&comment(method.description.as_deref(), INDENT));
        out.push_str(&format!(
            "{}rpc {}({}) returns ({})",
            INDENT, method.name, input, method.output
        ));
        if method.options.is_empty() {
            out.push_str(";\n");
        } else {
            out.push_str(" {\n");
            out.push_str(&statement_options(&method.options, 2));
            out.push_str(&format!("{}}}\n", INDENT));
        }
    }

    out.push_str("}\n");
    Ok(out)
}
