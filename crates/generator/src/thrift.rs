//! Thrift serializer

use crate::encoding::{check_identifier, check_type_reference, comment, sorted_options, thrift_value};
use openapi2idl_common::{
    ConvertError, Enum, Field, FieldType, IdlFile, IdlOption, Result, Scalar, Service, Struct,
    Union,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tera::Context;

const INDENT: &str = "    ";

#[derive(Debug, Serialize)]
struct Namespace<'a> {
    language: &'a str,
    value: &'a str,
}

/// Template context for one IR file
pub fn context(file: &IdlFile) -> Result<Context> {
    let namespaces = sorted_options(&file.options)
        .into_iter()
        .map(namespace)
        .collect::<Result<Vec<_>>>()?;

    let mut blocks = Vec::new();

    let mut enums: Vec<&Enum> = file.enums.iter().collect();
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    for e in enums {
        blocks.push(encode_enum(e)?);
    }

    let mut structs: Vec<&Struct> = file.structs.iter().collect();
    structs.sort_by(|a, b| a.name.cmp(&b.name));
    for s in structs {
        blocks.push(encode_struct(s)?);
    }

    let mut unions: Vec<&Union> = file.unions.iter().collect();
    unions.sort_by(|a, b| a.name.cmp(&b.name));
    for u in unions {
        blocks.push(encode_union(u)?);
    }

    let mut services: Vec<&Service> = file.services.iter().collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    for service in services {
        blocks.push(encode_service(service)?);
    }

    let mut context = Context::new();
    context.insert("namespaces", &namespaces);
    context.insert("includes", &file.imports);
    context.insert("body", &blocks.join("\n"));
    Ok(context)
}

/// File options are namespaces: the option name is the target language
fn namespace(option: &IdlOption) -> Result<Namespace<'_>> {
    if option.name.contains('.') {
        return Err(ConvertError::Serialization(format!(
            "file option '{}' cannot be expressed in Thrift",
            option.name
        )));
    }
    check_identifier(&option.name, "namespace language")?;
    let value = option.value.as_str().ok_or_else(|| {
        ConvertError::Serialization(format!("namespace '{}' must be a string", option.name))
    })?;
    Ok(Namespace {
        language: &option.name,
        value,
    })
}

fn thrift_type(ty: &FieldType) -> Result<String> {
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
            value => Ok(format!("map<string, {}>", thrift_type(value)?)),
        },
        FieldType::List(item) => Ok(format!("list<{}>", thrift_type(item)?)),
    }
}

fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::String | Scalar::Timestamp => "string",
        Scalar::Bytes => "binary",
        Scalar::Int32 => "i32",
        Scalar::Int64 => "i64",
        Scalar::Float | Scalar::Double => "double",
        Scalar::Bool => "bool",
    }
}

/// ` (api.query = "id", ...)` or nothing
fn annotations(options: &[IdlOption]) -> Result<String> {
    if options.is_empty() {
        return Ok(String::new());
    }
    let rendered = sorted_options(options)
        .into_iter()
        .map(|option| Ok(format!("{} = {}", option.name, thrift_value(&option.value)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(" ({})", rendered.join(", ")))
}

fn encode_fields(fields: &[Field], allow_optional: bool) -> Result<String> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    for (i, field) in sorted.into_iter().enumerate() {
        check_identifier(&field.name, "field")?;
        let mut ty = thrift_type(&field.ty)?;
        if field.repeated {
            ty = format!("list<{}>", ty);
        }
        let qualifier = if allow_optional && field.optional {
            "optional "
        } else {
            ""
        };

        out.push_str(&comment(field.description.as_deref(), INDENT));
        out.push_str(&format!(
            "{}{}: {}{} {}{}\n",
            INDENT,
            i + 1,
            qualifier,
            ty,
            field.name,
            annotations(&field.options)?
        ));
    }
    Ok(out)
}

fn encode_enum(e: &Enum) -> Result<String> {
    check_identifier(&e.name, "enum")?;
    let mut out = comment(e.description.as_deref(), "");
    out.push_str(&format!("enum {} {{\n", e.name));
    let mut seen = BTreeSet::new();
    for value in &e.values {
        check_identifier(&value.name, "enum value")?;
        if !seen.insert(value.name.as_str()) {
            return Err(ConvertError::Serialization(format!(
                "enum '{}' has more than one value named '{}'",
                e.name, value.name
            )));
        }
        out.push_str(&format!("{}{} = {}\n", INDENT, value.name, value.index));
    }
    out.push_str(&format!("}}{}\n", annotations(&e.options)?));
    Ok(out)
}

fn encode_struct(s: &Struct) -> Result<String> {
    check_identifier(&s.name, "struct")?;
    if !s.nested.is_empty() {
        return Err(ConvertError::Serialization(format!(
            "struct '{}' has nested declarations, which Thrift does not support",
            s.name
        )));
    }

    let mut out = comment(s.description.as_deref(), "");
    out.push_str(&format!("struct {} {{\n", s.name));
    out.push_str(&encode_fields(&s.fields, true)?);
    out.push_str(&format!("}}{}\n", annotations(&s.options)?));
    Ok(out)
}

fn encode_union(u: &Union) -> Result<String> {
    check_identifier(&u.name, "union")?;
    let mut out = comment(u.description.as_deref(), "");
    out.push_str(&format!("union {} {{\n", u.name));
    out.push_str(&encode_fields(&u.fields, false)?);
    out.push_str(&format!("}}{}\n", annotations(&u.options)?));
    Ok(out)
}

fn encode_service(service: &Service) -> Result<String> {
    check_identifier(&service.name, "service")?;

    let mut out = comment(service.description.as_deref(), "");
    out.push_str(&format!("service {} {{\n", service.name));

    let mut methods: Vec<_> = service.methods.iter().collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    for method in methods {
        check_identifier(&method.name, "method")?;
        check_type_reference(&method.output)?;
        let arguments = match method.inputs.as_slice() {
            [] => String::new(),
            [input] => {
                check_type_reference(input)?;
                format!("1: {} req", input)
            }
            more => {
                return Err(ConvertError::Serialization(format!(
                    "method '{}' has {} inputs, Thrift methods take at most one",
                    method.name,
                    more.len()
                )))
            }
        };

        out.push_str(&comment(method.description.as_deref(), INDENT));
        out.push_str(&format!(
            "{}{} {}({}){}\n",
            INDENT,
            method.output,
            method.name,
            arguments,
            annotations(&method.options)?
        ));
    }

    out.push_str(&format!("}}{}\n", annotations(&service.options)?));
    Ok(out)
}
