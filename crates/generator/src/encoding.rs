//! Text encoding shared by both serializers

use openapi2idl_common::naming::is_identifier;
use openapi2idl_common::{ConvertError, IdlOption, OptionValue, Result};

/// Quote and escape a string literal
///
/// ```
/// use openapi2idl_generator::encoding::quote;
///
/// assert_eq!(quote("a \"b\"\n"), r#""a \"b\"\n""#);
/// ```
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Option names containing a dot are extensions and get parenthesised
pub fn option_name(name: &str) -> String {
    if name.contains('.') {
        format!("({})", name)
    } else {
        name.to_string()
    }
}

/// Render an option value for Protobuf
///
/// Maps become a brace block with one `key: value;` line per key (keys are
/// kept sorted by `BTreeMap`); `depth` is the indentation level of the line
/// the value starts on.
pub fn proto_value(value: &OptionValue, depth: usize, unit: &str) -> String {
    match value {
        OptionValue::Str(s) => quote(s),
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Int(i) => i.to_string(),
        OptionValue::Float(f) => f.to_string(),
        OptionValue::List(items) => {
            let items: Vec<String> = items.iter().map(|v| proto_value(v, depth, unit)).collect();
            format!("[{}]", items.join(", "))
        }
        OptionValue::Map(map) => {
            let inner = unit.repeat(depth + 1);
            let mut out = String::from("{\n");
            for (key, value) in map {
                out.push_str(&format!(
                    "{}{}: {};\n",
                    inner,
                    key,
                    proto_value(value, depth + 1, unit)
                ));
            }
            out.push_str(&unit.repeat(depth));
            out.push('}');
            out
        }
    }
}

/// Render an option value for Thrift annotations, which only accept strings
pub fn thrift_value(value: &OptionValue) -> Result<String> {
    match value {
        OptionValue::Str(s) => Ok(quote(s)),
        other => {
            let compact = serde_json::to_string(other)
                .map_err(|e| ConvertError::Serialization(format!("option value: {}", e)))?;
            Ok(quote(&compact))
        }
    }
}

/// Options sorted by name
pub fn sorted_options(options: &[IdlOption]) -> Vec<&IdlOption> {
    let mut sorted: Vec<&IdlOption> = options.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// Fail unless `name` is a plain identifier
pub fn check_identifier(name: &str, what: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ConvertError::Serialization(format!(
            "invalid {} name '{}'",
            what, name
        )))
    }
}

/// Fail unless `name` is a dotted path of identifiers, e.g. `google.protobuf.Empty`
pub fn check_type_reference(name: &str) -> Result<()> {
    if !name.is_empty() && name.split('.').all(is_identifier) {
        Ok(())
    } else {
        Err(ConvertError::Serialization(format!(
            "invalid type reference '{}'",
            name
        )))
    }
}

/// Render a description as `//` comment lines at `indent`
pub fn comment(description: Option<&str>, indent: &str) -> String {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return String::new();
    };
    description
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                format!("{}//\n", indent)
            } else {
                format!("{}// {}\n", indent, line)
            }
        })
        .collect()
}
