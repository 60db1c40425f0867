//! IDL rendering for converted OpenAPI documents
//!
//! This crate turns the IR produced by `openapi2idl-parser` into Protobuf or
//! Thrift text. Output is deterministic: every group of declarations, fields,
//! methods and options is sorted by name before rendering, so the same IR
//! always yields byte-identical text.

pub mod encoding;
mod proto;
mod sink;
mod templates;
mod thrift;

pub use sink::{FileSink, OutputSink, StdoutSink};

use openapi2idl_common::{ConvertError, IdlFile, Result, Target};
use std::path::Path;
use tera::Tera;

/// IDL generator
///
/// Renders one IR file for one target:
/// - Protobuf: `syntax`, `package`, imports, file options, enums, messages, services
/// - Thrift: namespaces, includes, enums, structs, unions, services
pub struct IdlGenerator {
    file: IdlFile,
    target: Target,
    tera: Tera,
}

impl IdlGenerator {
    /// Create a new generator for an IR file
    pub fn new(file: IdlFile, target: Target) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { file, target, tera })
    }

    pub fn file(&self) -> &IdlFile {
        &self.file
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Render the whole file
    pub fn render(&self) -> Result<String> {
        let (template, context) = match self.target {
            Target::Proto => (templates::PROTO_TEMPLATE, proto::context(&self.file)?),
            Target::Thrift => (templates::THRIFT_TEMPLATE, thrift::context(&self.file)?),
        };

        self.tera
            .render(template, &context)
            .map_err(|e| ConvertError::Serialization(format!("Template error: {}", e)))
    }

    /// Render, then hand the complete text to `sink`
    pub fn write_to(&self, sink: &mut dyn OutputSink) -> Result<()> {
        let rendered = self.render()?;
        sink.write_all(&rendered)
    }

    /// Render and write to a file
    pub fn generate_to_file(&self, path: &Path) -> Result<()> {
        self.write_to(&mut FileSink::new(path))
    }
}

/// Render an IR file in one step
pub fn render(file: IdlFile, target: Target) -> Result<String> {
    IdlGenerator::new(file, target)?.render()
}
