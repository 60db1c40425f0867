//! Converts an OpenAPI document into the IDL IR
//!
//! One run lowers, in order: file options, component schemas, then every
//! operation of every path. Declarations land in the run's registry, which is
//! finally assembled into an [`IdlFile`].

use super::schema::LoweringContext;
use super::types::OpenApiSpec;
use crate::operation_mapper::operations;
use indexmap::IndexMap;
use openapi2idl_common::naming::to_snake_case;
use openapi2idl_common::{
    add_option, ConvertOptions, Declaration, Field, IdlFile, IdlOption, NameCollision, Result,
    ResultExt, Service, Struct, Target,
};

/// Package used when neither the options nor the document name one
pub const DEFAULT_PACKAGE: &str = "default_package";

/// Outcome of one conversion run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub file: IdlFile,
    /// Name collisions detected while registering declarations
    pub collisions: Vec<NameCollision>,
}

/// Convert an OpenAPI document into the IR for `options.target`
pub fn convert_openapi_to_idl(spec: &OpenApiSpec, options: &ConvertOptions) -> Result<Conversion> {
    let package = options
        .package
        .clone()
        .unwrap_or_else(|| package_name(spec));

    let mut ctx = LoweringContext::new(spec, options);
    let file_options = file_options(&mut ctx, spec, &package);

    lower_components(&mut ctx, spec)?;
    let services = lower_paths(&mut ctx, spec)?;

    let (file, collisions) = ctx.into_registry().into_file(package, services, file_options);
    tracing::info!(
        target = %options.target,
        package = %file.package,
        structs = file.structs.len(),
        enums = file.enums.len(),
        unions = file.unions.len(),
        services = file.services.len(),
        methods = file.method_count(),
        collisions = collisions.len(),
        "converted OpenAPI document"
    );

    Ok(Conversion { file, collisions })
}

/// Package name from the document title, then its description
fn package_name(spec: &OpenApiSpec) -> String {
    [Some(spec.info.title.as_str()), spec.info.description.as_deref()]
        .into_iter()
        .flatten()
        .map(to_snake_case)
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_PACKAGE.to_string())
}

/// File options from `x-options`; Thrift gets a `go` namespace by default
fn file_options(ctx: &mut LoweringContext<'_>, spec: &OpenApiSpec, package: &str) -> Vec<IdlOption> {
    let mut options = Vec::new();
    for (name, value) in spec.x_options() {
        add_option(&mut options, IdlOption::new(name, value));
    }

    if ctx.target() == Target::Thrift {
        add_option(&mut options, IdlOption::new("go", package));
    }
    if let Some(document) = ctx.document_option() {
        add_option(&mut options, document);
    }
    options
}

fn lower_components(ctx: &mut LoweringContext<'_>, spec: &OpenApiSpec) -> Result<()> {
    let Some(components) = &spec.components else {
        return Ok(());
    };

    for (name, node) in &components.schemas {
        let lowered = ctx
            .lower(node, name, None)
            .with_context(|| format!("component '{}'", name))?;

        let mut declaration = match lowered.into_declaration() {
            Ok(declaration) => declaration,
            // Aliases and primitives still get a named declaration
            Err(field) => wrap_component_field(ctx, name, field),
        };
        if let Some(option) = ctx.schema_option(node) {
            add_option(declaration.options_mut(), option);
        }
        ctx.registry.register(declaration);
    }
    Ok(())
}

fn wrap_component_field(ctx: &LoweringContext<'_>, name: &str, field: Field) -> Declaration {
    let mut wrapper = Struct::new(ctx.naming().type_name(name));
    wrapper.description = field.description.clone();
    wrapper.add_field(field);
    Declaration::Struct(wrapper)
}

fn lower_paths<'a>(ctx: &mut LoweringContext<'a>, spec: &'a OpenApiSpec) -> Result<Vec<Service>> {
    let mut services: IndexMap<String, Service> = IndexMap::new();
    for (path, item) in &spec.paths {
        for (verb, operation) in operations(item) {
            ctx.lower_operation(path, verb, operation, &item.parameters, &mut services)?;
        }
    }
    Ok(services.into_values().collect())
}
