//! Operation lowering: HTTP operations into service methods
//!
//! Each operation yields one [`Method`] plus a request and a response
//! declaration. Bindings to the HTTP wire (`api.*` options) are recorded on
//! the method and on every request/response field.

use super::schema::LoweringContext;
use super::types::{MediaType, ObjectOrRef, Operation, Parameter, Response, SchemaOrRef};
use crate::operation_mapper::{
    body_option_key, parameter_option_key, response_option_key, HttpVerb, HEADER_OPTION,
};
use indexmap::IndexMap;
use openapi2idl_common::naming::{convert_path, path_to_pascal, sanitize, upper_first};
use openapi2idl_common::{
    ConvertError, Declaration, Field, FieldType, IdlOption, Method, Result, ResultExt, Service,
    Struct,
};

/// Service used for operations without tags
pub const DEFAULT_SERVICE: &str = "DefaultService";

impl<'a> LoweringContext<'a> {
    /// Lower one operation into a method of the service named by its first tag
    pub fn lower_operation(
        &mut self,
        path: &str,
        verb: HttpVerb,
        operation: &'a Operation,
        shared_parameters: &'a [ObjectOrRef<Parameter>],
        services: &mut IndexMap<String, Service>,
    ) -> Result<()> {
        let naming = self.naming;
        let tag = operation.tags.first();

        let service_name = tag
            .map(|t| naming.type_name(t))
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        let method_name = match (&operation.operation_id, tag) {
            (Some(id), _) => naming.type_name(id),
            (None, Some(tag)) => naming.type_name(tag),
            (None, None) => naming.type_name(&format!("{}{}", path_to_pascal(path), verb.title())),
        };

        let spec = self.spec;
        let service = services.entry(service_name.clone()).or_insert_with(|| {
            let mut service = Service::new(&service_name);
            service.description = tag.and_then(|t| spec.tag_description(t)).map(String::from);
            service
        });
        if service.has_method(&method_name) {
            tracing::debug!(
                service = %service_name,
                method = %method_name,
                %verb,
                path,
                "skipping duplicate method"
            );
            return Ok(());
        }

        let base = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| method_name.clone());
        let context = || format!("operation {} {}", verb, path);

        let parameters = self
            .merge_parameters(shared_parameters, &operation.parameters)
            .with_context(context)?;
        let input = self
            .lower_request(&base, operation, &parameters)
            .with_context(context)?;
        let output = self.lower_responses(&base, operation).with_context(context)?;

        let mut method = Method {
            name: method_name,
            description: operation
                .summary
                .clone()
                .or_else(|| operation.description.clone()),
            inputs: input.into_iter().collect(),
            output,
            options: Vec::new(),
        };
        if self.use_api_options() {
            method
                .options
                .push(IdlOption::new(verb.option_key(), convert_path(path)));
        }
        if let Some(option) = self.operation_option(operation) {
            method.options.push(option);
        }

        tracing::debug!(service = %service.name, method = %method.name, %verb, path, "lowered operation");
        service.add_method(method);
        Ok(())
    }

    /// Path-level parameters overridden by operation parameters with the same `(name, in)`
    fn merge_parameters(
        &self,
        shared: &'a [ObjectOrRef<Parameter>],
        own: &'a [ObjectOrRef<Parameter>],
    ) -> Result<Vec<&'a Parameter>> {
        let spec = self.spec;
        let mut merged: Vec<&'a Parameter> = Vec::new();
        for parameter in shared.iter().chain(own) {
            let parameter = spec.resolve_parameter(parameter)?;
            match merged
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(slot) => *slot = parameter,
                None => merged.push(parameter),
            }
        }
        Ok(merged)
    }

    /// Whether `api.*` options are emitted; registers the options import on first use
    fn use_api_options(&mut self) -> bool {
        if !self.options.api_options {
            return false;
        }
        if let Some(import) = self.target().api_import() {
            self.registry.add_import(import);
        }
        true
    }

    fn empty_request(&mut self) -> Option<String> {
        if let Some(import) = self.target().empty_import() {
            self.registry.add_import(import);
        }
        self.target().empty_request().map(String::from)
    }

    fn empty_response(&mut self) -> String {
        if let Some(import) = self.target().empty_import() {
            self.registry.add_import(import);
        }
        self.target().empty_response().to_string()
    }

    fn lower_request(
        &mut self,
        base: &str,
        operation: &'a Operation,
        parameters: &[&'a Parameter],
    ) -> Result<Option<String>> {
        let mut request = Struct::new(self.naming.type_name(&format!("{}Request", base)));

        if let Some(body) = &operation.request_body {
            let spec = self.spec;
            let body = spec.resolve_request_body(body)?;
            request.description = body.description.clone();
            for (media, content) in &body.content {
                let Some(mut field) = self
                    .lower_media(media, content, body_option_key(media), &mut request)
                    .with_context(|| format!("request body '{}'", media))?
                else {
                    continue;
                };
                field.optional = !body.required;
                request.add_field(field);
            }
        }

        for parameter in parameters {
            let schema = parameter.schema.as_ref().ok_or_else(|| {
                ConvertError::schema(&parameter.name, "parameter has no schema")
            })?;
            let lowered = self
                .lower(schema, &parameter.name, Some(&mut request))
                .with_context(|| format!("{} parameter '{}'", parameter.location, parameter.name))?;

            let name = self.naming.field_name(&parameter.name);
            let mut field = self.make_field(lowered, name, Some(&mut request));
            field.optional = !parameter.required;
            if parameter.description.is_some() {
                field.description = parameter.description.clone();
            }
            if self.use_api_options() {
                field.options.push(IdlOption::new(
                    parameter_option_key(&parameter.location),
                    parameter.name.as_str(),
                ));
            }
            if let Some(option) = self.property_option(schema) {
                field.options.push(option);
            }
            request.add_field(field);
        }

        if request.fields.is_empty() {
            return Ok(self.empty_request());
        }

        let name = request.name.clone();
        self.registry.register(Declaration::Struct(request));
        Ok(Some(name))
    }

    /// Lower one media type entry of a body into a field of `owner`
    ///
    /// Returns `None` when the media type declares no schema.
    fn lower_media(
        &mut self,
        media: &str,
        content: &MediaType,
        binding: Option<&str>,
        owner: &mut Struct,
    ) -> Result<Option<Field>> {
        let Some(schema) = &content.schema else {
            return Ok(None);
        };
        let lowered = self.lower(schema, &sanitize(media), Some(&mut *owner))?;

        let (mut field, bound_to) = match lowered.into_declaration() {
            Ok(declaration) => {
                let type_name = declaration.name().to_string();
                let field = Field::new(self.naming.field_name(media), FieldType::named(&type_name));
                self.attach(declaration, Some(owner));
                (field, type_name)
            }
            Err(field) => {
                let name = field.name.clone();
                (field, name)
            }
        };

        if let Some(key) = binding {
            if self.use_api_options() {
                field.options.push(IdlOption::new(key, bound_to));
            }
        }
        if let Some(option) = self.property_option(schema) {
            field.options.push(option);
        }
        if field.description.is_none() {
            field.description = schema_description(schema);
        }
        Ok(Some(field))
    }

    fn lower_responses(&mut self, base: &str, operation: &'a Operation) -> Result<String> {
        let spec = self.spec;
        let mut kept: Vec<(&str, &Response)> = Vec::new();
        for (status, response) in &operation.responses {
            let resolved = match response {
                ObjectOrRef::Reference { .. } => spec
                    .resolve_response(response)
                    .with_context(|| format!("response '{}'", status))?,
                ObjectOrRef::Object(r) if !r.content.is_empty() || !r.headers.is_empty() => r,
                ObjectOrRef::Object(_) => continue,
            };
            kept.push((status.as_str(), resolved));
        }

        let name = self.naming.type_name(&format!("{}Response", base));
        match kept.as_slice() {
            [] => Ok(self.empty_response()),
            [(status, response)] => {
                let single = self
                    .lower_response(&name, response)
                    .with_context(|| format!("response '{}'", status))?;
                if single.fields.is_empty() {
                    return Ok(self.empty_response());
                }
                self.registry.register(Declaration::Struct(single));
                Ok(name)
            }
            several => {
                let mut wrapper = Struct::new(&name);
                for (status, response) in several {
                    let status_name =
                        self.naming.type_name(&format!("{}Response{}", base, upper_first(status)));
                    let per_status = self
                        .lower_response(&status_name, response)
                        .with_context(|| format!("response '{}'", status))?;
                    if per_status.fields.is_empty() {
                        continue;
                    }
                    self.registry.register(Declaration::Struct(per_status));

                    let mut field = Field::new(
                        format!("Response_{}", sanitize(status)),
                        FieldType::Named(status_name),
                    );
                    field.optional = true;
                    field.description = non_empty(&response.description);
                    wrapper.add_field(field);
                }

                if wrapper.fields.is_empty() {
                    return Ok(self.empty_response());
                }
                self.registry.register(Declaration::Struct(wrapper));
                Ok(name)
            }
        }
    }

    /// Response struct: header fields first, then one field per media type
    fn lower_response(&mut self, name: &str, response: &'a Response) -> Result<Struct> {
        let spec = self.spec;
        let mut out = Struct::new(name);
        out.description = non_empty(&response.description);

        for (header_name, header) in &response.headers {
            let header = spec.resolve_header(header)?;
            let schema = header
                .schema
                .as_ref()
                .ok_or_else(|| ConvertError::schema(header_name, "header has no schema"))?;
            let lowered = self
                .lower(schema, header_name, Some(&mut out))
                .with_context(|| format!("header '{}'", header_name))?;

            let field_name = self.naming.field_name(header_name);
            let mut field = self.make_field(lowered, field_name, Some(&mut out));
            field.optional = !header.required;
            if header.description.is_some() {
                field.description = header.description.clone();
            }
            if self.use_api_options() {
                field
                    .options
                    .push(IdlOption::new(HEADER_OPTION, header_name.as_str()));
            }
            if let Some(option) = self.property_option(schema) {
                field.options.push(option);
            }
            out.add_field(field);
        }

        for (media, content) in &response.content {
            if let Some(field) = self
                .lower_media(media, content, response_option_key(media), &mut out)
                .with_context(|| format!("response body '{}'", media))?
            {
                out.add_field(field);
            }
        }

        Ok(out)
    }
}

fn schema_description(schema: &SchemaOrRef) -> Option<String> {
    schema.as_schema().and_then(|s| s.description.clone())
}

fn non_empty(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::OpenApiSpec;
    use openapi2idl_common::{ConvertOptions, OptionValue, Target};

    fn spec(json: &str) -> OpenApiSpec {
        serde_json::from_str(json).unwrap()
    }

    fn lower_all<'a>(doc: &'a OpenApiSpec, options: &ConvertOptions) -> (LoweringContext<'a>, Vec<Service>) {
        let mut ctx = LoweringContext::new(doc, options);
        let mut services = IndexMap::new();
        for (path, item) in &doc.paths {
            for (verb, operation) in crate::operations(item) {
                ctx.lower_operation(path, verb, operation, &item.parameters, &mut services)
                    .unwrap();
            }
        }
        (ctx, services.into_values().collect())
    }

    const ITEMS: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Items", "version": "1"},
        "paths": {
            "/items/{id}": {
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                    {"name": "verbose", "in": "query", "schema": {"type": "boolean"}}
                ],
                "get": {
                    "operationId": "getItem",
                    "tags": ["items"],
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}
                    ],
                    "responses": {"204": {"description": "nothing"}}
                }
            }
        }
    }"#;

    #[test]
    fn test_path_parameter_binding_and_override() {
        let doc = spec(ITEMS);
        let (ctx, services) = lower_all(&doc, &ConvertOptions::default());

        let items = &services[0];
        assert_eq!(items.name, "Items");
        let method = items.method("GetItem").unwrap();
        assert_eq!(method.inputs, vec!["GetItemRequest".to_string()]);
        assert_eq!(method.output, "google.protobuf.Empty");
        assert_eq!(
            method.option("api.get").unwrap().value,
            OptionValue::Str("/items/:id".to_string())
        );

        match ctx.registry().get("GetItemRequest") {
            Some(Declaration::Struct(request)) => {
                let names: Vec<&str> = request.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["id", "verbose"]);
                let id = request.field("id").unwrap();
                assert!(!id.optional);
                assert_eq!(id.ty, FieldType::Scalar(openapi2idl_common::Scalar::Int64));
                assert_eq!(
                    id.option("api.path").unwrap().value,
                    OptionValue::Str("id".to_string())
                );
                assert!(request.field("verbose").unwrap().optional);
            }
            other => panic!("expected request struct, got {:?}", other),
        }

        let imports: Vec<&str> = ctx.registry().imports().collect();
        assert_eq!(imports, vec!["api.proto", "google/protobuf/empty.proto"]);
    }

    #[test]
    fn test_api_options_disabled() {
        let doc = spec(ITEMS);
        let options = ConvertOptions {
            api_options: false,
            ..ConvertOptions::default()
        };
        let (ctx, services) = lower_all(&doc, &options);

        let method = services[0].method("GetItem").unwrap();
        assert!(method.options.is_empty());
        match ctx.registry().get("GetItemRequest") {
            Some(Declaration::Struct(request)) => {
                assert!(request.fields.iter().all(|f| f.options.is_empty()))
            }
            other => panic!("expected request struct, got {:?}", other),
        }
        let imports: Vec<&str> = ctx.registry().imports().collect();
        assert_eq!(imports, vec!["google/protobuf/empty.proto"]);
    }

    #[test]
    fn test_thrift_empty_request_and_void_response() {
        let doc = spec(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "Ping", "version": "1"},
                "paths": {"/ping": {"get": {"responses": {"200": {"description": "ok"}}}}}
            }"#,
        );
        let (ctx, services) = lower_all(&doc, &ConvertOptions::for_target(Target::Thrift));

        assert_eq!(services[0].name, DEFAULT_SERVICE);
        let method = services[0].method("PingGet").unwrap();
        assert!(method.inputs.is_empty());
        assert_eq!(method.output, "void");
        assert_eq!(ctx.registry().imports().count(), 0);
    }

    #[test]
    fn test_request_body_binding() {
        let doc = spec(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "Pets", "version": "1"},
                "paths": {
                    "/pets": {
                        "post": {
                            "operationId": "addPet",
                            "requestBody": {
                                "required": true,
                                "content": {
                                    "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}},
                                    "multipart/form-data": {
                                        "schema": {"type": "object", "properties": {"photo": {"type": "string", "format": "binary"}}}
                                    }
                                }
                            },
                            "responses": {
                                "200": {
                                    "description": "ok",
                                    "headers": {"X-Rate-Limit": {"schema": {"type": "integer", "format": "int32"}}},
                                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                                }
                            }
                        }
                    }
                }
            }"##,
        );
        let (ctx, services) = lower_all(&doc, &ConvertOptions::for_target(Target::Thrift));
        let method = services[0].method("AddPet").unwrap();
        assert_eq!(method.output, "AddPetResponse");

        match ctx.registry().get("AddPetRequest") {
            Some(Declaration::Struct(request)) => {
                let pet = request.field("pet").unwrap();
                assert!(!pet.optional);
                assert_eq!(
                    pet.option("api.body").unwrap().value,
                    OptionValue::Str("pet".to_string())
                );
                let form = request.field("multipart_form_data").unwrap();
                assert_eq!(form.ty, FieldType::named("AddPetRequestMultipartFormData"));
                assert_eq!(
                    form.option("api.form").unwrap().value,
                    OptionValue::Str("AddPetRequestMultipartFormData".to_string())
                );
            }
            other => panic!("expected request struct, got {:?}", other),
        }
        assert!(ctx.registry().contains("AddPetRequestMultipartFormData"));

        match ctx.registry().get("AddPetResponse") {
            Some(Declaration::Struct(response)) => {
                let names: Vec<&str> = response.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["x_rate_limit", "pet"]);
                assert_eq!(
                    response.fields[0].option(HEADER_OPTION).unwrap().value,
                    OptionValue::Str("X-Rate-Limit".to_string())
                );
            }
            other => panic!("expected response struct, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_method_names_first_wins() {
        let doc = spec(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "Dup", "version": "1"},
                "paths": {
                    "/a": {"get": {"tags": ["store"], "responses": {}}},
                    "/b": {"get": {"tags": ["store"], "summary": "second", "responses": {}}}
                }
            }"#,
        );
        let (_, services) = lower_all(&doc, &ConvertOptions::default());
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].methods.len(), 1);
        let method = services[0].method("Store").unwrap();
        assert_eq!(
            method.option("api.get").unwrap().value,
            OptionValue::Str("/a".to_string())
        );
        assert!(method.description.is_none());
    }

    #[test]
    fn test_unresolved_response_reference() {
        let doc = spec(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "Broken", "version": "1"},
                "paths": {
                    "/x": {"get": {"operationId": "getX", "responses": {"404": {"$ref": "#/components/responses/NotFound"}}}}
                }
            }"##,
        );
        let options = ConvertOptions::default();
        let mut ctx = LoweringContext::new(&doc, &options);
        let mut services = IndexMap::new();
        let item = &doc.paths["/x"];
        let operation = item.get.as_ref().unwrap();

        let err = ctx
            .lower_operation("/x", HttpVerb::Get, operation, &item.parameters, &mut services)
            .unwrap_err();
        assert!(matches!(err.root_cause(), ConvertError::Reference(_)));
        assert!(err.to_string().starts_with("operation GET /x"), "{}", err);
    }
}
