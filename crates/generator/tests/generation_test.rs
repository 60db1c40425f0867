//! End-to-end rendering: OpenAPI document -> IR -> IDL text

use openapi2idl_common::{ConvertOptions, Target};
use openapi2idl_generator::IdlGenerator;
use openapi2idl_parser::OpenApiParser;
use tempfile::TempDir;

const PETSTORE: &str = r##"{
    "openapi": "3.0.0",
    "info": {"title": "Pet Store", "version": "1.0.0"},
    "tags": [{"name": "pets", "description": "Pet operations"}],
    "paths": {
        "/pets/{petId}": {
            "get": {
                "operationId": "getPet",
                "tags": ["pets"],
                "parameters": [
                    {"name": "petId", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}
                ],
                "responses": {
                    "200": {
                        "description": "ok",
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                    },
                    "404": {
                        "description": "missing",
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}
                    }
                }
            }
        }
    },
    "components": {
        "schemas": {
            "Pet": {
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "status": {"type": "string", "enum": ["available", "sold"]}
                }
            },
            "Error": {
                "type": "object",
                "properties": {"message": {"type": "string"}}
            }
        }
    }
}"##;

const PETSTORE_PROTO: &str = r#"syntax = "proto3";

package pet_store;

import "api.proto";

message Error {
  string message = 1;
}

message GetPetRequest {
  int64 pet_id = 1 [(api.path) = "petId"];
}

message GetPetResponse {
  // ok
  GetPetResponse200 Response_200 = 1;
  // missing
  GetPetResponse404 Response_404 = 2;
}

// ok
message GetPetResponse200 {
  Pet pet = 1 [(api.body) = "pet"];
}

// missing
message GetPetResponse404 {
  Error error = 1 [(api.body) = "error"];
}

message Pet {
  int64 id = 1;
  PetStatus status = 2;

  enum PetStatus {
    AVAILABLE = 0;
    SOLD = 1;
  }
}

// Pet operations
service Pets {
  rpc GetPet(GetPetRequest) returns (GetPetResponse) {
    option (api.get) = "/pets/:petId";
  }
}
"#;

const PETSTORE_THRIFT: &str = r#"namespace go pet_store

enum PetStatus {
    available = 0
    sold = 1
}

struct Error {
    1: optional string message
}

struct GetPetRequest {
    1: i64 pet_id (api.path = "petId")
}

struct GetPetResponse {
    // ok
    1: optional GetPetResponse200 Response_200
    // missing
    2: optional GetPetResponse404 Response_404
}

// ok
struct GetPetResponse200 {
    1: Pet pet (api.body = "pet")
}

// missing
struct GetPetResponse404 {
    1: Error error (api.body = "error")
}

struct Pet {
    1: i64 id
    2: optional PetStatus status
}

// Pet operations
service Pets {
    GetPetResponse GetPet(1: GetPetRequest req) (api.get = "/pets/:petId")
}
"#;

fn render(document: &str, options: &ConvertOptions) -> String {
    let conversion = OpenApiParser::from_json(document)
        .unwrap()
        .convert(options)
        .unwrap();
    IdlGenerator::new(conversion.file, options.target)
        .unwrap()
        .render()
        .unwrap()
}

#[test]
fn test_petstore_proto() {
    let rendered = render(PETSTORE, &ConvertOptions::for_target(Target::Proto));
    assert_eq!(rendered, PETSTORE_PROTO);
}

#[test]
fn test_petstore_thrift() {
    let rendered = render(PETSTORE, &ConvertOptions::for_target(Target::Thrift));
    assert_eq!(rendered, PETSTORE_THRIFT);
}

#[test]
fn test_output_is_deterministic() {
    for target in [Target::Proto, Target::Thrift] {
        let options = ConvertOptions::for_target(target);
        let first = render(PETSTORE, &options);
        let second = render(PETSTORE, &options);
        assert_eq!(first, second, "{} output differs between runs", target);
    }
}

#[test]
fn test_empty_request_collapses_to_single_import() {
    let document = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Health", "version": "1"},
        "paths": {
            "/health": {"get": {"operationId": "check", "responses": {"200": {"description": "ok"}}}},
            "/ready": {"get": {"operationId": "ready", "responses": {}}}
        }
    }"#;
    let options = ConvertOptions {
        api_options: false,
        ..ConvertOptions::for_target(Target::Proto)
    };

    let rendered = render(document, &options);
    assert_eq!(
        rendered,
        r#"syntax = "proto3";

package health;

import "google/protobuf/empty.proto";

service DefaultService {
  rpc Check(google.protobuf.Empty) returns (google.protobuf.Empty);
  rpc Ready(google.protobuf.Empty) returns (google.protobuf.Empty);
}
"#
    );
}

#[test]
fn test_generate_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("idl").join("pets.thrift");

    let options = ConvertOptions::for_target(Target::Thrift);
    let conversion = OpenApiParser::from_json(PETSTORE)
        .unwrap()
        .convert(&options)
        .unwrap();
    let generator = IdlGenerator::new(conversion.file, Target::Thrift).unwrap();
    generator.generate_to_file(&output).unwrap();

    assert!(output.exists(), "output file should be created");
    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, PETSTORE_THRIFT);
}
