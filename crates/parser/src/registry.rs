//! Declaration registry for one conversion run

use indexmap::{IndexMap, IndexSet};
use openapi2idl_common::{
    Declaration, Enum, IdlFile, IdlOption, NameCollision, Service, Struct, Union,
};

/// Per-run store of top-level declarations, imports and detected collisions
///
/// Structs registered under an existing name are merged field by field.
/// Enums and unions keep their first definition; a differing redefinition is
/// recorded in [`collisions`](Self::collisions) instead of replacing it.
#[derive(Debug, Default)]
pub struct DeclarationRegistry {
    declarations: IndexMap<String, Declaration>,
    imports: IndexSet<String>,
    collisions: Vec<NameCollision>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration, merging it with an existing one of the same name
    pub fn register(&mut self, declaration: Declaration) {
        let collisions = match self.declarations.get_mut(declaration.name()) {
            Some(existing) => existing.absorb(declaration),
            None => {
                tracing::trace!(
                    name = declaration.name(),
                    kind = %declaration.kind(),
                    "registered declaration"
                );
                self.declarations
                    .insert(declaration.name().to_string(), declaration);
                Vec::new()
            }
        };
        self.record_collisions(collisions);
    }

    /// Record collisions found while merging outside the registry (nested scopes)
    pub fn record_collisions(&mut self, collisions: Vec<NameCollision>) {
        for collision in collisions {
            tracing::warn!(
                name = %collision.name,
                existing = %collision.existing,
                incoming = %collision.incoming,
                "declaration name collision, keeping the first definition"
            );
            self.collisions.push(collision);
        }
    }

    /// Add an import; duplicates are ignored and first-registration order is kept
    pub fn add_import(&mut self, import: &str) {
        if self.imports.insert(import.to_string()) {
            tracing::trace!(import, "registered import");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Declaration> {
        self.declarations.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(String::as_str)
    }

    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// Assemble the IR root, splitting declarations by kind
    pub fn into_file(
        self,
        package: String,
        services: Vec<Service>,
        options: Vec<IdlOption>,
    ) -> (IdlFile, Vec<NameCollision>) {
        let mut enums: Vec<Enum> = Vec::new();
        let mut structs: Vec<Struct> = Vec::new();
        let mut unions: Vec<Union> = Vec::new();

        for (_, declaration) in self.declarations {
            match declaration {
                Declaration::Struct(s) => structs.push(s),
                Declaration::Enum(e) => enums.push(e),
                Declaration::Union(u) => unions.push(u),
            }
        }

        let file = IdlFile {
            package,
            imports: self.imports.into_iter().collect(),
            enums,
            structs,
            unions,
            services,
            options,
        };
        (file, self.collisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi2idl_common::{
        DeclarationKind, EnumLiteral, EnumValue, Field, FieldType, Scalar,
    };

    fn status_enum(values: &[&str]) -> Declaration {
        Declaration::Enum(Enum {
            name: "Status".to_string(),
            description: None,
            values: values
                .iter()
                .enumerate()
                .map(|(index, v)| EnumValue {
                    index,
                    name: v.to_string(),
                    value: EnumLiteral::Str(v.to_string()),
                })
                .collect(),
            options: vec![],
        })
    }

    fn pet(fields: &[&str]) -> Declaration {
        let mut s = Struct::new("Pet");
        for name in fields {
            s.add_field(Field::new(*name, FieldType::Scalar(Scalar::String)));
        }
        Declaration::Struct(s)
    }

    #[test]
    fn test_struct_merge_is_union_by_name() {
        let mut registry = DeclarationRegistry::new();
        registry.register(pet(&["id", "name"]));
        registry.register(pet(&["name", "tag"]));
        registry.register(pet(&["id", "name"]));

        assert_eq!(registry.len(), 1);
        match registry.get("Pet") {
            Some(Declaration::Struct(s)) => {
                let names: Vec<&str> = s.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["id", "name", "tag"]);
            }
            other => panic!("expected struct, got {:?}", other),
        }
        assert!(registry.collisions().is_empty());
    }

    #[test]
    fn test_enum_first_write_wins_and_reports() {
        let mut registry = DeclarationRegistry::new();
        registry.register(status_enum(&["A", "B"]));
        registry.register(status_enum(&["A", "B"]));
        assert!(registry.collisions().is_empty());

        registry.register(status_enum(&["C"]));
        assert_eq!(registry.collisions().len(), 1);
        assert_eq!(registry.collisions()[0].incoming, DeclarationKind::Enum);

        match registry.get("Status") {
            Some(Declaration::Enum(e)) => assert_eq!(e.values.len(), 2),
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_imports_deduplicated_in_order() {
        let mut registry = DeclarationRegistry::new();
        registry.add_import("api.proto");
        registry.add_import("google/protobuf/empty.proto");
        registry.add_import("api.proto");

        let imports: Vec<&str> = registry.imports().collect();
        assert_eq!(imports, vec!["api.proto", "google/protobuf/empty.proto"]);
    }

    #[test]
    fn test_into_file_splits_kinds() {
        let mut registry = DeclarationRegistry::new();
        registry.register(pet(&["id"]));
        registry.register(status_enum(&["A"]));

        let (file, collisions) = registry.into_file("pets".to_string(), vec![], vec![]);
        assert!(collisions.is_empty());
        assert_eq!(file.package, "pets");
        assert!(file.find_struct("Pet").is_some());
        assert!(file.find_enum("Status").is_some());
        assert!(file.unions.is_empty());
    }
}
