// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use core_model::{
    mapped_arena::MappedArena,
    scalar_type::ScalarType,
    types::{EnumType, EnumValue},
};

use crate::{ast::ast_types::AstSchema, error::ParserError};

use super::Resolver;

impl Resolver<'_> {
    /// Pass 1, before models: register every enum. Enums share one namespace with models and
    /// scalar types.
    pub(super) fn register_enums(
        &self,
        ast: &AstSchema,
    ) -> Result<MappedArena<EnumType>, ParserError> {
        let mut enums = MappedArena::default();

        for ast_enum in ast.enums() {
            if enums.get_by_key(&ast_enum.name).is_some()
                || ScalarType::from_name(&ast_enum.name).is_some()
            {
                return Err(ParserError::DuplicateType {
                    name: ast_enum.name.clone(),
                    location: self.location(ast_enum.name_span),
                });
            }
            if ast_enum.values.is_empty() {
                return Err(ParserError::InvalidEnum {
                    message: format!("Enum `{}` must declare at least one value", ast_enum.name),
                    location: self.location(ast_enum.name_span),
                });
            }

            let mut seen = HashSet::new();
            for value in &ast_enum.values {
                if !seen.insert(value.name.as_str()) {
                    return Err(ParserError::InvalidEnum {
                        message: format!(
                            "Duplicate value `{}` in enum `{}`",
                            value.name, ast_enum.name
                        ),
                        location: self.location(value.span),
                    });
                }
            }

            enums.add(
                &ast_enum.name,
                EnumType {
                    name: ast_enum.name.clone(),
                    values: ast_enum
                        .values
                        .iter()
                        .map(|value| EnumValue {
                            name: value.name.clone(),
                            doc: value.doc.clone(),
                        })
                        .collect(),
                    doc: ast_enum.doc.clone(),
                },
            );
        }

        Ok(enums)
    }
}

#[cfg(test)]
mod tests {
    use crate::{build_system_from_str, error::ParserError};
    use core_model::{
        schema::SchemaGraph,
        types::{DefaultLiteral, DefaultPolicy, FieldKind},
    };
    use multiplatform_test::multiplatform_test;

    const ROLE: &str = "/// Access level\nenum Role {\n  USER\n  /// Full access\n  ADMIN\n}\n";

    fn build(src: &str) -> Result<SchemaGraph, ParserError> {
        build_system_from_str(src, "input.prisma".to_string())
    }

    fn error_of(src: &str) -> String {
        match build(src) {
            Ok(graph) => panic!("Expected an error, got {graph:?}"),
            Err(err) => err.to_string(),
        }
    }

    #[multiplatform_test]
    fn enum_fields() {
        let graph = build(&format!(
            "{ROLE}model A {{\n  id    String @id\n  role  Role   @default(USER) @map(\"r\")\n  roles Role[]\n  old   Role?\n}}"
        ))
        .unwrap();

        let role = graph.enum_type("Role").unwrap();
        assert_eq!(role.doc.as_deref(), Some("Access level"));
        assert!(role.has_value("ADMIN") && !role.has_value("GUEST"));
        assert_eq!(role.values[1].doc.as_deref(), Some("Full access"));

        let model = graph.model("A").unwrap().1;
        let field = model.field("role").unwrap();
        assert_eq!(field.kind, FieldKind::Enum("Role".to_string()));
        assert_eq!(field.storage_name, "r");
        assert_eq!(
            field.default,
            DefaultPolicy::Literal(DefaultLiteral::String("USER".to_string()))
        );
        assert!(field.is_persisted());
        assert_eq!(graph.field_enum(field), Some(role));

        assert!(model.field("roles").unwrap().list);
        assert!(model.field("old").unwrap().nullable);
    }

    #[multiplatform_test]
    fn duplicate_types() {
        assert_eq!(
            error_of(&format!("{ROLE}{ROLE}")),
            "input.prisma:8:6: duplicate type `Role`"
        );
        assert_eq!(
            error_of("enum Int {\n  ONE\n}"),
            "input.prisma:1:6: duplicate type `Int`"
        );
        assert_eq!(
            error_of(&format!("{ROLE}model Role {{\n  id String @id\n}}")),
            "input.prisma:7:7: duplicate type `Role`"
        );
    }

    #[multiplatform_test]
    fn invalid_enums() {
        assert_eq!(
            error_of("enum Role {\n  USER\n  USER\n}"),
            "input.prisma:3:3: invalid enum: Duplicate value `USER` in enum `Role`"
        );
        assert_eq!(
            error_of("enum Role {\n}"),
            "input.prisma:1:6: invalid enum: Enum `Role` must declare at least one value"
        );
    }

    #[multiplatform_test]
    fn enum_field_attributes() {
        let model = |field: &str| format!("{ROLE}model A {{\n  id String @id\n  {field}\n}}");

        assert_eq!(
            error_of(&model("role Role @default(GUEST)")),
            "input.prisma:9:13: invalid default value: `GUEST` is not a value of enum `Role`"
        );
        assert_eq!(
            error_of(&model("role Role @default(\"USER\")")),
            "input.prisma:9:13: invalid default value: `\"USER\"` is not a value of enum `Role`"
        );
        assert_eq!(
            error_of(&model("role Role @id")),
            "input.prisma:9:13: invalid attribute: `@id` requires a non-optional scalar field"
        );
        assert_eq!(
            error_of(&model("role Role @db.String")),
            "input.prisma:9:13: invalid attribute: `@db.String` only applies to scalar fields"
        );
        assert!(build(&model("role Role @unique")).unwrap().model("A").unwrap().1.field("role").unwrap().unique);
    }
}
