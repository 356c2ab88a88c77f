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
    scalar_type::ScalarType,
    types::{DefaultLiteral, DefaultPolicy, EnumType, IDENTIFIER_HINT},
};

use crate::{
    ast::ast_types::{AstAnnotation, AstExpr, AstField, AstTypeModifier},
    error::ParserError,
};

use super::{FieldDraft, FieldDraftKind, RelationAnnotation, Resolver};

const DB_PREFIX: &str = "db.";

impl Resolver<'_> {
    pub(super) fn field_draft<'a>(&self, ast_field: &'a AstField) -> Result<FieldDraft<'a>, ParserError> {
        let type_name = &ast_field.typ.name;
        let enum_type = self.enums.get_by_key(type_name);
        let kind = match (ScalarType::from_name(type_name), enum_type) {
            (Some(typ), _) => FieldDraftKind::Scalar(typ),
            (None, Some(_)) => FieldDraftKind::Enum(type_name.clone()),
            (None, None) => FieldDraftKind::Model(type_name.clone()),
        };
        let scalar_type = match &kind {
            FieldDraftKind::Scalar(typ) => Some(*typ),
            FieldDraftKind::Enum(_) | FieldDraftKind::Model(_) => None,
        };
        let persisted = kind.is_persisted();

        let mut draft = FieldDraft {
            name: ast_field.name.clone(),
            ast: Some(ast_field),
            storage_name: ast_field.name.clone(),
            kind,
            nullable: ast_field.typ.modifier == AstTypeModifier::Optional,
            list: ast_field.typ.modifier == AstTypeModifier::List,
            default: DefaultPolicy::None,
            unique: false,
            is_id: false,
            native_type: None,
            relation_annotation: None,
            relation_id: None,
            doc: ast_field.doc.clone(),
        };

        let mut seen = HashSet::new();
        for annotation in &ast_field.annotations {
            if !seen.insert(annotation.name.as_str()) {
                return Err(self.invalid_attribute(
                    format!("Duplicate attribute `@{}`", annotation.name),
                    annotation,
                ));
            }

            match (annotation.name.as_str(), scalar_type) {
                ("id", Some(_)) if !draft.nullable && !draft.list => {
                    self.expect_no_args(annotation)?;
                    draft.is_id = true;
                }
                ("id", _) => {
                    return Err(self.invalid_attribute(
                        "`@id` requires a non-optional scalar field".to_string(),
                        annotation,
                    ));
                }
                ("unique", _) if persisted && !draft.list => {
                    self.expect_no_args(annotation)?;
                    draft.unique = true;
                }
                ("unique", _) => {
                    return Err(self.invalid_attribute(
                        "`@unique` requires a scalar field".to_string(),
                        annotation,
                    ));
                }
                ("default", Some(typ)) if !draft.list => {
                    draft.default = self.default_policy(annotation, typ)?;
                }
                ("default", None) if !draft.list && enum_type.is_some() => {
                    if let Some(enum_type) = enum_type {
                        draft.default = self.enum_default(annotation, enum_type)?;
                    }
                }
                ("default", _) => {
                    return Err(ParserError::InvalidDefault {
                        message: format!(
                            "`@default` is not supported on field `{}` of type `{}`",
                            ast_field.name, ast_field.typ.name
                        ),
                        location: self.location(annotation.span),
                    });
                }
                ("map", _) if persisted => {
                    let storage_name = self.single_string_arg(annotation)?;
                    if storage_name.is_empty() {
                        return Err(self.invalid_attribute(
                            "`@map` requires a non-empty name".to_string(),
                            annotation,
                        ));
                    }
                    draft.storage_name = storage_name;
                }
                ("map", _) => {
                    return Err(self.invalid_attribute(
                        "`@map` only applies to scalar fields".to_string(),
                        annotation,
                    ));
                }
                ("relation", _) if !persisted => {
                    draft.relation_annotation = Some(self.relation_annotation(annotation)?);
                }
                ("relation", _) => {
                    let kind = if enum_type.is_some() { "an enum" } else { "a scalar" };
                    return Err(self.invalid_attribute(
                        format!(
                            "`@relation` only applies to fields of a model type, `{}` is {kind}",
                            ast_field.typ.name
                        ),
                        annotation,
                    ));
                }
                (name, Some(typ)) if name.starts_with(DB_PREFIX) => {
                    let hint = &name[DB_PREFIX.len()..];
                    if hint == IDENTIFIER_HINT {
                        self.expect_no_args(annotation)?;
                        if typ != ScalarType::String {
                            return Err(self.invalid_attribute(
                                format!("`@db.{IDENTIFIER_HINT}` requires a String field"),
                                annotation,
                            ));
                        }
                    }
                    draft.native_type = Some(native_type(hint, annotation));
                }
                (name, None) if name.starts_with(DB_PREFIX) => {
                    return Err(self.invalid_attribute(
                        format!("`@{name}` only applies to scalar fields"),
                        annotation,
                    ));
                }
                (name, _) => {
                    return Err(
                        self.invalid_attribute(format!("Unknown attribute `@{name}`"), annotation)
                    );
                }
            }
        }

        Ok(draft)
    }

    fn invalid_attribute(&self, message: String, annotation: &AstAnnotation) -> ParserError {
        ParserError::InvalidAttribute {
            message,
            location: self.location(annotation.span),
        }
    }

    fn expect_no_args(&self, annotation: &AstAnnotation) -> Result<(), ParserError> {
        if annotation.args().is_empty() {
            Ok(())
        } else {
            Err(self.invalid_attribute(
                format!("`@{}` does not take arguments", annotation.name),
                annotation,
            ))
        }
    }

    /// `@default(VALUE)` on an enum field
    fn enum_default(
        &self,
        annotation: &AstAnnotation,
        enum_type: &EnumType,
    ) -> Result<DefaultPolicy, ParserError> {
        let invalid = |message: String| ParserError::InvalidDefault {
            message,
            location: self.location(annotation.span),
        };

        match annotation.args() {
            [arg] if arg.name.is_none() => match arg.value.as_identifier() {
                Some(value) if enum_type.has_value(value) => Ok(DefaultPolicy::Literal(
                    DefaultLiteral::String(value.to_string()),
                )),
                _ => Err(invalid(format!(
                    "`{}` is not a value of enum `{}`",
                    arg.value, enum_type.name
                ))),
            },
            _ => Err(invalid("`@default` takes exactly one argument".to_string())),
        }
    }

    /// The single string argument of `@map("...")` or `@@map("...")`
    pub(super) fn single_string_arg(&self, annotation: &AstAnnotation) -> Result<String, ParserError> {
        match annotation.args() {
            [arg] if arg.name.is_none() => match arg.value.as_string() {
                Some(value) => Ok(value.to_string()),
                None => Err(self.invalid_attribute(
                    format!("`{}` expects a string argument", annotation.name),
                    annotation,
                )),
            },
            _ => Err(self.invalid_attribute(
                format!("`{}` expects exactly one argument", annotation.name),
                annotation,
            )),
        }
    }

    fn default_policy(
        &self,
        annotation: &AstAnnotation,
        typ: ScalarType,
    ) -> Result<DefaultPolicy, ParserError> {
        let invalid = |message: String| ParserError::InvalidDefault {
            message,
            location: self.location(annotation.span),
        };

        let expr = match annotation.args() {
            [arg] if arg.name.is_none() => &arg.value,
            _ => return Err(invalid("`@default` takes exactly one argument".to_string())),
        };
        let mismatch = || {
            invalid(format!(
                "Default value `{expr}` does not match field type `{typ}`"
            ))
        };

        match expr {
            AstExpr::Call { name, args, .. } => {
                if !args.is_empty() {
                    return Err(invalid(format!("`{name}()` does not take arguments")));
                }
                let (policy, required_type) = match name.as_str() {
                    "auto" => (DefaultPolicy::GeneratedId, ScalarType::String),
                    "uuid" => (DefaultPolicy::Uuid, ScalarType::String),
                    "now" => (DefaultPolicy::Now, ScalarType::DateTime),
                    _ => return Err(invalid(format!("Unknown default function `{name}()`"))),
                };
                if typ != required_type {
                    return Err(invalid(format!(
                        "`{name}()` requires a field of type `{required_type}`"
                    )));
                }
                Ok(policy)
            }
            AstExpr::StringLiteral(value, _) if typ == ScalarType::String => {
                Ok(DefaultPolicy::Literal(DefaultLiteral::String(value.clone())))
            }
            AstExpr::NumberLiteral(value, _) => match typ {
                ScalarType::Int | ScalarType::BigInt => value
                    .parse()
                    .map(|value| DefaultPolicy::Literal(DefaultLiteral::Int(value)))
                    .map_err(|_| mismatch()),
                ScalarType::Float => value
                    .parse()
                    .map(|value| DefaultPolicy::Literal(DefaultLiteral::Float(value)))
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            AstExpr::BooleanLiteral(value, _) if typ == ScalarType::Boolean => {
                Ok(DefaultPolicy::Literal(DefaultLiteral::Boolean(*value)))
            }
            AstExpr::StringLiteral(..) | AstExpr::BooleanLiteral(..) => Err(mismatch()),
            AstExpr::Identifier(..) | AstExpr::Array(..) => {
                Err(invalid(format!("Unsupported default value `{expr}`")))
            }
        }
    }

    fn relation_annotation(
        &self,
        annotation: &AstAnnotation,
    ) -> Result<RelationAnnotation, ParserError> {
        let mut relation = RelationAnnotation {
            name: None,
            fields: None,
            references: None,
            span: annotation.span,
        };

        for (index, arg) in annotation.args().iter().enumerate() {
            match arg.name.as_deref() {
                None | Some("name") if relation.name.is_none() => {
                    let positional_ok = arg.name.is_some() || index == 0;
                    match arg.value.as_string() {
                        Some(name) if positional_ok => relation.name = Some(name.to_string()),
                        _ => {
                            return Err(self.invalid_attribute(
                                format!("Unexpected `@relation` argument `{arg}`"),
                                annotation,
                            ));
                        }
                    }
                }
                Some("fields") if relation.fields.is_none() => {
                    relation.fields = Some(self.identifier_list(annotation, &arg.value)?);
                }
                Some("references") if relation.references.is_none() => {
                    relation.references = Some(self.identifier_list(annotation, &arg.value)?);
                }
                Some(name @ ("name" | "fields" | "references")) => {
                    return Err(self.invalid_attribute(
                        format!("Duplicate `@relation` argument `{name}`"),
                        annotation,
                    ));
                }
                _ => {
                    return Err(self.invalid_attribute(
                        format!("Unexpected `@relation` argument `{arg}`"),
                        annotation,
                    ));
                }
            }
        }

        Ok(relation)
    }

    pub(super) fn identifier_list(
        &self,
        annotation: &AstAnnotation,
        value: &AstExpr,
    ) -> Result<Vec<(String, codemap::Span)>, ParserError> {
        let invalid = || {
            self.invalid_attribute(
                format!("Expected a list of field names, found `{value}`"),
                annotation,
            )
        };

        match value {
            AstExpr::Array(elems, _) => elems
                .iter()
                .map(|elem| {
                    elem.as_identifier()
                        .map(|name| (name.to_string(), elem.span()))
                        .ok_or_else(invalid)
                })
                .collect(),
            _ => Err(invalid()),
        }
    }
}

/// `@db.VarChar(5)` is kept as `VarChar(5)`
fn native_type(hint: &str, annotation: &AstAnnotation) -> String {
    match annotation.args() {
        [] => hint.to_string(),
        args => format!(
            "{hint}({})",
            args.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::{build_system_from_str, error::ParserError};
    use core_model::{
        scalar_type::ScalarType,
        types::{DefaultLiteral, DefaultPolicy, FieldKind},
    };
    use multiplatform_test::multiplatform_test;

    fn model_src(fields: &str) -> String {
        format!("model A {{\n  id String @id\n{fields}\n}}")
    }

    fn error_of(fields: &str) -> String {
        match build_system_from_str(&model_src(fields), "input.prisma".to_string()) {
            Ok(graph) => panic!("Expected an error, got {graph:?}"),
            Err(err) => err.to_string(),
        }
    }

    #[multiplatform_test]
    fn defaults() {
        let graph = build_system_from_str(
            &model_src(
                r#"  token   String   @default(uuid())
  created DateTime @default(now())
  count   Int      @default(-3)
  ratio   Float    @default(1)
  flag    Boolean  @default(true)
  label   String?  @default("none")"#,
            ),
            "input.prisma".to_string(),
        )
        .unwrap();

        let model = graph.model("A").unwrap().1;
        let defaults: Vec<_> = model
            .fields
            .iter()
            .map(|field| field.default.clone())
            .collect();
        assert_eq!(
            defaults,
            vec![
                DefaultPolicy::None,
                DefaultPolicy::Uuid,
                DefaultPolicy::Now,
                DefaultPolicy::Literal(DefaultLiteral::Int(-3)),
                DefaultPolicy::Literal(DefaultLiteral::Float(1.0)),
                DefaultPolicy::Literal(DefaultLiteral::Boolean(true)),
                DefaultPolicy::Literal(DefaultLiteral::String("none".to_string())),
            ]
        );
        assert_eq!(
            model.field("created").unwrap().kind,
            FieldKind::Scalar(ScalarType::DateTime)
        );
    }

    #[multiplatform_test]
    fn invalid_defaults() {
        assert_eq!(
            error_of("  n Int @default(auto())"),
            "input.prisma:3:9: invalid default value: `auto()` requires a field of type `String`"
        );
        assert_eq!(
            error_of("  n Int @default(\"x\")"),
            "input.prisma:3:9: invalid default value: Default value `\"x\"` does not match field type `Int`"
        );
        assert_eq!(
            error_of("  n Int @default(1.5)"),
            "input.prisma:3:9: invalid default value: Default value `1.5` does not match field type `Int`"
        );
        assert_eq!(
            error_of("  n String @default(cuid())"),
            "input.prisma:3:12: invalid default value: Unknown default function `cuid()`"
        );
    }

    #[multiplatform_test]
    fn invalid_attributes() {
        assert_eq!(
            error_of("  n String @index"),
            "input.prisma:3:12: invalid attribute: Unknown attribute `@index`"
        );
        assert_eq!(
            error_of("  n Int @db.ObjectId"),
            "input.prisma:3:9: invalid attribute: `@db.ObjectId` requires a String field"
        );
        assert_eq!(
            error_of("  n String @unique @unique"),
            "input.prisma:3:20: invalid attribute: Duplicate attribute `@unique`"
        );
        assert_eq!(
            error_of("  n String @map(1)"),
            "input.prisma:3:12: invalid attribute: `map` expects a string argument"
        );
        assert_eq!(
            error_of("  n String? @id"),
            "input.prisma:3:13: invalid attribute: `@id` requires a non-optional scalar field"
        );
        assert_eq!(
            error_of("  n String @relation(fields: [n], references: [id])"),
            "input.prisma:3:12: invalid attribute: `@relation` only applies to fields of a model type, `String` is a scalar"
        );
    }

    #[multiplatform_test]
    fn storage_hints_and_mapping() {
        let graph = build_system_from_str(
            &model_src("  email String @unique @map(\"mail\") @db.String\n  tags String[]"),
            "input.prisma".to_string(),
        )
        .unwrap();

        let model = graph.model("A").unwrap().1;
        let email = model.field("email").unwrap();
        assert!(email.unique);
        assert_eq!(email.storage_name, "mail");
        assert_eq!(email.native_type.as_deref(), Some("String"));
        assert!(!email.is_identifier());

        let tags = model.field("tags").unwrap();
        assert!(tags.list && tags.is_persisted());
    }

    #[multiplatform_test]
    fn storage_hints_with_arguments() {
        let graph = build_system_from_str(
            &model_src("  code String @db.VarChar(5)
  price Float @db.Decimal(10, 2)"),
            "input.prisma".to_string(),
        )
        .unwrap();

        let model = graph.model("A").unwrap().1;
        assert_eq!(
            model.field("code").unwrap().native_type.as_deref(),
            Some("VarChar(5)")
        );
        assert_eq!(
            model.field("price").unwrap().native_type.as_deref(),
            Some("Decimal(10, 2)")
        );

        assert_eq!(
            error_of("  n String @db.ObjectId(12)"),
            "input.prisma:3:12: invalid attribute: `@db.ObjectId` does not take arguments"
        );
    }

    #[multiplatform_test]
    fn field_docs() {
        let graph = build_system_from_str(
            "model A {\n  /// Primary key\n  id String @id\n  name String\n}",
            "input.prisma".to_string(),
        )
        .unwrap();

        let model = graph.model("A").unwrap().1;
        assert_eq!(model.field("id").unwrap().doc.as_deref(), Some("Primary key"));
        assert_eq!(model.field("name").unwrap().doc, None);
    }

    #[multiplatform_test]
    fn syntax_errors_surface_unchanged() {
        let err = build_system_from_str("model A {", "input.prisma".to_string()).unwrap_err();
        assert!(matches!(err, ParserError::Syntax { .. }));
    }
}
