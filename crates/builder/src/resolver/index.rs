// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use core_model::types::ModelIndex;

use crate::{ast::ast_types::AstAnnotation, error::ParserError};

use super::{FieldDraft, Resolver};

impl Resolver<'_> {
    /// `@@unique([a, b])` or `@@index([a, b], name: "by_a_b")` over persisted fields of the model
    pub(super) fn model_index(
        &self,
        model_name: &str,
        annotation: &AstAnnotation,
        fields: &[FieldDraft],
    ) -> Result<ModelIndex, ParserError> {
        let invalid = |message: String| ParserError::InvalidIndex {
            message,
            location: self.location(annotation.span),
        };

        let mut index_fields = None;
        let mut name = None;
        for (position, arg) in annotation.args().iter().enumerate() {
            match (arg.name.as_deref(), position) {
                (None, 0) | (Some("fields"), _) if index_fields.is_none() => {
                    index_fields = Some(self.identifier_list(annotation, &arg.value)?);
                }
                (Some("name"), _) if name.is_none() => {
                    let value = arg.value.as_string().ok_or_else(|| {
                        invalid(format!("`name` of `@@{}` must be a string", annotation.name))
                    })?;
                    name = Some(value.to_string());
                }
                _ => {
                    return Err(invalid(format!(
                        "Unexpected `@@{}` argument `{arg}`",
                        annotation.name
                    )));
                }
            }
        }

        let index_fields = match index_fields {
            Some(index_fields) if !index_fields.is_empty() => index_fields,
            _ => {
                return Err(invalid(format!(
                    "`@@{}` expects a non-empty list of fields",
                    annotation.name
                )));
            }
        };

        let mut seen = HashSet::new();
        for (field_name, span) in &index_fields {
            let invalid_field = |message: String| ParserError::InvalidIndex {
                message,
                location: self.location(*span),
            };

            let field = fields
                .iter()
                .find(|field| &field.name == field_name)
                .ok_or_else(|| {
                    invalid_field(format!(
                        "Field `{field_name}` does not exist on model `{model_name}`"
                    ))
                })?;
            if !field.kind.is_persisted() {
                return Err(invalid_field(format!(
                    "Relation field `{model_name}.{field_name}` cannot be indexed"
                )));
            }
            if !seen.insert(field_name.as_str()) {
                return Err(invalid_field(format!(
                    "Field `{field_name}` appears more than once"
                )));
            }
        }

        Ok(ModelIndex {
            fields: index_fields.into_iter().map(|(name, _)| name).collect(),
            unique: annotation.name == "unique",
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::build_system_from_str;
    use core_model::types::ModelIndex;
    use multiplatform_test::multiplatform_test;

    fn model_src(attributes: &str) -> String {
        format!(
            "model A {{\n  id    String @id\n  first String\n  last  String\n  bs    B[]\n{attributes}\n}}\nmodel B {{\n  id String @id\n  a_id String\n  a A @relation(fields: [a_id], references: [id])\n}}"
        )
    }

    fn error_of(attributes: &str) -> String {
        match build_system_from_str(&model_src(attributes), "input.prisma".to_string()) {
            Ok(graph) => panic!("Expected an error, got {graph:?}"),
            Err(err) => err.to_string(),
        }
    }

    #[multiplatform_test]
    fn compound_indexes() {
        let graph = build_system_from_str(
            &model_src("  @@unique([first, last])\n  @@index([last], name: \"by_last\")"),
            "input.prisma".to_string(),
        )
        .unwrap();

        assert_eq!(
            graph.model("A").unwrap().1.indexes,
            vec![
                ModelIndex {
                    fields: vec!["first".to_string(), "last".to_string()],
                    unique: true,
                    name: None,
                },
                ModelIndex {
                    fields: vec!["last".to_string()],
                    unique: false,
                    name: Some("by_last".to_string()),
                },
            ]
        );
    }

    #[multiplatform_test]
    fn invalid_indexes() {
        assert_eq!(
            error_of("  @@unique([first, middle])"),
            "input.prisma:6:20: invalid index: Field `middle` does not exist on model `A`"
        );
        assert_eq!(
            error_of("  @@index([bs])"),
            "input.prisma:6:12: invalid index: Relation field `A.bs` cannot be indexed"
        );
        assert_eq!(
            error_of("  @@index([last, last])"),
            "input.prisma:6:18: invalid index: Field `last` appears more than once"
        );
        assert_eq!(
            error_of("  @@unique([])"),
            "input.prisma:6:3: invalid index: `@@unique` expects a non-empty list of fields"
        );
        assert_eq!(
            error_of("  @@unique([first])\n  @@unique([first])"),
            "input.prisma:7:3: invalid index: Duplicate `@@unique` on the same fields"
        );
        assert_eq!(
            error_of("  @@index([first], unique: true)"),
            "input.prisma:6:3: invalid index: Unexpected `@@index` argument `unique: true`"
        );
    }
}
