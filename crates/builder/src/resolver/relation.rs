// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use codemap::Span;
use core_model::types::{DefaultPolicy, IDENTIFIER_HINT, RelationId};
use heck::ToLowerCamelCase;

use crate::error::ParserError;

use super::{FieldDraft, FieldDraftKind, ModelDraft, RelationDraft, Resolver};

impl Resolver<'_> {
    /// Pass 3: wire every to-one model field through its `@relation(fields: [..], references: [..])`.
    pub(super) fn resolve_relations(
        &self,
        models: &mut [ModelDraft],
    ) -> Result<Vec<RelationDraft>, ParserError> {
        let mut relations = vec![];
        let mut used_foreign_keys = HashSet::new();

        for owner_index in 0..models.len() {
            for field_index in 0..models[owner_index].fields.len() {
                let field = &models[owner_index].fields[field_index];
                let FieldDraftKind::Model(target_name) = &field.kind else {
                    continue;
                };
                if field.list {
                    continue;
                }

                let target_index = models
                    .iter()
                    .position(|model| model.name() == target_name)
                    .ok_or_else(|| {
                        // Pass 2 has already reported unknown models
                        self.invalid_foreign_key(
                            format!("Unknown relation target `{target_name}`"),
                            field.span(),
                        )
                    })?;

                let relation = self.relation_draft(
                    &models[owner_index],
                    field,
                    owner_index,
                    &models[target_index],
                    target_index,
                )?;

                if !used_foreign_keys.insert((owner_index, relation.fk_field.clone())) {
                    return Err(self.invalid_foreign_key(
                        format!(
                            "Foreign key `{}` is already used by another relation",
                            relation.fk_field
                        ),
                        field.span(),
                    ));
                }

                models[owner_index].fields[field_index].relation_id =
                    Some(RelationId(relations.len()));
                relations.push(relation);
            }
        }

        Ok(relations)
    }

    fn relation_draft(
        &self,
        owner: &ModelDraft,
        field: &FieldDraft,
        owner_index: usize,
        target: &ModelDraft,
        target_index: usize,
    ) -> Result<RelationDraft, ParserError> {
        let (fields, references, annotation_span) = match &field.relation_annotation {
            Some(annotation) => match (&annotation.fields, &annotation.references) {
                (Some(fields), Some(references)) => (fields, references, annotation.span),
                _ => return Err(self.missing_relation_wiring(field)),
            },
            None => return Err(self.missing_relation_wiring(field)),
        };

        let ((fk_name, fk_span), (referenced_name, referenced_span)) =
            match (fields.as_slice(), references.as_slice()) {
                ([fk], [referenced]) => (fk, referenced),
                _ => {
                    return Err(self.invalid_foreign_key(
                        "Relations must name exactly one field in `fields` and one in `references`"
                            .to_string(),
                        Some(annotation_span),
                    ));
                }
            };

        let fk = owner.field(fk_name).ok_or_else(|| {
            self.invalid_foreign_key(
                format!(
                    "Field `{fk_name}` does not exist on model `{}`",
                    owner.name()
                ),
                Some(*fk_span),
            )
        })?;
        let fk_type = match &fk.kind {
            FieldDraftKind::Scalar(typ) if !fk.list => *typ,
            _ => {
                return Err(self.invalid_foreign_key(
                    format!("Foreign key `{fk_name}` must be a single scalar field"),
                    Some(*fk_span),
                ));
            }
        };

        let referenced = target.field(referenced_name).ok_or_else(|| {
            self.invalid_foreign_key(
                format!(
                    "Field `{referenced_name}` does not exist on model `{}`",
                    target.name()
                ),
                Some(*referenced_span),
            )
        })?;
        if referenced.name != target.pk_field {
            return Err(self.invalid_foreign_key(
                format!(
                    "`references` must name the primary key `{}` of model `{}`",
                    target.pk_field,
                    target.name()
                ),
                Some(*referenced_span),
            ));
        }

        if referenced.kind != FieldDraftKind::Scalar(fk_type) {
            let referenced_type = referenced.kind.type_name();
            return Err(self.invalid_foreign_key(
                format!(
                    "Foreign key `{fk_name}` has type `{fk_type}`, but `{}.{}` has type `{referenced_type}`",
                    target.name(),
                    referenced.name
                ),
                Some(*fk_span),
            ));
        }

        let is_identifier =
            |field: &FieldDraft| field.native_type.as_deref() == Some(IDENTIFIER_HINT);
        if is_identifier(fk) != is_identifier(referenced) {
            return Err(self.invalid_foreign_key(
                format!(
                    "Foreign key `{fk_name}` and `{}.{}` must agree on `@db.{IDENTIFIER_HINT}`",
                    target.name(),
                    referenced.name
                ),
                Some(*fk_span),
            ));
        }

        if fk.default == DefaultPolicy::GeneratedId {
            return Err(self.invalid_foreign_key(
                format!("Foreign key `{fk_name}` cannot use a generated default"),
                Some(*fk_span),
            ));
        }

        if field.nullable != fk.nullable {
            let message = if field.nullable {
                format!(
                    "Relation field `{}` is optional, so foreign key `{fk_name}` must be optional too",
                    field.name
                )
            } else {
                format!(
                    "Relation field `{}` is required, so foreign key `{fk_name}` must be required too",
                    field.name
                )
            };
            return Err(self.invalid_foreign_key(message, field.span()));
        }

        Ok(RelationDraft {
            name: field
                .relation_annotation
                .as_ref()
                .and_then(|annotation| annotation.name.clone()),
            owner: owner_index,
            target: target_index,
            fk_field: fk.name.clone(),
            referenced_field: referenced.name.clone(),
            relation_field: field.name.clone(),
            back_field: String::new(),
            required: !fk.nullable,
            span: field.span().unwrap_or(annotation_span),
        })
    }

    /// Pass 4: give every relation a back-collection on its target model.
    ///
    /// A declared list field of the owning model's type is adopted when its relation name matches
    /// (both unnamed, or both naming the same relation). Otherwise a field is synthesized.
    pub(super) fn attach_back_collections(
        &self,
        models: &mut [ModelDraft],
        relations: &mut [RelationDraft],
    ) -> Result<(), ParserError> {
        for model in models.iter() {
            for field in model.fields.iter().filter(|field| field.list) {
                if let (FieldDraftKind::Model(_), Some(annotation)) =
                    (&field.kind, &field.relation_annotation)
                    && (annotation.fields.is_some() || annotation.references.is_some())
                {
                    return Err(self.invalid_foreign_key(
                        format!(
                            "Back-collection `{}` cannot declare `fields` or `references`",
                            field.name
                        ),
                        Some(annotation.span),
                    ));
                }
            }
        }

        for (index, relation) in relations.iter_mut().enumerate() {
            let owner_name = models[relation.owner].name().to_string();
            let target = &mut models[relation.target];

            let candidates: Vec<usize> = target
                .fields
                .iter()
                .enumerate()
                .filter(|(_, field)| {
                    field.list
                        && field.relation_id.is_none()
                        && field.kind == FieldDraftKind::Model(owner_name.clone())
                        && field
                            .relation_annotation
                            .as_ref()
                            .and_then(|annotation| annotation.name.as_ref())
                            == relation.name.as_ref()
                })
                .map(|(field_index, _)| field_index)
                .collect();

            match candidates.as_slice() {
                [field_index] => {
                    let field = &mut target.fields[*field_index];
                    field.relation_id = Some(RelationId(index));
                    relation.back_field = field.name.clone();
                }
                [] => {
                    let name = back_collection_name(&owner_name);
                    if target.field(&name).is_some() {
                        return Err(ParserError::DuplicateField {
                            model: target.name().to_string(),
                            field: name,
                            location: self.location(relation.span),
                        });
                    }
                    target.fields.push(synthesized_field(
                        &name,
                        &owner_name,
                        RelationId(index),
                    ));
                    relation.back_field = name;
                }
                [_, second, ..] => {
                    return Err(self.invalid_foreign_key(
                        format!(
                            "Ambiguous back-collection for relation `{owner_name}.{}`: name the relation on both sides",
                            relation.relation_field
                        ),
                        target.fields[*second].span(),
                    ));
                }
            }
        }

        for model in models.iter() {
            for field in &model.fields {
                if let FieldDraftKind::Model(owner) = &field.kind
                    && field.list
                    && field.relation_id.is_none()
                {
                    return Err(self.invalid_foreign_key(
                        format!(
                            "No relation on model `{owner}` points back to `{}.{}`",
                            model.name(),
                            field.name
                        ),
                        field.span(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn missing_relation_wiring(&self, field: &FieldDraft) -> ParserError {
        self.invalid_foreign_key(
            format!(
                "Relation field `{}` must declare `@relation(fields: [...], references: [...])`",
                field.name
            ),
            field.span(),
        )
    }

    fn invalid_foreign_key(&self, message: String, span: Option<Span>) -> ParserError {
        ParserError::InvalidForeignKey {
            message,
            location: self.location(span.unwrap_or_else(|| self.fallback_span())),
        }
    }

    fn fallback_span(&self) -> Span {
        // Only synthesized fields lack a span, and they never carry relation wiring
        crate::ast::default_span()
    }
}

fn synthesized_field<'a>(name: &str, owner_name: &str, relation_id: RelationId) -> FieldDraft<'a> {
    FieldDraft {
        name: name.to_string(),
        ast: None,
        storage_name: name.to_string(),
        kind: FieldDraftKind::Model(owner_name.to_string()),
        nullable: false,
        list: true,
        default: DefaultPolicy::None,
        unique: false,
        is_id: false,
        native_type: None,
        relation_annotation: None,
        relation_id: Some(relation_id),
        doc: None,
    }
}

/// Name of a synthesized back-collection: the owning model's name in lower camel case, pluralized.
pub fn back_collection_name(owner_name: &str) -> String {
    let singular = owner_name.to_lower_camel_case();

    if singular.ends_with('s')
        || singular.ends_with('x')
        || singular.ends_with('z')
        || singular.ends_with("ch")
        || singular.ends_with("sh")
    {
        format!("{singular}es")
    } else if let Some(stem) = singular.strip_suffix('y')
        && stem
            .chars()
            .last()
            .is_some_and(|c| !"aeiou".contains(c.to_ascii_lowercase()))
    {
        format!("{stem}ies")
    } else {
        format!("{singular}s")
    }
}
