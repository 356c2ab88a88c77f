// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Turn a parsed schema into a validated [`SchemaGraph`].
//!
//! Resolution runs in a fixed sequence of passes, each over the whole schema:
//!
//! 1. register enums, then models, interpreting field and block attributes
//! 2. resolve model-typed fields against the registered models
//! 3. wire relations through their foreign keys
//! 4. attach (or synthesize) back-collections on the target models
//! 5. reject cycles among required relations
//!
//! The first error found stops resolution, so no partially validated graph is ever returned.

mod cycle;
mod enum_type;
mod field;
mod index;
mod relation;

use std::collections::HashSet;

use codemap::{CodeMap, Span};
use core_model::{
    mapped_arena::MappedArena,
    scalar_type::ScalarType,
    schema::{ConfigBlock, SchemaGraph},
    types::{
        DefaultPolicy, EnumType, Field, FieldKind, Model, ModelId, ModelIndex, Relation,
        RelationId,
    },
};
use tracing::instrument;

use crate::{
    ast::ast_types::{AstField, AstModel, AstSchema},
    error::{ParserError, SourceLocation},
};

#[instrument(name = "resolver::resolve", skip_all)]
pub fn resolve(ast: &AstSchema, codemap: &CodeMap) -> Result<SchemaGraph, ParserError> {
    let mut resolver = Resolver {
        codemap,
        enums: MappedArena::default(),
    };

    resolver.enums = resolver.register_enums(ast)?;
    let mut models = resolver.register_models(ast)?;
    resolver.resolve_model_references(&models)?;
    let mut relations = resolver.resolve_relations(&mut models)?;
    resolver.attach_back_collections(&mut models, &mut relations)?;
    resolver.check_required_cycles(&models, &relations)?;

    tracing::debug!(
        enums = resolver.enums.len(),
        models = models.len(),
        relations = relations.len(),
        "Schema resolved"
    );

    Ok(assemble(ast, resolver.enums, models, relations))
}

struct Resolver<'a> {
    codemap: &'a CodeMap,
    /// Registered before any model, so that field types can refer to them
    enums: MappedArena<EnumType>,
}

/// A model whose fields are being resolved
struct ModelDraft<'a> {
    ast: &'a AstModel,
    collection_name: String,
    pk_field: String,
    fields: Vec<FieldDraft<'a>>,
    indexes: Vec<ModelIndex>,
}

impl<'a> ModelDraft<'a> {
    fn name(&self) -> &str {
        &self.ast.name
    }

    fn field(&self, name: &str) -> Option<&FieldDraft<'a>> {
        self.fields.iter().find(|field| field.name == name)
    }
}

struct FieldDraft<'a> {
    name: String,
    /// `None` for synthesized back-collections
    ast: Option<&'a AstField>,
    storage_name: String,
    kind: FieldDraftKind,
    nullable: bool,
    list: bool,
    default: DefaultPolicy,
    unique: bool,
    is_id: bool,
    native_type: Option<String>,
    relation_annotation: Option<RelationAnnotation>,
    relation_id: Option<RelationId>,
    doc: Option<String>,
}

impl FieldDraft<'_> {
    fn span(&self) -> Option<Span> {
        self.ast.map(|ast| ast.span)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldDraftKind {
    Scalar(ScalarType),
    /// A field whose type names a declared enum
    Enum(String),
    /// A field whose type names a model
    Model(String),
}

impl FieldDraftKind {
    /// Type name as written in the schema
    fn type_name(&self) -> String {
        match self {
            FieldDraftKind::Scalar(typ) => typ.to_string(),
            FieldDraftKind::Enum(name) | FieldDraftKind::Model(name) => name.clone(),
        }
    }

    fn is_persisted(&self) -> bool {
        !matches!(self, FieldDraftKind::Model(_))
    }
}

/// Arguments of a `@relation(...)` attribute
struct RelationAnnotation {
    name: Option<String>,
    fields: Option<Vec<(String, Span)>>,
    references: Option<Vec<(String, Span)>>,
    span: Span,
}

struct RelationDraft {
    name: Option<String>,
    /// Index of the owning model in the draft list
    owner: usize,
    target: usize,
    fk_field: String,
    referenced_field: String,
    relation_field: String,
    back_field: String,
    required: bool,
    span: Span,
}

impl Resolver<'_> {
    fn location(&self, span: Span) -> SourceLocation {
        SourceLocation::from_codemap(self.codemap, span)
    }

    /// Pass 1: register every model and interpret the attributes of its fields.
    fn register_models<'a>(&self, ast: &'a AstSchema) -> Result<Vec<ModelDraft<'a>>, ParserError> {
        let mut seen = HashSet::new();
        let mut collections = HashSet::new();
        let mut models = vec![];

        for ast_model in ast.models() {
            if !seen.insert(ast_model.name.as_str())
                || ScalarType::from_name(&ast_model.name).is_some()
            {
                return Err(ParserError::DuplicateModel {
                    name: ast_model.name.clone(),
                    location: self.location(ast_model.name_span),
                });
            }
            if self.enums.get_by_key(&ast_model.name).is_some() {
                return Err(ParserError::DuplicateType {
                    name: ast_model.name.clone(),
                    location: self.location(ast_model.name_span),
                });
            }

            let model = self.register_model(ast_model)?;
            if !collections.insert(model.collection_name.clone()) {
                let span = ast_model
                    .annotation("map")
                    .map(|annotation| annotation.span)
                    .unwrap_or(ast_model.name_span);
                return Err(ParserError::DuplicateCollection {
                    collection: model.collection_name,
                    location: self.location(span),
                });
            }
            models.push(model);
        }

        Ok(models)
    }

    fn register_model<'a>(&self, ast_model: &'a AstModel) -> Result<ModelDraft<'a>, ParserError> {
        let mut collection_name = None;
        let mut index_annotations = vec![];
        for annotation in &ast_model.annotations {
            match annotation.name.as_str() {
                "map" if collection_name.is_none() => {
                    collection_name = Some(self.single_string_arg(annotation)?);
                }
                "map" => {
                    return Err(ParserError::InvalidAttribute {
                        message: "Duplicate attribute `@@map`".to_string(),
                        location: self.location(annotation.span),
                    });
                }
                "unique" | "index" => index_annotations.push(annotation),
                name => {
                    return Err(ParserError::InvalidAttribute {
                        message: format!("Unknown model attribute `@@{name}`"),
                        location: self.location(annotation.span),
                    });
                }
            }
        }

        let mut field_names = HashSet::new();
        let mut fields = vec![];
        for ast_field in &ast_model.fields {
            if !field_names.insert(ast_field.name.as_str()) {
                return Err(ParserError::DuplicateField {
                    model: ast_model.name.clone(),
                    field: ast_field.name.clone(),
                    location: self.location(ast_field.span),
                });
            }
            fields.push(self.field_draft(ast_field)?);
        }
        self.check_storage_names(ast_model, &fields)?;

        let mut ids = fields.iter().filter(|field| field.is_id);
        let pk_field = match (ids.next(), ids.next()) {
            (Some(pk), None) => pk.name.clone(),
            (_, second) => {
                let span = second
                    .and_then(|field| field.span())
                    .unwrap_or(ast_model.name_span);
                return Err(ParserError::MissingPrimaryKey {
                    model: ast_model.name.clone(),
                    location: self.location(span),
                });
            }
        };

        let mut indexes: Vec<ModelIndex> = vec![];
        for annotation in index_annotations {
            let index = self.model_index(&ast_model.name, annotation, &fields)?;
            if indexes
                .iter()
                .any(|other| other.unique == index.unique && other.fields == index.fields)
            {
                return Err(ParserError::InvalidIndex {
                    message: format!("Duplicate `@@{}` on the same fields", annotation.name),
                    location: self.location(annotation.span),
                });
            }
            indexes.push(index);
        }

        Ok(ModelDraft {
            ast: ast_model,
            collection_name: collection_name.unwrap_or_else(|| ast_model.name.clone()),
            pk_field,
            fields,
            indexes,
        })
    }

    /// No two persisted fields of a model may be stored under the same document key
    fn check_storage_names(
        &self,
        ast_model: &AstModel,
        fields: &[FieldDraft],
    ) -> Result<(), ParserError> {
        let mut storage_names = HashSet::new();
        for field in fields.iter().filter(|field| field.kind.is_persisted()) {
            if !storage_names.insert(field.storage_name.as_str()) {
                return Err(ParserError::DuplicateStorageName {
                    model: ast_model.name.clone(),
                    storage_name: field.storage_name.clone(),
                    location: self.location(field.span().unwrap_or(ast_model.name_span)),
                });
            }
        }
        Ok(())
    }

    /// Pass 2: every model-typed field must name a declared model.
    fn resolve_model_references(&self, models: &[ModelDraft]) -> Result<(), ParserError> {
        let names: HashSet<&str> = models.iter().map(|model| model.name()).collect();

        for model in models {
            for field in &model.fields {
                if let (FieldDraftKind::Model(target), Some(ast)) = (&field.kind, field.ast)
                    && !names.contains(target.as_str())
                {
                    return Err(ParserError::UnknownModel {
                        name: target.clone(),
                        location: self.location(ast.typ.span),
                    });
                }
            }
        }

        Ok(())
    }
}

fn assemble(
    ast: &AstSchema,
    enums: MappedArena<EnumType>,
    models: Vec<ModelDraft>,
    relations: Vec<RelationDraft>,
) -> SchemaGraph {
    let config_blocks = ast
        .config_blocks()
        .map(|block| ConfigBlock {
            kind: block.kind,
            name: block.name.clone(),
            entries: block
                .entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.to_string()))
                .collect(),
        })
        .collect();

    let mut arena = MappedArena::default();
    let model_ids: Vec<ModelId> = models
        .into_iter()
        .map(|draft| {
            let name = draft.name().to_string();
            let model = Model {
                name: name.clone(),
                collection_name: draft.collection_name,
                pk_field: draft.pk_field,
                fields: draft.fields.into_iter().map(into_field).collect(),
                indexes: draft.indexes,
                doc: draft.ast.doc.clone(),
            };
            arena.add(&name, model)
        })
        .collect();

    let relations = relations
        .into_iter()
        .map(|draft| Relation {
            name: draft.name,
            owner: model_ids[draft.owner],
            target: model_ids[draft.target],
            fk_field: draft.fk_field,
            referenced_field: draft.referenced_field,
            relation_field: draft.relation_field,
            back_field: draft.back_field,
            required: draft.required,
        })
        .collect();

    SchemaGraph {
        config_blocks,
        enums,
        models: arena,
        relations,
    }
}

fn into_field(draft: FieldDraft) -> Field {
    let kind = match (&draft.kind, draft.relation_id) {
        (FieldDraftKind::Scalar(typ), _) => FieldKind::Scalar(*typ),
        (FieldDraftKind::Enum(name), _) => FieldKind::Enum(name.clone()),
        (FieldDraftKind::Model(_), Some(relation_id)) if draft.list => {
            FieldKind::BackCollection(relation_id)
        }
        (FieldDraftKind::Model(_), Some(relation_id)) => FieldKind::Relation(relation_id),
        // Every model-typed field is attached to a relation by the relation passes
        (FieldDraftKind::Model(_), None) => unreachable!("unattached relation field"),
    };

    Field {
        name: draft.name,
        storage_name: draft.storage_name,
        kind,
        nullable: draft.nullable,
        list: draft.list,
        default: draft.default,
        unique: draft.unique,
        native_type: draft.native_type,
        doc: draft.doc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, test_util::SAMPLE_SCHEMA};
    use multiplatform_test::multiplatform_test;

    fn build(src: &str) -> Result<SchemaGraph, ParserError> {
        let mut codemap = CodeMap::new();
        let ast = parser::parse_str(src, &mut codemap, "input.prisma")?;
        resolve(&ast, &codemap)
    }

    fn field_names(graph: &SchemaGraph, model: &str) -> Vec<String> {
        graph
            .model(model)
            .unwrap()
            .1
            .fields
            .iter()
            .map(|field| field.name.clone())
            .collect()
    }

    fn assert_err<T: std::fmt::Debug>(result: Result<T, ParserError>, expected: &str) {
        match result {
            Ok(value) => panic!("Expected an error, got {value:?}"),
            Err(err) => assert_eq!(err.to_string(), expected),
        }
    }

    #[multiplatform_test]
    fn sample_schema_resolves_with_back_collections() {
        let graph = build(SAMPLE_SCHEMA).unwrap();

        assert_eq!(
            graph.models.keys().collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert_eq!(field_names(&graph, "A"), vec!["id", "gql", "bs"]);
        assert_eq!(field_names(&graph, "B"), vec!["id", "a_id", "a", "cs"]);
        assert_eq!(field_names(&graph, "C"), vec!["id", "b_id", "b", "bId"]);

        let (a_id, a) = graph.model("A").unwrap();
        let (b_id, b) = graph.model("B").unwrap();
        let (c_id, c) = graph.model("C").unwrap();

        let bs = a.field("bs").unwrap();
        assert!(bs.list && !bs.is_persisted());
        assert!(matches!(bs.kind, FieldKind::BackCollection(RelationId(0))));
        assert!(matches!(b.field("a").unwrap().kind, FieldKind::Relation(RelationId(0))));
        assert!(matches!(b.field("cs").unwrap().kind, FieldKind::BackCollection(RelationId(1))));

        assert_eq!(
            graph.relations,
            vec![
                Relation {
                    name: None,
                    owner: b_id,
                    target: a_id,
                    fk_field: "a_id".to_string(),
                    referenced_field: "id".to_string(),
                    relation_field: "a".to_string(),
                    back_field: "bs".to_string(),
                    required: true,
                },
                Relation {
                    name: None,
                    owner: c_id,
                    target: b_id,
                    fk_field: "b_id".to_string(),
                    referenced_field: "id".to_string(),
                    relation_field: "b".to_string(),
                    back_field: "cs".to_string(),
                    required: false,
                },
            ]
        );

        let id = a.pk().unwrap();
        assert_eq!(id.storage_name, "_id");
        assert_eq!(id.default, DefaultPolicy::GeneratedId);
        assert!(id.is_identifier());

        let b_id_field = c.field("bId").unwrap();
        assert_eq!(b_id_field.kind, FieldKind::Scalar(ScalarType::String));
        assert!(b_id_field.nullable && !b_id_field.is_identifier());

        assert_eq!(graph.config_blocks.len(), 2);
        assert_eq!(
            graph.config_blocks[0].entries[1],
            ("url".to_string(), "env(\"DATABASE_URL\")".to_string())
        );
    }

    #[multiplatform_test]
    fn referential_integrity() {
        let graph = build(SAMPLE_SCHEMA).unwrap();

        for (_, relation) in graph.relations() {
            let owner = graph.models.get_by_id(relation.owner).unwrap();
            let target = graph.models.get_by_id(relation.target).unwrap();
            let fk = owner.field(&relation.fk_field).unwrap();
            let pk = target.pk().unwrap();

            assert!(fk.is_persisted() && !fk.list);
            assert_eq!(fk.scalar_type(), pk.scalar_type());
            assert_eq!(relation.referenced_field, pk.name);
            assert!(owner.field(&relation.relation_field).is_some());
            assert!(target.field(&relation.back_field).is_some());
        }
    }

    #[multiplatform_test]
    fn missing_target_model() {
        let src = r#"
model B {
  id   String @id @default(auto()) @map("_id") @db.ObjectId
  a_id String @db.ObjectId
  a    A      @relation(fields: [a_id], references: [id])
}
"#;
        assert_err(build(src), "input.prisma:5:10: unknown model `A`");
    }

    #[multiplatform_test]
    fn duplicate_model() {
        let src = "model A {\n  id String @id\n}\nmodel A {\n  id String @id\n}";
        assert_err(build(src), "input.prisma:4:7: duplicate model `A`");
    }

    #[multiplatform_test]
    fn model_named_after_scalar() {
        let src = "model String {\n  id String @id\n}";
        assert_err(build(src), "input.prisma:1:7: duplicate model `String`");
    }

    #[multiplatform_test]
    fn duplicate_field() {
        let src = "model A {\n  id String @id\n  id Int\n}";
        assert_err(
            build(src),
            "input.prisma:3:3: duplicate field `id` in model `A`",
        );
    }

    #[multiplatform_test]
    fn missing_primary_key() {
        assert_err(
            build("model A {\n  name String\n}"),
            "input.prisma:1:7: model `A` must declare exactly one `@id` field",
        );
        assert_err(
            build("model A {\n  id String @id\n  other String @id\n}"),
            "input.prisma:3:3: model `A` must declare exactly one `@id` field",
        );
    }

    #[multiplatform_test]
    fn collection_mapping() {
        let graph = build("model A {\n  id String @id\n  @@map(\"alphas\")\n}").unwrap();
        assert_eq!(graph.model("A").unwrap().1.collection_name, "alphas");

        assert_err(
            build("model A {\n  id String @id\n  @@id([id])\n}"),
            "input.prisma:3:3: invalid attribute: Unknown model attribute `@@id`",
        );
    }

    #[multiplatform_test]
    fn storage_name_collisions() {
        assert_err(
            build("model A {\n  id String @id\n  x  String @map(\"y\")\n  y  String\n}"),
            "input.prisma:4:3: duplicate storage name `y` in model `A`",
        );
        assert_err(
            build("model A {\n  id  String @id @map(\"_id\")\n  key String @map(\"_id\")\n}"),
            "input.prisma:3:3: duplicate storage name `_id` in model `A`",
        );

        // A back-collection is not stored, so it may share a name with a mapped field
        let graph = build(
            "model A {\n  id String @id\n  n  String @map(\"bs\")\n  bs B[]\n}\nmodel B {\n  id String @id\n  a_id String\n  a A @relation(fields: [a_id], references: [id])\n}",
        )
        .unwrap();
        assert_eq!(
            graph.model("A").unwrap().1.field_by_storage_name("bs").unwrap().name,
            "n"
        );
    }

    #[multiplatform_test]
    fn collection_collisions() {
        assert_err(
            build("model A {\n  id String @id\n  @@map(\"things\")\n}\nmodel B {\n  id String @id\n  @@map(\"things\")\n}"),
            "input.prisma:7:3: collection `things` is used by more than one model",
        );
        assert_err(
            build("model A {\n  id String @id\n}\nmodel B {\n  id String @id\n  @@map(\"A\")\n}"),
            "input.prisma:6:3: collection `A` is used by more than one model",
        );
        assert_err(
            build("model A {\n  id String @id\n  @@map(\"B\")\n}\nmodel B {\n  id String @id\n}"),
            "input.prisma:5:7: collection `B` is used by more than one model",
        );
    }

    #[multiplatform_test]
    fn docs_and_indexes_reach_the_graph() {
        let graph = build(
            "/// Things\nmodel A {\n  id String @id\n  n  Int\n  @@index([n])\n}",
        )
        .unwrap();
        let model = graph.model("A").unwrap().1;
        assert_eq!(model.doc.as_deref(), Some("Things"));
        assert_eq!(model.indexes.len(), 1);
        assert!(!model.indexes[0].unique);
    }

    #[multiplatform_test]
    fn first_error_wins_across_passes() {
        // The unknown model is found in pass 2, the duplicate field in pass 1 of a later model
        let src = r#"
model B {
  id String @id
  x  Missing
}
model C {
  id String @id
  id String
}
"#;
        assert_err(
            build(src),
            "input.prisma:8:3: duplicate field `id` in model `C`",
        );
    }
}
