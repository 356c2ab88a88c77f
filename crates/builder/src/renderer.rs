// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Canonical text form of a schema graph.
//!
//! Resolving the rendered text yields a graph equal to the one rendered. Back-collections are
//! written out explicitly, so a rendered schema never depends on synthesized names.

use core_model::{
    schema::{ConfigBlock, SchemaGraph},
    types::{DefaultLiteral, DefaultPolicy, EnumType, Field, FieldKind, Model, ModelIndex},
};

use crate::{ast::ast_types::escape_string, util::align_columns};

pub fn render(graph: &SchemaGraph) -> String {
    let config_blocks = graph.config_blocks.iter().map(render_config_block);
    let enums = graph.enums.values().map(render_enum);
    let models = graph.models.values().map(|model| render_model(graph, model));

    let blocks: Vec<String> = config_blocks.chain(enums).chain(models).collect();
    let mut rendered = blocks.join("\n");
    if rendered.is_empty() {
        return rendered;
    }
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}

fn render_config_block(block: &ConfigBlock) -> String {
    let rows: Vec<Vec<String>> = block
        .entries
        .iter()
        .map(|(key, value)| vec![key.clone(), "=".to_string(), value.clone()])
        .collect();

    render_block(
        block.kind.keyword(),
        &block.name,
        None,
        align_columns(&rows),
        vec![],
    )
}

fn render_enum(enum_type: &EnumType) -> String {
    let mut lines = vec![];
    for value in &enum_type.values {
        push_doc(&mut lines, value.doc.as_deref());
        lines.push(value.name.clone());
    }

    render_block(
        "enum",
        &enum_type.name,
        enum_type.doc.as_deref(),
        lines,
        vec![],
    )
}

fn render_model(graph: &SchemaGraph, model: &Model) -> String {
    let rows: Vec<Vec<String>> = model
        .fields
        .iter()
        .map(|field| {
            vec![
                field.name.clone(),
                render_type(graph, field),
                render_attributes(graph, model, field).join(" "),
            ]
        })
        .collect();

    // Doc comments sit between the aligned rows without taking part in the alignment
    let mut lines = vec![];
    for (field, row) in model.fields.iter().zip(align_columns(&rows)) {
        push_doc(&mut lines, field.doc.as_deref());
        lines.push(row);
    }

    let mut model_attributes = vec![];
    if model.collection_name != model.name {
        model_attributes.push(format!("@@map({})", escape_string(&model.collection_name)));
    }
    model_attributes.extend(model.indexes.iter().map(render_index));

    render_block(
        "model",
        &model.name,
        model.doc.as_deref(),
        lines,
        model_attributes,
    )
}

fn render_index(index: &ModelIndex) -> String {
    let keyword = if index.unique { "unique" } else { "index" };
    let mut args = vec![format!("[{}]", index.fields.join(", "))];
    if let Some(name) = &index.name {
        args.push(format!("name: {}", escape_string(name)));
    }
    format!("@@{keyword}({})", args.join(", "))
}

fn push_doc(lines: &mut Vec<String>, doc: Option<&str>) {
    for line in doc.into_iter().flat_map(str::lines) {
        lines.push(format!("/// {line}").trim_end().to_string());
    }
}

fn render_block(
    keyword: &str,
    name: &str,
    doc: Option<&str>,
    lines: Vec<String>,
    trailer: Vec<String>,
) -> String {
    let mut header = vec![];
    push_doc(&mut header, doc);

    let mut rendered = String::new();
    for line in header {
        rendered.push_str(&line);
        rendered.push('\n');
    }
    rendered.push_str(&format!("{keyword} {name} {{\n"));
    for line in lines {
        rendered.push_str("  ");
        rendered.push_str(&line);
        rendered.push('\n');
    }
    if !trailer.is_empty() {
        rendered.push('\n');
        for line in trailer {
            rendered.push_str("  ");
            rendered.push_str(&line);
            rendered.push('\n');
        }
    }
    rendered.push_str("}\n");
    rendered
}

fn render_type(graph: &SchemaGraph, field: &Field) -> String {
    let base = match &field.kind {
        FieldKind::Scalar(typ) => typ.name().to_string(),
        FieldKind::Enum(name) => name.clone(),
        FieldKind::Relation(_) | FieldKind::BackCollection(_) => graph
            .related_model(field)
            .map(|model| model.name.clone())
            .unwrap_or_default(),
    };

    if field.list {
        format!("{base}[]")
    } else if field.nullable {
        format!("{base}?")
    } else {
        base
    }
}

fn render_attributes(graph: &SchemaGraph, model: &Model, field: &Field) -> Vec<String> {
    let mut attributes = vec![];

    if field.is_persisted() {
        if field.name == model.pk_field {
            attributes.push("@id".to_string());
        }
        if field.unique {
            attributes.push("@unique".to_string());
        }
        if let Some(default) = render_default(field) {
            attributes.push(format!("@default({default})"));
        }
        if field.storage_name != field.name {
            attributes.push(format!("@map({})", escape_string(&field.storage_name)));
        }
        if let Some(hint) = &field.native_type {
            attributes.push(format!("@db.{hint}"));
        }
    }

    match &field.kind {
        FieldKind::Relation(relation_id) => {
            let relation = graph.relation(*relation_id);
            let mut args = vec![];
            if let Some(name) = &relation.name {
                args.push(escape_string(name));
            }
            args.push(format!("fields: [{}]", relation.fk_field));
            args.push(format!("references: [{}]", relation.referenced_field));
            attributes.push(format!("@relation({})", args.join(", ")));
        }
        FieldKind::BackCollection(relation_id) => {
            if let Some(name) = &graph.relation(*relation_id).name {
                attributes.push(format!("@relation({})", escape_string(name)));
            }
        }
        FieldKind::Scalar(_) | FieldKind::Enum(_) => {}
    }

    attributes
}

fn render_default(field: &Field) -> Option<String> {
    match &field.default {
        DefaultPolicy::None => None,
        DefaultPolicy::GeneratedId => Some("auto()".to_string()),
        DefaultPolicy::Uuid => Some("uuid()".to_string()),
        DefaultPolicy::Now => Some("now()".to_string()),
        DefaultPolicy::Literal(literal) => Some(match literal {
            // Enum values are written as bare identifiers
            DefaultLiteral::String(value) if field.enum_name().is_some() => value.clone(),
            DefaultLiteral::String(value) => escape_string(value),
            DefaultLiteral::Int(value) => value.to_string(),
            DefaultLiteral::Float(value) => value.to_string(),
            DefaultLiteral::Boolean(value) => value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_system_from_str, test_util::SAMPLE_SCHEMA};
    use multiplatform_test::multiplatform_test;

    fn resolve(src: &str) -> SchemaGraph {
        build_system_from_str(src, "input.prisma".to_string()).unwrap()
    }

    #[multiplatform_test]
    fn canonical_sample() {
        let rendered = render(&resolve(SAMPLE_SCHEMA));

        insta::assert_snapshot!(rendered, @r#"
        datasource db {
          provider = "mongodb"
          url      = env("DATABASE_URL")
        }

        generator client {
          provider = "docmodel-client-rust"
          output   = "../src/generated.rs"
        }

        model A {
          id  String  @id @default(auto()) @map("_id") @db.ObjectId
          gql String?
          bs  B[]
        }

        model B {
          id   String @id @default(auto()) @map("_id") @db.ObjectId
          a_id String @db.ObjectId
          a    A      @relation(fields: [a_id], references: [id])
          cs   C[]
        }

        model C {
          id   String  @id @default(auto()) @map("_id") @db.ObjectId
          b_id String? @db.ObjectId
          b    B?      @relation(fields: [b_id], references: [id])
          bId  String?
        }
        "#);
    }

    #[multiplatform_test]
    fn render_then_resolve_is_identity() {
        let sources = [
            SAMPLE_SCHEMA,
            r#"
            model User {
              id       String   @id @default(uuid())
              email    String   @unique @map("mail")
              joined   DateTime @default(now())
              score    Float    @default(0.5)
              visits   BigInt   @default(-1)
              active   Boolean  @default(false)
              nick     String?  @default("anon \"x\"")
              tags     String[]
              written  Post[]   @relation("author")
              @@map("users")
            }

            model Post {
              id        String  @id
              author_id String
              author    User    @relation("author", fields: [author_id], references: [id])
              editor_id String?
              editor    User?   @relation(fields: [editor_id], references: [id])
            }
            "#,
            r#"
            /// Someone who can sign in
            model Account {
              id    String @id @default(auto()) @map("_id") @db.ObjectId
              /// Shown to other users
              ///
              /// Unique per tenant
              name  String @db.VarChar(40)
              role  Role   @default(MEMBER)
              roles Role[]
              @@unique([name, role], name: "name_role")
              @@index([role])
            }

            enum Role {
              /// Read-only
              MEMBER
              OWNER
            }
            "#,
        ];

        for source in sources {
            let graph = resolve(source);
            let rendered = render(&graph);
            let reresolved = resolve(&rendered);

            assert_eq!(graph, reresolved);
            assert_eq!(rendered, render(&reresolved));
        }
    }

    #[multiplatform_test]
    fn enums_docs_and_indexes() {
        let rendered = render(&resolve(
            r#"
            model Account {
              /// Login name
              name String @id @db.VarChar(40)
              kind Kind @default(PERSONAL) @map("k")
              @@index([kind], name: "by_kind")
              @@map("accounts")
            }

            /// Billing plans
            enum Kind {
              PERSONAL
              /// Billed yearly
              TEAM
            }
            "#,
        ));

        insta::assert_snapshot!(rendered, @r#"
        /// Billing plans
        enum Kind {
          PERSONAL
          /// Billed yearly
          TEAM
        }

        model Account {
          /// Login name
          name String @id @db.VarChar(40)
          kind Kind   @default(PERSONAL) @map("k")

          @@map("accounts")
          @@index([kind], name: "by_kind")
        }
        "#);
    }

    #[multiplatform_test]
    fn empty_schema() {
        assert_eq!(render(&SchemaGraph::default()), "");
    }
}
