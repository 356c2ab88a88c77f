// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Schema file parser, built on a tree-sitter grammar (see `grammar/grammar.js`).
//!
//! The parser only checks the shape of the text. Whether a type name refers to a declared model,
//! or whether an attribute makes sense on a field, is decided by the resolver.

mod converter;
mod sitter_ffi;

use codemap::{CodeMap, File};
use tree_sitter_c2rust::Node;

use crate::{
    ast::ast_types::AstSchema,
    error::{ParserError, SourceLocation},
};

use self::converter::{convert_root, parse, syntax_error};

/// Add `input` to the codemap under `file_name` and parse it.
pub fn parse_str(
    input: &str,
    codemap: &mut CodeMap,
    file_name: &str,
) -> Result<AstSchema, ParserError> {
    let file = codemap.add_file(file_name.to_string(), input.to_string());
    parse_file(&file)
}

pub fn parse_file(file: &File) -> Result<AstSchema, ParserError> {
    let tree = parse(file.source()).ok_or_else(|| ParserError::Syntax {
        message: "The schema parser could not be initialized".to_string(),
        location: SourceLocation::from_file(file, file.span.subspan(0, 0)),
    })?;
    let root_node = tree.root_node();

    if root_node.has_error() {
        return Err(
            first_parsing_error(root_node, file).unwrap_or_else(|| {
                syntax_error(file, "Malformed schema".to_string(), root_node)
            }),
        );
    }

    convert_root(root_node, file)
}

/// The first error or missing node in source order
fn first_parsing_error(node: Node, file: &File) -> Option<ParserError> {
    if node.is_missing() {
        let expected = if node.is_named() {
            node.kind().replace('_', " ")
        } else {
            format!("`{}`", node.kind())
        };
        return Some(syntax_error(file, format!("Expected {expected}"), node));
    }

    if node.is_error() {
        let token = first_leaf(node);
        let text = file.source().get(token.byte_range()).unwrap_or_default();
        let message = if text.is_empty() {
            "Unexpected end of input".to_string()
        } else {
            format!("Unexpected `{text}`")
        };
        return Some(syntax_error(file, message, token));
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| first_parsing_error(child, file))
}

fn first_leaf(node: Node) -> Node {
    match node.child(0) {
        Some(child) => first_leaf(child),
        None => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ast_types::{AstBlock, AstTypeModifier};
    use multiplatform_test::multiplatform_test;

    fn parse(source: &str) -> Result<AstSchema, ParserError> {
        let mut codemap = CodeMap::new();
        parse_str(source, &mut codemap, "input.prisma")
    }

    fn syntax_error(source: &str) -> (String, usize, usize) {
        match parse(source) {
            Err(ParserError::Syntax { message, location }) => {
                (message, location.line, location.column)
            }
            other => panic!("Expected a syntax error, got {other:?}"),
        }
    }

    #[multiplatform_test]
    fn blocks_in_order() {
        let schema = parse(
            r#"
            datasource db {
              provider = "mongodb"
              url      = env("DATABASE_URL")
            }

            model A {
              id  String  @id @default(auto()) @map("_id") @db.ObjectId
              gql String?
            }

            enum Color {
              RED
            }

            generator client {
              provider = "docmodel"
            }
            "#,
        )
        .unwrap();

        assert_eq!(schema.blocks.len(), 4);
        assert!(matches!(&schema.blocks[0], AstBlock::Config(c) if c.name == "db"));
        assert!(matches!(&schema.blocks[1], AstBlock::Model(m) if m.name == "A"));
        assert!(matches!(&schema.blocks[2], AstBlock::Enum(e) if e.name == "Color"));
        assert!(matches!(&schema.blocks[3], AstBlock::Config(c) if c.name == "client"));

        let datasource = schema.config_blocks().next().unwrap();
        let entries: Vec<_> = datasource
            .entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("provider", "\"mongodb\"".to_string()),
                ("url", "env(\"DATABASE_URL\")".to_string())
            ]
        );
    }

    #[multiplatform_test]
    fn field_declarations() {
        let schema = parse(
            r#"
            model B {
              id   String   @id @default(auto()) @map("_id") @db.ObjectId
              a_id String   @db.ObjectId
              a    A        @relation(fields: [a_id], references: [id])
              tags String[] // free-form
              note String?  @db.VarChar(5)
              @@map("bees")
            }
            "#,
        )
        .unwrap();

        let model = schema.models().next().unwrap();
        let fields: Vec<_> = model
            .fields
            .iter()
            .map(|field| (field.name.as_str(), field.typ.name.as_str(), field.typ.modifier))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("id", "String", AstTypeModifier::None),
                ("a_id", "String", AstTypeModifier::None),
                ("a", "A", AstTypeModifier::None),
                ("tags", "String", AstTypeModifier::List),
                ("note", "String", AstTypeModifier::Optional),
            ]
        );

        let id_annotations: Vec<_> = model.fields[0]
            .annotations
            .iter()
            .map(|annotation| annotation.name.as_str())
            .collect();
        assert_eq!(id_annotations, vec!["id", "default", "map", "db.ObjectId"]);

        let relation = model.fields[2].annotation("relation").unwrap();
        assert_eq!(
            relation.named_arg("fields").unwrap().value.to_string(),
            "[a_id]"
        );
        assert_eq!(
            relation.named_arg("references").unwrap().value.to_string(),
            "[id]"
        );

        let var_char = model.fields[4].annotation("db.VarChar").unwrap();
        assert_eq!(var_char.args()[0].value.to_string(), "5");

        assert_eq!(model.annotations.len(), 1);
        assert_eq!(model.annotations[0].name, "map");
        assert_eq!(
            model.annotations[0].args()[0].value.as_string(),
            Some("bees")
        );
    }

    #[multiplatform_test]
    fn enum_declarations() {
        let schema = parse(
            r#"
            /// Paint colors
            enum Color {
              /// The default
              RED
              GREEN // not documented
              BLUE
            }
            "#,
        )
        .unwrap();

        let color = schema.enums().next().unwrap();
        assert_eq!(color.doc.as_deref(), Some("Paint colors"));
        let values: Vec<_> = color
            .values
            .iter()
            .map(|value| (value.name.as_str(), value.doc.as_deref()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("RED", Some("The default")),
                ("GREEN", None),
                ("BLUE", None)
            ]
        );
    }

    #[multiplatform_test]
    fn doc_comments() {
        let schema = parse(
            r#"
            // An ordinary comment is not documentation
            /// A model
            ///   with an indented second line
            model A {
              /// The key
              id String @id
              // not a doc
              name String
            }
            "#,
        )
        .unwrap();

        let model = schema.models().next().unwrap();
        assert_eq!(
            model.doc.as_deref(),
            Some("A model\n  with an indented second line")
        );
        assert_eq!(model.fields[0].doc.as_deref(), Some("The key"));
        assert_eq!(model.fields[1].doc, None);
    }

    #[multiplatform_test]
    fn string_escapes() {
        let schema = parse("model A {\n  id String @id @default(\"a\\\"b\\\\c\\n\")\n}").unwrap();
        let model = schema.models().next().unwrap();
        let default = model.fields[0].annotation("default").unwrap();
        assert_eq!(default.args()[0].value.as_string(), Some("a\"b\\c\n"));

        assert_eq!(
            syntax_error("model A {\n  id String @id @default(\"a\\qb\")\n}"),
            ("Invalid escape sequence in string".to_string(), 2, 26)
        );
    }

    #[multiplatform_test]
    fn unknown_keyword() {
        let (_, line, _) = syntax_error("model A {\n  id String @id\n}\n\ntype Color {\n  RED\n}");
        assert_eq!(line, 5);
    }

    #[multiplatform_test]
    fn unterminated_block() {
        assert!(matches!(
            parse("model A {\n  id String @id\n"),
            Err(ParserError::Syntax { .. })
        ));
    }

    #[multiplatform_test]
    fn optional_list() {
        assert_eq!(
            syntax_error("model A {\n  id String @id\n  bs B[]?\n}"),
            ("List field `bs` cannot be optional".to_string(), 3, 9)
        );
    }

    #[multiplatform_test]
    fn missing_type() {
        let (_, line, _) = syntax_error("model A {\n  id @id\n}");
        assert_eq!(line, 2);
    }

    #[multiplatform_test]
    fn two_fields_on_one_line() {
        assert_eq!(
            syntax_error("model A {\n  id String @id name String\n}"),
            ("Expected a new line before `name`".to_string(), 2, 17)
        );
        assert_eq!(
            syntax_error("enum Color {\n  RED GREEN\n}"),
            ("Expected a new line before `GREEN`".to_string(), 2, 7)
        );
    }

    #[multiplatform_test]
    fn malformed_attribute_arguments() {
        assert!(matches!(
            parse("model A {\n  id String @default(\"x\"\n}"),
            Err(ParserError::Syntax { .. })
        ));
    }
}
