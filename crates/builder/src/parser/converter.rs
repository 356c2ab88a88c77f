// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Conversion of the concrete syntax tree produced by tree-sitter into the AST.
//!
//! The grammar accepts a little more than the schema language allows (several fields on one line,
//! `[]?` type modifiers, unknown string escapes). Those are reported here as syntax errors.

use codemap::{File, Span};
use core_model::schema::ConfigBlockKind;
use tree_sitter_c2rust::{Node, Parser, Tree};

use super::sitter_ffi;
use crate::{
    ast::ast_types::{
        AstAnnotation, AstArgument, AstBlock, AstConfigBlock, AstConfigEntry, AstEnum,
        AstEnumValue, AstExpr, AstField, AstFieldType, AstModel, AstSchema, AstTypeModifier,
        unescape_string,
    },
    error::{ParserError, SourceLocation},
};

pub fn parse(input: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&sitter_ffi::language()).ok()?;
    parser.parse(input, None)
}

pub fn convert_root(node: Node, file: &File) -> Result<AstSchema, ParserError> {
    Converter { file }.convert_root(node)
}

pub fn span_from_node(file: &File, node: Node<'_>) -> Span {
    file.span
        .subspan(node.start_byte() as u64, node.end_byte() as u64)
}

pub fn syntax_error(file: &File, message: String, node: Node<'_>) -> ParserError {
    ParserError::Syntax {
        message,
        location: SourceLocation::from_file(file, span_from_node(file, node)),
    }
}

/// Named children except comments, which may appear anywhere
fn members<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

struct Converter<'a> {
    file: &'a File,
}

impl Converter<'_> {
    fn text(&self, node: Node<'_>) -> String {
        self.file
            .source()
            .get(node.byte_range())
            .unwrap_or_default()
            .to_string()
    }

    fn span(&self, node: Node<'_>) -> Span {
        span_from_node(self.file, node)
    }

    fn error(&self, message: String, node: Node<'_>) -> ParserError {
        syntax_error(self.file, message, node)
    }

    fn child<'t>(&self, node: Node<'t>, field: &str) -> Result<Node<'t>, ParserError> {
        node.child_by_field_name(field)
            .ok_or_else(|| self.error(format!("Expected a {field} in {}", node.kind()), node))
    }

    fn convert_root(&self, node: Node) -> Result<AstSchema, ParserError> {
        let mut blocks = vec![];
        let mut docs = DocLines::default();

        for child in members(node) {
            match child.kind() {
                "doc_comment" => docs.push(&self.text(child)),
                "model_declaration" => {
                    blocks.push(AstBlock::Model(self.convert_model(child, docs.take())?))
                }
                "enum_declaration" => {
                    blocks.push(AstBlock::Enum(self.convert_enum(child, docs.take())?))
                }
                "config_block" => {
                    docs.take();
                    blocks.push(AstBlock::Config(self.convert_config_block(child)?))
                }
                other => return Err(self.error(format!("Unexpected {other}"), child)),
            }
        }

        Ok(AstSchema { blocks })
    }

    fn convert_config_block(&self, node: Node) -> Result<AstConfigBlock, ParserError> {
        let kind_node = self.child(node, "kind")?;
        let kind = match kind_node.kind() {
            "datasource" => ConfigBlockKind::Datasource,
            "generator" => ConfigBlockKind::Generator,
            other => return Err(self.error(format!("Unknown block `{other}`"), kind_node)),
        };

        let mut rows = RowTracker::new(self.child(node, "name")?);
        let entries = members(node)
            .into_iter()
            .filter(|child| child.kind() == "config_entry")
            .map(|entry| -> Result<AstConfigEntry, ParserError> {
                let key = self.child(entry, "key")?;
                rows.require_new_line(self, key)?;
                rows.advance(entry);
                Ok(AstConfigEntry {
                    key: self.text(key),
                    value: self.convert_expression(self.child(entry, "value")?)?,
                    span: self.span(entry),
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(AstConfigBlock {
            kind,
            name: self.text(self.child(node, "name")?),
            entries,
            span: self.span(node),
        })
    }

    fn convert_model(&self, node: Node, doc: Option<String>) -> Result<AstModel, ParserError> {
        let name = self.child(node, "name")?;
        let body = self.child(node, "body")?;

        let mut fields = vec![];
        let mut annotations = vec![];
        let mut docs = DocLines::default();
        let mut rows = RowTracker::new(body);

        for member in members(body) {
            match member.kind() {
                "doc_comment" => docs.push(&self.text(member)),
                "field_declaration" => {
                    rows.require_new_line(self, self.child(member, "name")?)?;
                    fields.push(self.convert_field(member, docs.take())?);
                }
                "block_attribute" => {
                    docs.take();
                    annotations.push(self.convert_annotation(member)?);
                }
                other => return Err(self.error(format!("Unexpected {other}"), member)),
            }
            rows.advance(member);
        }

        Ok(AstModel {
            name: self.text(name),
            fields,
            annotations,
            doc,
            span: self.span(node),
            name_span: self.span(name),
        })
    }

    fn convert_enum(&self, node: Node, doc: Option<String>) -> Result<AstEnum, ParserError> {
        let name = self.child(node, "name")?;
        let body = self.child(node, "body")?;

        let mut values = vec![];
        let mut docs = DocLines::default();
        let mut rows = RowTracker::new(body);

        for member in members(body) {
            match member.kind() {
                "doc_comment" => docs.push(&self.text(member)),
                "enum_value" => {
                    rows.require_new_line(self, member)?;
                    values.push(AstEnumValue {
                        name: self.text(self.child(member, "name")?),
                        doc: docs.take(),
                        span: self.span(member),
                    });
                }
                other => return Err(self.error(format!("Unexpected {other}"), member)),
            }
            rows.advance(member);
        }

        Ok(AstEnum {
            name: self.text(name),
            values,
            doc,
            span: self.span(node),
            name_span: self.span(name),
        })
    }

    fn convert_field(&self, node: Node, doc: Option<String>) -> Result<AstField, ParserError> {
        let name = self.text(self.child(node, "name")?);
        let typ = self.convert_type(self.child(node, "type")?, &name)?;

        let mut cursor = node.walk();
        let annotations = node
            .children_by_field_name("attribute", &mut cursor)
            .map(|attribute| self.convert_annotation(attribute))
            .collect::<Result<_, _>>()?;

        Ok(AstField {
            name,
            typ,
            annotations,
            doc,
            span: self.span(node),
        })
    }

    fn convert_type(&self, node: Node, field_name: &str) -> Result<AstFieldType, ParserError> {
        let markers = members(node);
        let list = markers.iter().any(|child| child.kind() == "list_marker");
        let optional = markers
            .iter()
            .find(|child| child.kind() == "optional_marker");

        let modifier = match (list, optional) {
            (true, Some(question)) => {
                return Err(self.error(
                    format!("List field `{field_name}` cannot be optional"),
                    *question,
                ));
            }
            (true, None) => AstTypeModifier::List,
            (false, Some(_)) => AstTypeModifier::Optional,
            (false, None) => AstTypeModifier::None,
        };

        Ok(AstFieldType {
            name: self.text(self.child(node, "name")?),
            modifier,
            span: self.span(node),
        })
    }

    /// `@name`, `@a.b` or `@@name`, each with optional arguments
    fn convert_annotation(&self, node: Node) -> Result<AstAnnotation, ParserError> {
        let name = members(self.child(node, "name")?)
            .into_iter()
            .map(|segment| self.text(segment))
            .collect::<Vec<_>>()
            .join(".");

        let args = node
            .child_by_field_name("arguments")
            .map(|arguments| self.convert_arguments(arguments))
            .transpose()?;

        Ok(AstAnnotation {
            name,
            args,
            span: self.span(node),
        })
    }

    fn convert_arguments(&self, node: Node) -> Result<Vec<AstArgument>, ParserError> {
        members(node)
            .into_iter()
            .map(|argument| -> Result<AstArgument, ParserError> {
                Ok(AstArgument {
                    name: argument
                        .child_by_field_name("name")
                        .map(|name| self.text(name)),
                    value: self.convert_expression(self.child(argument, "value")?)?,
                    span: self.span(argument),
                })
            })
            .collect()
    }

    fn convert_expression(&self, node: Node) -> Result<AstExpr, ParserError> {
        let span = self.span(node);
        match node.kind() {
            "string" => unescape_string(&self.text(node))
                .map(|value| AstExpr::StringLiteral(value, span))
                .ok_or_else(|| self.error("Invalid escape sequence in string".to_string(), node)),
            "number" => Ok(AstExpr::NumberLiteral(self.text(node), span)),
            "identifier" => Ok(match self.text(node).as_str() {
                "true" => AstExpr::BooleanLiteral(true, span),
                "false" => AstExpr::BooleanLiteral(false, span),
                name => AstExpr::Identifier(name.to_string(), span),
            }),
            "call" => Ok(AstExpr::Call {
                name: self.text(self.child(node, "function")?),
                args: self.convert_arguments(self.child(node, "arguments")?)?,
                span,
            }),
            "array" => Ok(AstExpr::Array(
                members(node)
                    .into_iter()
                    .map(|element| self.convert_expression(element))
                    .collect::<Result<_, _>>()?,
                span,
            )),
            other => Err(self.error(format!("Unexpected {other}"), node)),
        }
    }
}

/// Consecutive `///` lines waiting for the declaration they document
#[derive(Default)]
struct DocLines(Vec<String>);

impl DocLines {
    fn push(&mut self, comment: &str) {
        let line = comment.strip_prefix("///").unwrap_or(comment);
        let line = line.strip_prefix(' ').unwrap_or(line);
        self.0.push(line.trim_end().to_string());
    }

    fn take(&mut self) -> Option<String> {
        let lines = std::mem::take(&mut self.0);
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

/// Each declaration inside a block must start on a line after the previous one ends
struct RowTracker {
    last_row: usize,
}

impl RowTracker {
    /// Start after the block's opening line
    fn new(opening: Node) -> Self {
        RowTracker {
            last_row: opening.start_position().row,
        }
    }

    fn require_new_line(&self, converter: &Converter, node: Node) -> Result<(), ParserError> {
        if node.start_position().row > self.last_row {
            Ok(())
        } else {
            Err(converter.error(
                format!("Expected a new line before `{}`", converter.text(node)),
                node,
            ))
        }
    }

    fn advance(&mut self, node: Node) {
        self.last_row = node.end_position().row;
    }
}
