// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use codemap::Span;
use core_model::schema::ConfigBlockKind;

#[derive(Debug, Clone, PartialEq)]
pub struct AstSchema {
    pub blocks: Vec<AstBlock>,
}

impl AstSchema {
    pub fn models(&self) -> impl Iterator<Item = &AstModel> {
        self.blocks.iter().filter_map(|block| match block {
            AstBlock::Model(model) => Some(model),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &AstEnum> {
        self.blocks.iter().filter_map(|block| match block {
            AstBlock::Enum(enum_type) => Some(enum_type),
            _ => None,
        })
    }

    pub fn config_blocks(&self) -> impl Iterator<Item = &AstConfigBlock> {
        self.blocks.iter().filter_map(|block| match block {
            AstBlock::Config(config) => Some(config),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstBlock {
    Config(AstConfigBlock),
    Model(AstModel),
    Enum(AstEnum),
}

/// A `datasource` or `generator` block. The entries are not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct AstConfigBlock {
    pub kind: ConfigBlockKind,
    pub name: String,
    pub entries: Vec<AstConfigEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstConfigEntry {
    pub key: String,
    pub value: AstExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstModel {
    pub name: String,
    pub fields: Vec<AstField>,
    /// Block-level (`@@`) attributes
    pub annotations: Vec<AstAnnotation>,
    /// The `///` comment lines before the model, without the slashes
    pub doc: Option<String>,
    pub span: Span,
    pub name_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstField {
    pub name: String,
    pub typ: AstFieldType,
    pub annotations: Vec<AstAnnotation>,
    pub doc: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstEnum {
    pub name: String,
    pub values: Vec<AstEnumValue>,
    pub doc: Option<String>,
    pub span: Span,
    pub name_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstEnumValue {
    pub name: String,
    pub doc: Option<String>,
    pub span: Span,
}

impl AstModel {
    pub fn annotation(&self, name: &str) -> Option<&AstAnnotation> {
        self.annotations
            .iter()
            .find(|annotation| annotation.name == name)
    }
}

impl AstField {
    pub fn annotation(&self, name: &str) -> Option<&AstAnnotation> {
        self.annotations
            .iter()
            .find(|annotation| annotation.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstFieldType {
    pub name: String,
    pub modifier: AstTypeModifier,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstTypeModifier {
    None,
    Optional,
    List,
}

/// `@name`, `@name(args)` or `@db.Hint`. For dotted names, `name` holds the full path.
#[derive(Debug, Clone, PartialEq)]
pub struct AstAnnotation {
    pub name: String,
    pub args: Option<Vec<AstArgument>>,
    pub span: Span,
}

impl AstAnnotation {
    pub fn args(&self) -> &[AstArgument] {
        self.args.as_deref().unwrap_or_default()
    }

    pub fn positional_args(&self) -> impl Iterator<Item = &AstArgument> {
        self.args().iter().filter(|arg| arg.name.is_none())
    }

    pub fn named_arg(&self, name: &str) -> Option<&AstArgument> {
        self.args()
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstArgument {
    pub name: Option<String>,
    pub value: AstExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstExpr {
    StringLiteral(String, Span),
    NumberLiteral(String, Span),
    BooleanLiteral(bool, Span),
    Identifier(String, Span),
    Call {
        name: String,
        args: Vec<AstArgument>,
        span: Span,
    },
    Array(Vec<AstExpr>, Span),
}

impl AstExpr {
    pub fn span(&self) -> Span {
        match self {
            AstExpr::StringLiteral(_, span)
            | AstExpr::NumberLiteral(_, span)
            | AstExpr::BooleanLiteral(_, span)
            | AstExpr::Identifier(_, span)
            | AstExpr::Array(_, span) => *span,
            AstExpr::Call { span, .. } => *span,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            AstExpr::StringLiteral(value, _) => Some(value),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            AstExpr::Identifier(value, _) => Some(value),
            _ => None,
        }
    }
}

/// Inverse of [escape_string]. `None` for an unknown escape sequence.
pub fn unescape_string(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        value.push(match chars.next()? {
            '"' => '"',
            '\\' => '\\',
            'n' => '\n',
            't' => '\t',
            _ => return None,
        });
    }
    Some(value)
}

pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

impl Display for AstArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Canonical source form of an expression
impl Display for AstExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AstExpr::StringLiteral(value, _) => f.write_str(&escape_string(value)),
            AstExpr::NumberLiteral(value, _) => f.write_str(value),
            AstExpr::BooleanLiteral(value, _) => write!(f, "{value}"),
            AstExpr::Identifier(value, _) => f.write_str(value),
            AstExpr::Call { name, args, .. } => {
                let args: Vec<_> = args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            AstExpr::Array(elems, _) => {
                let elems: Vec<_> = elems.iter().map(|elem| elem.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
        }
    }
}
