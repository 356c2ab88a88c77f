// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use codemap::{CodeMap, File, Span};
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use thiserror::Error;

/// A position in a schema file. `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl SourceLocation {
    pub fn from_file(file: &File, span: Span) -> Self {
        let position = file.find_line_col(span.low());
        SourceLocation {
            file: file.name().to_string(),
            line: position.line + 1,
            column: position.column + 1,
            span,
        }
    }

    pub fn from_codemap(codemap: &CodeMap, span: Span) -> Self {
        let loc = codemap.look_up_pos(span.low());
        SourceLocation {
            file: loc.file.name().to_string(),
            line: loc.position.line + 1,
            column: loc.position.column + 1,
            span,
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{location}: syntax error: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: duplicate model `{name}`")]
    DuplicateModel {
        name: String,
        location: SourceLocation,
    },

    #[error("{location}: unknown model `{name}`")]
    UnknownModel {
        name: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid foreign key: {message}")]
    InvalidForeignKey {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: cyclic required relation: {}", .models.join(" -> "))]
    CyclicRelation {
        models: Vec<String>,
        location: SourceLocation,
    },

    #[error("{location}: duplicate field `{field}` in model `{model}`")]
    DuplicateField {
        model: String,
        field: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid attribute: {message}")]
    InvalidAttribute {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid default value: {message}")]
    InvalidDefault {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: model `{model}` must declare exactly one `@id` field")]
    MissingPrimaryKey {
        model: String,
        location: SourceLocation,
    },

    #[error("{location}: duplicate type `{name}`")]
    DuplicateType {
        name: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid enum: {message}")]
    InvalidEnum {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: duplicate storage name `{storage_name}` in model `{model}`")]
    DuplicateStorageName {
        model: String,
        storage_name: String,
        location: SourceLocation,
    },

    #[error("{location}: collection `{collection}` is used by more than one model")]
    DuplicateCollection {
        collection: String,
        location: SourceLocation,
    },

    #[error("{location}: invalid index: {message}")]
    InvalidIndex {
        message: String,
        location: SourceLocation,
    },

    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("{0}")]
    IO(#[from] std::io::Error),
}

impl ParserError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ParserError::Syntax { location, .. }
            | ParserError::DuplicateModel { location, .. }
            | ParserError::UnknownModel { location, .. }
            | ParserError::InvalidForeignKey { location, .. }
            | ParserError::CyclicRelation { location, .. }
            | ParserError::DuplicateField { location, .. }
            | ParserError::InvalidAttribute { location, .. }
            | ParserError::InvalidDefault { location, .. }
            | ParserError::MissingPrimaryKey { location, .. }
            | ParserError::DuplicateType { location, .. }
            | ParserError::InvalidEnum { location, .. }
            | ParserError::DuplicateStorageName { location, .. }
            | ParserError::DuplicateCollection { location, .. }
            | ParserError::InvalidIndex { location, .. } => Some(location),
            ParserError::FileNotFound(_) | ParserError::IO(_) => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ParserError::Syntax { .. } => "P000",
            ParserError::DuplicateModel { .. } => "R001",
            ParserError::UnknownModel { .. } => "R002",
            ParserError::InvalidForeignKey { .. } => "R003",
            ParserError::CyclicRelation { .. } => "R004",
            ParserError::DuplicateField { .. } => "R005",
            ParserError::InvalidAttribute { .. } => "A000",
            ParserError::InvalidDefault { .. } => "A001",
            ParserError::MissingPrimaryKey { .. } => "R006",
            ParserError::DuplicateType { .. } => "R007",
            ParserError::InvalidEnum { .. } => "R008",
            ParserError::DuplicateStorageName { .. } => "R009",
            ParserError::DuplicateCollection { .. } => "R010",
            ParserError::InvalidIndex { .. } => "A002",
            ParserError::FileNotFound(_) | ParserError::IO(_) => "F000",
        }
    }

    fn message(&self) -> String {
        match self {
            ParserError::Syntax { message, .. } => message.clone(),
            ParserError::DuplicateModel { name, .. } => format!("Duplicate model `{name}`"),
            ParserError::UnknownModel { name, .. } => {
                format!("Reference to unknown model `{name}`")
            }
            ParserError::InvalidForeignKey { message, .. }
            | ParserError::InvalidAttribute { message, .. }
            | ParserError::InvalidDefault { message, .. }
            | ParserError::InvalidEnum { message, .. }
            | ParserError::InvalidIndex { message, .. } => message.clone(),
            ParserError::DuplicateType { name, .. } => format!("Duplicate type `{name}`"),
            ParserError::DuplicateStorageName {
                model,
                storage_name,
                ..
            } => format!(
                "Two fields of model `{model}` are stored as `{storage_name}`"
            ),
            ParserError::DuplicateCollection { collection, .. } => {
                format!("Collection `{collection}` is used by more than one model")
            }
            ParserError::CyclicRelation { models, .. } => format!(
                "Required relations form a cycle: {}",
                models.join(" -> ")
            ),
            ParserError::DuplicateField { model, field, .. } => {
                format!("Duplicate field `{field}` in model `{model}`")
            }
            ParserError::MissingPrimaryKey { model, .. } => {
                format!("Model `{model}` must declare exactly one `@id` field")
            }
            ParserError::FileNotFound(_) | ParserError::IO(_) => self.to_string(),
        }
    }

    /// Convert to a diagnostic that can be emitted with a source excerpt
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            level: Level::Error,
            message: self.message(),
            code: Some(self.code().to_string()),
            spans: self
                .location()
                .map(|location| {
                    vec![SpanLabel {
                        span: location.span,
                        label: None,
                        style: SpanStyle::Primary,
                    }]
                })
                .unwrap_or_default(),
        }
    }
}
