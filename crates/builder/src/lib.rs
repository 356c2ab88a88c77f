// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fs, io, path::Path};

use codemap::CodeMap;
use codemap_diagnostic::{ColorConfig, Emitter};
use core_model::schema::SchemaGraph;
use error::ParserError;

pub mod ast;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod resolver;
mod util;

pub use renderer::render;

/// Build a schema graph from a schema file. Errors are also reported to stderr with a source
/// excerpt, colored only if `use_color` is set.
pub fn build_system(
    schema_file: impl AsRef<Path>,
    use_color: bool,
) -> Result<SchemaGraph, ParserError> {
    let schema_file = schema_file.as_ref();
    let file_content = fs::read_to_string(schema_file).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ParserError::FileNotFound(schema_file.display().to_string()),
        _ => ParserError::IO(err),
    })?;

    let mut codemap = CodeMap::new();
    let result = build_from_str(
        &file_content,
        &mut codemap,
        &schema_file.display().to_string(),
    );

    result.inspect_err(|err| emit_diagnostics(err, &codemap, color_config(use_color)))
}

/// Build a schema graph from source text. Errors are returned, not reported.
pub fn build_system_from_str(
    schema_str: &str,
    file_name: String,
) -> Result<SchemaGraph, ParserError> {
    let mut codemap = CodeMap::new();
    build_from_str(schema_str, &mut codemap, &file_name)
}

/// Parse, validate, and render `schema_str` in canonical form
pub fn format_schema(schema_str: &str, file_name: String) -> Result<String, ParserError> {
    build_system_from_str(schema_str, file_name).map(|graph| render(&graph))
}

fn build_from_str(
    schema_str: &str,
    codemap: &mut CodeMap,
    file_name: &str,
) -> Result<SchemaGraph, ParserError> {
    let ast = parser::parse_str(schema_str, codemap, file_name)?;
    resolver::resolve(&ast, codemap)
}

fn color_config(use_color: bool) -> ColorConfig {
    if use_color {
        ColorConfig::Always
    } else {
        ColorConfig::Never
    }
}

fn emit_diagnostics(err: &ParserError, codemap: &CodeMap, color: ColorConfig) {
    let mut emitter = Emitter::stderr(color, Some(codemap));

    match err {
        ParserError::FileNotFound(_) | ParserError::IO(_) => {}
        _ => emitter.emit(&[err.diagnostic()]),
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    pub const SAMPLE_SCHEMA: &str = r#"
datasource db {
  provider = "mongodb"
  url      = env("DATABASE_URL")
}

generator client {
  provider = "docmodel-client-rust"
  output   = "../src/generated.rs"
}

// A has many B (synthesized as A.bs)
model A {
  id  String  @id @default(auto()) @map("_id") @db.ObjectId
  gql String?
}

model B {
  id   String @id @default(auto()) @map("_id") @db.ObjectId
  a_id String @db.ObjectId
  a    A      @relation(fields: [a_id], references: [id])
}

model C {
  id   String  @id @default(auto()) @map("_id") @db.ObjectId
  b_id String? @db.ObjectId
  b    B?      @relation(fields: [b_id], references: [id])
  bId  String?
}
"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn missing_file() {
        let err = build_system("does-not-exist.prisma", false).unwrap_err();
        assert!(matches!(err, ParserError::FileNotFound(name) if name == "does-not-exist.prisma"));
    }

    #[multiplatform_test]
    fn diagnostics_follow_the_color_choice() {
        assert!(matches!(color_config(true), ColorConfig::Always));
        assert!(matches!(color_config(false), ColorConfig::Never));
    }

    #[multiplatform_test]
    fn formatting_is_idempotent() {
        let formatted = format_schema(test_util::SAMPLE_SCHEMA, "a.prisma".to_string()).unwrap();
        assert_eq!(
            format_schema(&formatted, "b.prisma".to_string()).unwrap(),
            formatted
        );
    }

    #[multiplatform_test]
    fn unknown_model_is_reported_with_location() {
        let src = "model B {\n  id String @id\n  a_id String\n  a A @relation(fields: [a_id], references: [id])\n}\n";
        let err = build_system_from_str(src, "input.prisma".to_string()).unwrap_err();

        assert!(matches!(&err, ParserError::UnknownModel { name, .. } if name == "A"));
        let location = err.location().unwrap();
        assert_eq!((location.line, location.column), (4, 5));
    }
}
