// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Generates a typed Rust client from a schema graph.
//!
//! The output depends only on the graph and the options, so generating twice yields the same
//! text.

use std::fmt::Write;

use core_model::schema::{ModelSerializationError, SchemaGraph};
use thiserror::Error;
use tracing::instrument;

mod accessor;
mod context;
mod emitter;
mod enums;
mod filter;
mod inputs;
mod record;

use accessor::{Accessor, emit_client};
use context::GenerationContext;
use emitter::ModelEmitter;
use enums::emit_enum;
use filter::FilterModule;
use inputs::{CreateInput, UpdateInput};
use record::RecordStruct;

pub struct GeneratorOptions {
    /// The crate name generated code uses to reach the runtime
    pub runtime_crate: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            runtime_crate: "client_runtime".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to write generated code")]
    Fmt(#[from] std::fmt::Error),

    #[error("Failed to embed the schema: {0}")]
    Serialize(#[from] ModelSerializationError),

    #[error("Generated name `{0}` is used twice; rename one of the models")]
    NameCollision(String),
}

const MODEL_EMITTERS: &[&dyn ModelEmitter] = &[
    &RecordStruct,
    &CreateInput,
    &UpdateInput,
    &FilterModule,
    &Accessor,
];

#[instrument(name = "codegen::generate", skip_all)]
pub fn generate(graph: &SchemaGraph, options: &GeneratorOptions) -> Result<String, GeneratorError> {
    let context = GenerationContext::new(graph, options)?;
    let mut writer = String::new();

    writeln!(writer, "// @generated by docmodel. Do not edit.")?;
    writeln!(writer)?;
    emit_schema_json(&graph.serialize()?, &mut writer)?;

    for enum_type in graph.enums.values() {
        writeln!(writer)?;
        emit_enum(enum_type, &context, &mut writer)?;
    }

    for model in graph.models.values() {
        for emitter in MODEL_EMITTERS {
            writeln!(writer)?;
            emitter.emit(model, &context, &mut writer)?;
        }
    }

    writeln!(writer)?;
    emit_client(&context, &mut writer)?;

    Ok(writer)
}

/// The serialized graph as a raw string literal with enough `#`s to hold it
fn emit_schema_json(json: &str, writer: &mut String) -> Result<(), GeneratorError> {
    let longest_run = json
        .split('"')
        .skip(1)
        .map(|after_quote| after_quote.chars().take_while(|c| *c == '#').count())
        .max()
        .unwrap_or(0);
    let hashes = "#".repeat(longest_run + 1);

    writeln!(writer, "pub const SCHEMA_JSON: &str = r{hashes}\"{json}\"{hashes};")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    const SCHEMA: &str = r#"
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

    fn generate_sample() -> String {
        let graph = builder::build_system_from_str(SCHEMA, "sample.prisma".to_string()).unwrap();
        generate(&graph, &GeneratorOptions::default()).unwrap()
    }

    #[multiplatform_test]
    fn deterministic() {
        assert_eq!(generate_sample(), generate_sample());
    }

    #[multiplatform_test]
    fn records_and_inputs() {
        let generated = generate_sample();

        assert!(generated.starts_with("// @generated by docmodel. Do not edit.\n"));
        assert!(generated.contains("pub struct A {\n    pub id: ::std::string::String,\n    pub gql: ::core::option::Option<::std::string::String>,\n    #[serde(default)]\n    pub bs: ::core::option::Option<::std::vec::Vec<B>>,\n}"));
        assert!(generated.contains("    #[serde(default)]\n    pub a: ::core::option::Option<::std::boxed::Box<A>>,"));
        // `bId` and `b_id` both snake-case to `b_id`
        assert!(generated.contains("    pub b_id: ::core::option::Option<::std::string::String>,\n    #[serde(default)]\n    pub b: ::core::option::Option<::std::boxed::Box<B>>,\n    #[serde(rename = \"bId\")]\n    pub b_id_2: ::core::option::Option<::std::string::String>,"));

        assert!(generated.contains("pub struct BCreate {\n    pub id: ::core::option::Option<::std::string::String>,\n    pub a_id: ::std::string::String,\n}"));
        assert!(generated.contains("        record.insert(::std::string::String::from(\"a_id\"), ::core::convert::Into::into(data.a_id));"));
        assert!(generated.contains("pub struct BUpdate {\n    pub a_id: ::client_runtime::Patch<::std::string::String>,\n}"));
        assert!(generated.contains("        patch.insert(::std::string::String::from(\"bId\"), data.b_id_2.map(::core::convert::Into::into));"));
    }

    #[multiplatform_test]
    fn handles_and_accessors() {
        let generated = generate_sample();

        insta::assert_snapshot!(
            generated
                .split("/// Field handles of `C`\n")
                .nth(1)
                .and_then(|rest| rest.split("\n}\n").next())
                .unwrap(),
            @r#"
        pub mod c {
            pub const fn id() -> ::client_runtime::ScalarField<::std::string::String> {
                ::client_runtime::ScalarField::new("id")
            }
            pub const fn b_id() -> ::client_runtime::ScalarField<::std::string::String> {
                ::client_runtime::ScalarField::new("b_id")
            }
            pub const fn b() -> ::client_runtime::RelationField {
                ::client_runtime::RelationField::new("b")
            }
            pub const fn b_id_2() -> ::client_runtime::ScalarField<::std::string::String> {
                ::client_runtime::ScalarField::new("bId")
            }
        "#
        );

        assert!(generated.contains("    pub async fn fetch_a(&self, id: impl ::core::convert::Into<::std::string::String>) -> ::core::result::Result<::core::option::Option<A>, ::client_runtime::ExecutionError> {"));
        assert!(generated.contains("    pub async fn fetch_cs(&self, id: impl ::core::convert::Into<::std::string::String>) -> ::core::result::Result<::std::vec::Vec<C>, ::client_runtime::ExecutionError> {"));
        assert!(generated.contains("        ::client_runtime::from_records(\"C\", self.ops.related_many(::core::convert::Into::<::std::string::String>::into(id), \"cs\").await?)"));
        assert!(generated.contains("    pub fn b(&self) -> BAccessor<'_> {\n        BAccessor { ops: self.context.model_ops(\"B\") }\n    }"));
    }

    #[multiplatform_test]
    fn embedded_schema_round_trips() {
        let graph = builder::build_system_from_str(SCHEMA, "sample.prisma".to_string()).unwrap();
        let generated = generate(&graph, &GeneratorOptions::default()).unwrap();

        let json = generated
            .split("pub const SCHEMA_JSON: &str = r#\"")
            .nth(1)
            .and_then(|rest| rest.split("\"#;\n").next())
            .unwrap();
        assert_eq!(json, graph.serialize().unwrap());
    }

    #[multiplatform_test]
    fn raw_string_hashes() {
        let mut writer = String::new();
        emit_schema_json(r###"{"a":"\"#x"}"###, &mut writer).unwrap();
        assert_eq!(
            writer,
            "pub const SCHEMA_JSON: &str = r##\"{\"a\":\"\\\"#x\"}\"##;\n"
        );
    }

    #[multiplatform_test]
    fn models_named_like_std_types() {
        let graph = builder::build_system_from_str(
            "model Result {\n  id    String @id\n  vecs  Vec[]\n}\n\nmodel Vec {\n  id       String  @id\n  resultId String\n  result   Result  @relation(fields: [resultId], references: [id])\n}\n",
            "std.prisma".to_string(),
        )
        .unwrap();
        let generated = generate(&graph, &GeneratorOptions::default()).unwrap();

        assert!(generated.contains("    pub vecs: ::core::option::Option<::std::vec::Vec<Vec>>,"));
        assert!(generated.contains("    pub result: ::core::option::Option<::std::boxed::Box<Result>>,"));
        assert!(generated.contains("    pub async fn find_unique(&self, id: impl ::core::convert::Into<::std::string::String>) -> ::core::result::Result<::core::option::Option<Result>, ::client_runtime::ExecutionError> {"));
        // No item refers to a std type by its bare name
        for bare in ["Option<", "Result<", "Vec<", "Box<", "Into::", "impl From<", ": String", "<String>"] {
            let unqualified = generated
                .lines()
                .filter(|line| !line.starts_with("pub const SCHEMA_JSON"))
                .any(|line| {
                    line.match_indices(bare)
                        .any(|(at, _)| !line[..at].ends_with("::"))
                });
            assert!(!unqualified, "`{bare}` is used unqualified");
        }
    }

    #[multiplatform_test]
    fn enums_and_docs() {
        let graph = builder::build_system_from_str(
            "enum Plan {\n  FREE\n  PRO\n}\n\n/// A paying customer\nmodel Account {\n  id    String @id\n  /// Current plan\n  plan  Plan\n  plans Plan[]\n}\n",
            "plans.prisma".to_string(),
        )
        .unwrap();
        let generated = generate(&graph, &GeneratorOptions::default()).unwrap();

        assert!(generated.contains("pub enum Plan {"));
        assert!(generated.contains("/// A paying customer\n///\n/// A record of `Account` (collection `Account`)\n"));
        assert!(generated.contains("    /// Current plan\n    pub plan: Plan,\n    pub plans: ::std::vec::Vec<Plan>,\n}"));
        // `plan` is required and `Plan` has no default
        assert!(generated.contains("#[derive(::core::fmt::Debug, ::core::clone::Clone, ::core::cmp::PartialEq)]\npub struct AccountCreate {"));
        assert!(generated.contains("    pub plan: ::client_runtime::Patch<Plan>,"));
        assert!(generated.contains("    pub const fn plan() -> ::client_runtime::ScalarField<Plan> {"));
    }

    #[multiplatform_test]
    fn enum_and_model_name_collision() {
        let graph = builder::build_system_from_str(
            "enum Plan {\n  FREE\n}\n\nmodel PlanCreate {\n  id String @id\n}\n\nmodel Plan2 {\n  id String @id\n}\n",
            "collide.prisma".to_string(),
        )
        .unwrap();
        assert!(generate(&graph, &GeneratorOptions::default()).is_ok());

        let graph = builder::build_system_from_str(
            "enum ACreate {\n  X\n}\n\nmodel A {\n  id String @id\n}\n",
            "collide.prisma".to_string(),
        )
        .unwrap();
        assert!(matches!(
            generate(&graph, &GeneratorOptions::default()),
            Err(GeneratorError::NameCollision(name)) if name == "ACreate"
        ));
    }

    #[multiplatform_test]
    fn colliding_type_names() {
        let graph = builder::build_system_from_str(
            "model A {\n  id String @id\n}\n\nmodel ACreate {\n  id String @id\n}\n",
            "collide.prisma".to_string(),
        )
        .unwrap();

        assert!(matches!(
            generate(&graph, &GeneratorOptions::default()),
            Err(GeneratorError::NameCollision(name)) if name == "ACreate"
        ));
    }
}
