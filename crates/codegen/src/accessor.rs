// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;

use core_model::types::{FieldKind, Model};

use crate::{
    GeneratorError,
    context::GenerationContext,
    emitter::{INDENT, INTO, ModelEmitter, OPTION, RESULT, STRING, VEC},
};

/// `MAccessor`: typed wrappers over the runtime's model operations
pub(crate) struct Accessor;

impl ModelEmitter for Accessor {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError> {
        let runtime = &context.runtime;
        let name = &model.name;
        let error = format!("{runtime}::ExecutionError");
        let id_type = model
            .pk()
            .and_then(|pk| context.value_type(pk))
            .unwrap_or_else(|| STRING.to_string());

        let id = format!("{INTO}::<{id_type}>::into(id)");
        let id_param = format!("id: impl {INTO}<{id_type}>");
        let decode_one = format!(".map(|record| {runtime}::from_record(\"{name}\", record))");

        writeln!(writer, "/// Operations on `{name}`")?;
        writeln!(writer, "pub struct {name}Accessor<'a> {{")?;
        writeln!(writer, "{INDENT}ops: {runtime}::ModelOps<'a>,")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
        writeln!(writer, "impl {name}Accessor<'_> {{")?;

        let mut methods = vec![
            Method {
                signature: format!(
                    "pub fn with_cancellation(self, cancellation: {runtime}::CancellationToken) -> Self"
                ),
                body: "Self { ops: self.ops.with_cancellation(cancellation) }".to_string(),
            },
            Method {
                signature: format!(
                    "pub async fn find_unique(&self, {id_param}) -> {RESULT}<{OPTION}<{name}>, {error}>"
                ),
                body: format!(
                    "self.ops.find_unique({id}).await?{decode_one}.transpose()"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn find_unique_with(&self, {id_param}, include: &[{runtime}::Include]) -> {RESULT}<{OPTION}<{name}>, {error}>"
                ),
                body: format!(
                    "self.ops.find_unique_with({id}, include).await?{decode_one}.transpose()"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn find_many(&self, filter: {runtime}::Filter) -> {RESULT}<{VEC}<{name}>, {error}>"
                ),
                body: format!(
                    "self.find_many_with({runtime}::FindManyArgs::filter(filter)).await"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn find_many_with(&self, args: {runtime}::FindManyArgs) -> {RESULT}<{VEC}<{name}>, {error}>"
                ),
                body: format!(
                    "{runtime}::from_records(\"{name}\", self.ops.find_many(&args).await?)"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn create(&self, data: {name}Create) -> {RESULT}<{name}, {error}>"
                ),
                body: format!(
                    "{runtime}::from_record(\"{name}\", self.ops.create({INTO}::into(data)).await?)"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn update(&self, {id_param}, data: {name}Update) -> {RESULT}<{OPTION}<{name}>, {error}>"
                ),
                body: format!(
                    "self.ops.update({id}, {INTO}::into(data)).await?{decode_one}.transpose()"
                ),
            },
            Method {
                signature: format!(
                    "pub async fn delete(&self, {id_param}) -> {RESULT}<bool, {error}>"
                ),
                body: format!("self.ops.delete({id}).await"),
            },
            Method {
                signature: format!(
                    "pub async fn delete_many(&self, filter: {runtime}::Filter) -> {RESULT}<u64, {error}>"
                ),
                body: "self.ops.delete_many(&filter).await".to_string(),
            },
        ];

        for field in &model.fields {
            let Some(related) = context.graph.related_model(field) else {
                continue;
            };
            let related_name = &related.name;
            let method_name = format!("fetch_{}", context.field_name(model, field));

            match field.kind {
                FieldKind::Relation(_) => methods.push(Method {
                    signature: format!(
                        "pub async fn {method_name}(&self, {id_param}) -> {RESULT}<{OPTION}<{related_name}>, {error}>"
                    ),
                    body: format!(
                        "self.ops.related_one({id}, \"{}\").await?.map(|record| {runtime}::from_record(\"{related_name}\", record)).transpose()",
                        field.name
                    ),
                }),
                FieldKind::BackCollection(_) => methods.push(Method {
                    signature: format!(
                        "pub async fn {method_name}(&self, {id_param}) -> {RESULT}<{VEC}<{related_name}>, {error}>"
                    ),
                    body: format!(
                        "{runtime}::from_records(\"{related_name}\", self.ops.related_many({id}, \"{}\").await?)",
                        field.name
                    ),
                }),
                FieldKind::Scalar(_) | FieldKind::Enum(_) => {}
            }
        }

        for (index, method) in methods.iter().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            method.emit(writer)?;
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}

struct Method {
    signature: String,
    body: String,
}

impl Method {
    fn emit(&self, writer: &mut String) -> Result<(), GeneratorError> {
        writeln!(writer, "{INDENT}{} {{", self.signature)?;
        writeln!(writer, "{INDENT}{INDENT}{}", self.body)?;
        writeln!(writer, "{INDENT}}}")?;
        Ok(())
    }
}

/// The `Client`: the embedded schema graph and one accessor per model
pub(crate) fn emit_client(
    context: &GenerationContext,
    writer: &mut String,
) -> Result<(), GeneratorError> {
    let runtime = &context.runtime;

    writeln!(writer, "pub struct Client {{")?;
    writeln!(writer, "{INDENT}context: {runtime}::ClientContext,")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;
    writeln!(writer, "impl Client {{")?;

    let mut methods = vec![
        Method {
            signature: format!(
                "pub fn new(transport: ::std::sync::Arc<dyn {runtime}::Transport>) -> {RESULT}<Self, {runtime}::ExecutionError>"
            ),
            body: format!(
                "{runtime}::ClientContext::from_schema_json(SCHEMA_JSON, transport).map(Self::from_context)"
            ),
        },
        Method {
            signature: format!("pub fn from_context(context: {runtime}::ClientContext) -> Self"),
            body: "Self { context }".to_string(),
        },
        Method {
            signature: format!("pub fn context(&self) -> &{runtime}::ClientContext"),
            body: "&self.context".to_string(),
        },
    ];

    for model in context.graph.models.values() {
        methods.push(Method {
            signature: format!(
                "pub fn {}(&self) -> {}Accessor<'_>",
                context.model_module(model),
                model.name
            ),
            body: format!(
                "{}Accessor {{ ops: self.context.model_ops(\"{}\") }}",
                model.name, model.name
            ),
        });
    }

    for (index, method) in methods.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        method.emit(writer)?;
    }

    writeln!(writer, "}}")?;
    Ok(())
}
