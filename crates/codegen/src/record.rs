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
    emitter::{BOX, INDENT, ModelEmitter, OPTION, VEC, derive, emit_doc},
};

/// The record struct: persisted fields, plus relations that are filled only when included
pub(crate) struct RecordStruct;

impl ModelEmitter for RecordStruct {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError> {
        let runtime = &context.runtime;

        if model.doc.is_some() {
            emit_doc(writer, "", model.doc.as_deref())?;
            writeln!(writer, "///")?;
        }
        writeln!(
            writer,
            "/// A record of `{}` (collection `{}`)",
            model.name, model.collection_name
        )?;
        writeln!(
            writer,
            "{}",
            derive(
                &["Debug", "Clone", "PartialEq"],
                &[
                    format!("{runtime}::serde::Serialize"),
                    format!("{runtime}::serde::Deserialize"),
                ],
            )
        )?;
        writeln!(writer, "#[serde(crate = \"{runtime}::serde\")]")?;
        writeln!(writer, "pub struct {} {{", model.name)?;

        for field in &model.fields {
            let ident = context.field_ident(model, field);

            let field_type = match &field.kind {
                FieldKind::Scalar(_) | FieldKind::Enum(_) => context.field_type(field),
                FieldKind::Relation(_) => context
                    .graph
                    .related_model(field)
                    .map(|target| format!("{OPTION}<{BOX}<{}>>", target.name)),
                FieldKind::BackCollection(_) => context
                    .graph
                    .related_model(field)
                    .map(|owner| format!("{OPTION}<{VEC}<{}>>", owner.name)),
            };
            let Some(field_type) = field_type else {
                continue;
            };

            emit_doc(writer, INDENT, field.doc.as_deref())?;
            if context.field_name(model, field) != field.name {
                writeln!(writer, "{INDENT}#[serde(rename = \"{}\")]", field.name)?;
            }
            if !field.is_persisted() {
                writeln!(writer, "{INDENT}#[serde(default)]")?;
            }
            writeln!(writer, "{INDENT}pub {ident}: {field_type},")?;
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}
