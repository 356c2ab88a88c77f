// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;

use core_model::types::{Field, Model};

use crate::{
    GeneratorError,
    context::GenerationContext,
    emitter::{FROM, INDENT, INTO, ModelEmitter, OPTION, STRING, derive, emit_doc},
};

/// `MCreate`: required fields without a default are plain values, everything else is optional
/// and left to the runtime's defaults when `None`.
pub(crate) struct CreateInput;

impl ModelEmitter for CreateInput {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError> {
        let runtime = &context.runtime;
        let fields: Vec<(&Field, String, String)> = model
            .persisted_fields()
            .filter_map(|field| {
                let value_type = context.value_type(field)?;
                Some((field, context.field_ident(model, field), value_type))
            })
            .collect();

        // Generated enums have no default value
        let defaultable = fields
            .iter()
            .all(|(field, _, _)| is_optional_on_create(field) || field.enum_name().is_none());
        let traits: &[&str] = if defaultable {
            &["Debug", "Clone", "Default", "PartialEq"]
        } else {
            &["Debug", "Clone", "PartialEq"]
        };

        writeln!(writer, "/// Data for a new `{}`", model.name)?;
        writeln!(writer, "{}", derive(traits, &[]))?;
        writeln!(writer, "pub struct {}Create {{", model.name)?;
        for (field, ident, value_type) in &fields {
            emit_doc(writer, INDENT, field.doc.as_deref())?;
            if is_optional_on_create(field) {
                writeln!(writer, "{INDENT}pub {ident}: {OPTION}<{value_type}>,")?;
            } else {
                writeln!(writer, "{INDENT}pub {ident}: {value_type},")?;
            }
        }
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        writeln!(
            writer,
            "impl {FROM}<{}Create> for {runtime}::Record {{",
            model.name
        )?;
        writeln!(
            writer,
            "{INDENT}fn from(data: {}Create) -> Self {{",
            model.name
        )?;
        writeln!(writer, "{INDENT}{INDENT}let mut record = {runtime}::Record::new();")?;
        for (field, ident, _) in &fields {
            if is_optional_on_create(field) {
                writeln!(
                    writer,
                    "{INDENT}{INDENT}if let {OPTION}::Some(value) = data.{ident} {{"
                )?;
                writeln!(
                    writer,
                    "{INDENT}{INDENT}{INDENT}record.insert({STRING}::from(\"{}\"), {INTO}::into(value));",
                    field.name
                )?;
                writeln!(writer, "{INDENT}{INDENT}}}")?;
            } else {
                writeln!(
                    writer,
                    "{INDENT}{INDENT}record.insert({STRING}::from(\"{}\"), {INTO}::into(data.{ident}));",
                    field.name
                )?;
            }
        }
        writeln!(writer, "{INDENT}{INDENT}record")?;
        writeln!(writer, "{INDENT}}}")?;
        writeln!(writer, "}}")?;

        Ok(())
    }
}

fn is_optional_on_create(field: &Field) -> bool {
    field.nullable || field.list || !field.default.is_none()
}

/// `MUpdate`: one `Patch` per field except the primary key, `Keep` unless touched
pub(crate) struct UpdateInput;

impl ModelEmitter for UpdateInput {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError> {
        let runtime = &context.runtime;
        let fields: Vec<(&Field, String, String)> = model
            .persisted_fields()
            .filter(|field| field.name != model.pk_field)
            .filter_map(|field| {
                let value_type = context.value_type(field)?;
                Some((field, context.field_ident(model, field), value_type))
            })
            .collect();

        writeln!(
            writer,
            "/// Changes to an existing `{}`; untouched fields are left as they are",
            model.name
        )?;
        writeln!(writer, "{}", derive(&["Debug", "Clone", "Default", "PartialEq"], &[]))?;
        writeln!(writer, "pub struct {}Update {{", model.name)?;
        for (field, ident, value_type) in &fields {
            emit_doc(writer, INDENT, field.doc.as_deref())?;
            writeln!(writer, "{INDENT}pub {ident}: {runtime}::Patch<{value_type}>,")?;
        }
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        writeln!(
            writer,
            "impl {FROM}<{}Update> for {runtime}::RecordPatch {{",
            model.name
        )?;
        if fields.is_empty() {
            writeln!(writer, "{INDENT}fn from(_: {}Update) -> Self {{", model.name)?;
            writeln!(writer, "{INDENT}{INDENT}{runtime}::RecordPatch::new()")?;
        } else {
            writeln!(
                writer,
                "{INDENT}fn from(data: {}Update) -> Self {{",
                model.name
            )?;
            writeln!(
                writer,
                "{INDENT}{INDENT}let mut patch = {runtime}::RecordPatch::new();"
            )?;
            for (field, ident, _) in &fields {
                writeln!(
                    writer,
                    "{INDENT}{INDENT}patch.insert({STRING}::from(\"{}\"), data.{ident}.map({INTO}::into));",
                    field.name
                )?;
            }
            writeln!(writer, "{INDENT}{INDENT}patch")?;
        }
        writeln!(writer, "{INDENT}}}")?;
        writeln!(writer, "}}")?;

        Ok(())
    }
}
