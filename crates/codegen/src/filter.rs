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
    emitter::{INDENT, ModelEmitter},
};

/// A module of typed field handles (`m::field()`) for building filters, includes and orderings
pub(crate) struct FilterModule;

impl ModelEmitter for FilterModule {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError> {
        let runtime = &context.runtime;

        writeln!(writer, "/// Field handles of `{}`", model.name)?;
        writeln!(writer, "pub mod {} {{", context.model_module(model))?;

        for field in &model.fields {
            let (handle_type, constructor) = match &field.kind {
                FieldKind::Scalar(_) | FieldKind::Enum(_) => {
                    let Some(value_type) = context.value_type(field) else {
                        continue;
                    };
                    (
                        format!("{runtime}::ScalarField<{value_type}>"),
                        format!("{runtime}::ScalarField"),
                    )
                }
                FieldKind::Relation(_) => (
                    format!("{runtime}::RelationField"),
                    format!("{runtime}::RelationField"),
                ),
                FieldKind::BackCollection(_) => (
                    format!("{runtime}::CollectionField"),
                    format!("{runtime}::CollectionField"),
                ),
            };

            writeln!(
                writer,
                "{INDENT}pub const fn {}() -> {handle_type} {{",
                context.field_ident(model, field)
            )?;
            writeln!(writer, "{INDENT}{INDENT}{constructor}::new(\"{}\")", field.name)?;
            writeln!(writer, "{INDENT}}}")?;
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}
