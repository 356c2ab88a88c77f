// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;

use core_model::types::EnumType;

use crate::{
    GeneratorError,
    context::GenerationContext,
    emitter::{FROM, INDENT, STRING, derive, emit_doc},
};

/// A Rust enum that serializes to the stored value names, and converts into a `Val`
pub(crate) fn emit_enum(
    enum_type: &EnumType,
    context: &GenerationContext,
    writer: &mut String,
) -> Result<(), GeneratorError> {
    let runtime = &context.runtime;
    let name = &enum_type.name;

    emit_doc(writer, "", enum_type.doc.as_deref())?;
    writeln!(
        writer,
        "{}",
        derive(
            &["Debug", "Clone", "Copy", "PartialEq", "Eq", "Hash"],
            &[
                format!("{runtime}::serde::Serialize"),
                format!("{runtime}::serde::Deserialize"),
            ],
        )
    )?;
    writeln!(writer, "#[serde(crate = \"{runtime}::serde\")]")?;
    writeln!(writer, "pub enum {name} {{")?;
    for value in &enum_type.values {
        emit_doc(writer, INDENT, value.doc.as_deref())?;
        writeln!(writer, "{INDENT}#[serde(rename = \"{}\")]", value.name)?;
        writeln!(
            writer,
            "{INDENT}{},",
            context.enum_variant(enum_type, &value.name)
        )?;
    }
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    writeln!(writer, "impl {name} {{")?;
    writeln!(writer, "{INDENT}/// The value as stored")?;
    writeln!(writer, "{INDENT}pub const fn as_str(&self) -> &'static str {{")?;
    writeln!(writer, "{INDENT}{INDENT}match self {{")?;
    for value in &enum_type.values {
        writeln!(
            writer,
            "{INDENT}{INDENT}{INDENT}Self::{} => \"{}\",",
            context.enum_variant(enum_type, &value.name),
            value.name
        )?;
    }
    writeln!(writer, "{INDENT}{INDENT}}}")?;
    writeln!(writer, "{INDENT}}}")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    writeln!(writer, "impl {FROM}<{name}> for {runtime}::Val {{")?;
    writeln!(writer, "{INDENT}fn from(value: {name}) -> Self {{")?;
    writeln!(
        writer,
        "{INDENT}{INDENT}{runtime}::Val::String({STRING}::from(value.as_str()))"
    )?;
    writeln!(writer, "{INDENT}}}")?;
    writeln!(writer, "}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorOptions;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn enum_items() {
        let graph = builder::build_system_from_str(
            "/// Billing plan\nenum Plan {\n  /// No charge\n  FREE\n  PRO_YEARLY\n}\n",
            "plan.prisma".to_string(),
        )
        .unwrap();
        let context = GenerationContext::new(&graph, &GeneratorOptions::default()).unwrap();

        let mut writer = String::new();
        emit_enum(graph.enum_type("Plan").unwrap(), &context, &mut writer).unwrap();

        insta::assert_snapshot!(writer, @r#"
        /// Billing plan
        #[derive(::core::fmt::Debug, ::core::clone::Clone, ::core::marker::Copy, ::core::cmp::PartialEq, ::core::cmp::Eq, ::core::hash::Hash, ::client_runtime::serde::Serialize, ::client_runtime::serde::Deserialize)]
        #[serde(crate = "::client_runtime::serde")]
        pub enum Plan {
            /// No charge
            #[serde(rename = "FREE")]
            Free,
            #[serde(rename = "PRO_YEARLY")]
            ProYearly,
        }

        impl Plan {
            /// The value as stored
            pub const fn as_str(&self) -> &'static str {
                match self {
                    Self::Free => "FREE",
                    Self::ProYearly => "PRO_YEARLY",
                }
            }
        }

        impl ::core::convert::From<Plan> for ::client_runtime::Val {
            fn from(value: Plan) -> Self {
                ::client_runtime::Val::String(::std::string::String::from(value.as_str()))
            }
        }
        "#);
    }
}
