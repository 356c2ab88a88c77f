// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;

use core_model::types::Model;

use crate::{GeneratorError, context::GenerationContext};

pub(crate) const INDENT: &str = "    ";

// Generated code names std items by absolute path so that a model called `Result` or `Vec`
// cannot shadow them.
pub(crate) const OPTION: &str = "::core::option::Option";
pub(crate) const RESULT: &str = "::core::result::Result";
pub(crate) const VEC: &str = "::std::vec::Vec";
pub(crate) const BOX: &str = "::std::boxed::Box";
pub(crate) const STRING: &str = "::std::string::String";
pub(crate) const INTO: &str = "::core::convert::Into";
pub(crate) const FROM: &str = "::core::convert::From";

/// Writes the items generated for one model
pub(crate) trait ModelEmitter {
    fn emit(
        &self,
        model: &Model,
        context: &GenerationContext,
        writer: &mut String,
    ) -> Result<(), GeneratorError>;
}

/// `#[derive(...)]` of the given std traits plus any extra paths
pub(crate) fn derive(std_traits: &[&str], extra: &[String]) -> String {
    let paths: Vec<String> = std_traits
        .iter()
        .map(|name| {
            let module = match *name {
                "Debug" => "fmt",
                "Clone" => "clone",
                "Copy" => "marker",
                "Default" => "default",
                "Hash" => "hash",
                _ => "cmp",
            };
            format!("::core::{module}::{name}")
        })
        .chain(extra.iter().cloned())
        .collect();
    format!("#[derive({})]", paths.join(", "))
}

/// A schema doc comment as `///` lines
pub(crate) fn emit_doc(
    writer: &mut String,
    indent: &str,
    doc: Option<&str>,
) -> Result<(), GeneratorError> {
    for line in doc.into_iter().flat_map(str::lines) {
        if line.is_empty() {
            writeln!(writer, "{indent}///")?;
        } else {
            writeln!(writer, "{indent}/// {line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn derives() {
        assert_eq!(
            derive(&["Debug", "PartialEq", "Copy"], &["::rt::serde::Serialize".to_string()]),
            "#[derive(::core::fmt::Debug, ::core::cmp::PartialEq, ::core::marker::Copy, ::rt::serde::Serialize)]"
        );
    }

    #[multiplatform_test]
    fn docs() {
        let mut writer = String::new();
        emit_doc(&mut writer, INDENT, Some("First\n\nThird")).unwrap();
        emit_doc(&mut writer, INDENT, None).unwrap();
        assert_eq!(writer, "    /// First\n    ///\n    /// Third\n");
    }
}
