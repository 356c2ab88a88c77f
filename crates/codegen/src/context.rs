// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};

use core_model::{
    scalar_type::ScalarType,
    schema::SchemaGraph,
    types::{EnumType, Field, Model},
};
use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::{
    GeneratorError, GeneratorOptions,
    emitter::{OPTION, STRING, VEC},
};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be written as raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Methods of the generated `Client` that accessor names must not shadow
const CLIENT_METHODS: &[&str] = &["new", "from_context", "context"];

/// The Rust names chosen for the items of a graph.
pub(crate) struct GenerationContext<'a> {
    pub graph: &'a SchemaGraph,
    /// Path prefix of the runtime crate, such as `::client_runtime`
    pub runtime: String,
    model_modules: HashMap<String, String>,
    field_names: HashMap<(String, String), String>,
    enum_variants: HashMap<(String, String), String>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(graph: &'a SchemaGraph, options: &GeneratorOptions) -> Result<Self, GeneratorError> {
        let mut type_names: HashSet<String> = HashSet::from(["Client".to_string()]);
        for enum_type in graph.enums.values() {
            if !type_names.insert(enum_type.name.clone()) {
                return Err(GeneratorError::NameCollision(enum_type.name.clone()));
            }
        }
        for model in graph.models.values() {
            for type_name in [
                model.name.clone(),
                format!("{}Create", model.name),
                format!("{}Update", model.name),
                format!("{}Accessor", model.name),
            ] {
                if !type_names.insert(type_name.clone()) {
                    return Err(GeneratorError::NameCollision(type_name));
                }
            }
        }

        // Modules share the type namespace; accessor methods share these names too
        let mut taken: HashSet<String> = type_names;
        taken.extend(CLIENT_METHODS.iter().map(|name| name.to_string()));

        let mut model_modules = HashMap::new();
        let mut field_names = HashMap::new();

        for model in graph.models.values() {
            let module = unique_name(&model.name.to_snake_case(), &mut taken);
            model_modules.insert(model.name.clone(), module);

            let mut taken_fields = HashSet::new();
            for field in &model.fields {
                let name = unique_name(&field.name.to_snake_case(), &mut taken_fields);
                field_names.insert((model.name.clone(), field.name.clone()), name);
            }
        }

        let mut enum_variants = HashMap::new();
        for enum_type in graph.enums.values() {
            let mut taken_variants = HashSet::new();
            for value in &enum_type.values {
                let variant = unique_name(&value.name.to_upper_camel_case(), &mut taken_variants);
                enum_variants.insert((enum_type.name.clone(), value.name.clone()), variant);
            }
        }

        Ok(Self {
            graph,
            runtime: format!("::{}", options.runtime_crate),
            model_modules,
            field_names,
            enum_variants,
        })
    }

    /// The snake-case name of the model's filter module and `Client` accessor method
    pub fn model_module(&self, model: &Model) -> String {
        self.model_modules
            .get(&model.name)
            .map(|name| rust_ident(name))
            .unwrap_or_else(|| rust_ident(&model.name.to_snake_case()))
    }

    /// The snake-case name for `field`, unique within its model (not escaped)
    pub fn field_name(&self, model: &Model, field: &Field) -> String {
        self.field_names
            .get(&(model.name.clone(), field.name.clone()))
            .cloned()
            .unwrap_or_else(|| field.name.to_snake_case())
    }

    /// `field_name`, escaped for use as an identifier
    pub fn field_ident(&self, model: &Model, field: &Field) -> String {
        rust_ident(&self.field_name(model, field))
    }

    /// The Rust variant for a value of `enum_type`, unique within the enum (escaped)
    pub fn enum_variant(&self, enum_type: &EnumType, value: &str) -> String {
        let variant = self
            .enum_variants
            .get(&(enum_type.name.clone(), value.to_string()))
            .cloned()
            .unwrap_or_else(|| value.to_upper_camel_case());
        rust_ident(&variant)
    }

    /// The Rust type of a persisted field, ignoring nullability
    pub fn value_type(&self, field: &Field) -> Option<String> {
        let element = match field.enum_name() {
            Some(name) => name.to_string(),
            None => self.scalar_type(field.scalar_type()?),
        };
        Some(if field.list {
            format!("{VEC}<{element}>")
        } else {
            element
        })
    }

    /// The Rust type of a persisted field, with nullable fields as `Option`
    pub fn field_type(&self, field: &Field) -> Option<String> {
        let value_type = self.value_type(field)?;
        Some(if field.nullable {
            format!("{OPTION}<{value_type}>")
        } else {
            value_type
        })
    }

    fn scalar_type(&self, scalar: ScalarType) -> String {
        let runtime = &self.runtime;
        match scalar {
            ScalarType::String => STRING.to_string(),
            ScalarType::Int => "i32".to_string(),
            ScalarType::BigInt => "i64".to_string(),
            ScalarType::Float => "f64".to_string(),
            ScalarType::Boolean => "bool".to_string(),
            ScalarType::DateTime => {
                format!("{runtime}::chrono::DateTime<{runtime}::chrono::Utc>")
            }
            ScalarType::Json => format!("{runtime}::serde_json::Value"),
        }
    }
}

/// `base`, or `base_2`, `base_3`... if already taken
fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

pub(crate) fn rust_ident(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}
