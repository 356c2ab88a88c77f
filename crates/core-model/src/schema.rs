// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    mapped_arena::MappedArena,
    types::{EnumType, Field, FieldKind, Model, ModelId, Relation, RelationId},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBlockKind {
    Datasource,
    Generator,
}

impl ConfigBlockKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ConfigBlockKind::Datasource => "datasource",
            ConfigBlockKind::Generator => "generator",
        }
    }
}

/// A `datasource` or `generator` block, kept as raw key/expression pairs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigBlock {
    pub kind: ConfigBlockKind,
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// The resolved and validated schema. Immutable once built.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SchemaGraph {
    pub config_blocks: Vec<ConfigBlock>,
    pub enums: MappedArena<EnumType>,
    pub models: MappedArena<Model>,
    pub relations: Vec<Relation>,
}

#[derive(Error, Debug)]
pub enum ModelSerializationError {
    #[error("Failed to serialize schema: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to deserialize schema: {0}")]
    Deserialize(#[source] serde_json::Error),
}

impl SchemaGraph {
    pub fn model(&self, name: &str) -> Option<(ModelId, &Model)> {
        self.models
            .get_id(name)
            .map(|model_id| (model_id, &self.models[model_id]))
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.get_by_key(name)
    }

    /// The enum a field's values come from, if it is an enum field
    pub fn field_enum(&self, field: &Field) -> Option<&EnumType> {
        field.enum_name().and_then(|name| self.enum_type(name))
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.0]
    }

    pub fn relations(&self) -> impl Iterator<Item = (RelationId, &Relation)> {
        self.relations
            .iter()
            .enumerate()
            .map(|(index, relation)| (RelationId(index), relation))
    }

    /// The model on the other end of a relation or back-collection field
    pub fn related_model(&self, field: &Field) -> Option<&Model> {
        let relation = self.relation(field.relation_id()?);
        match field.kind {
            FieldKind::Relation(_) => Some(&self.models[relation.target]),
            FieldKind::BackCollection(_) => Some(&self.models[relation.owner]),
            FieldKind::Scalar(_) | FieldKind::Enum(_) => None,
        }
    }

    pub fn serialize(&self) -> Result<String, ModelSerializationError> {
        serde_json::to_string(self).map_err(ModelSerializationError::Serialize)
    }

    pub fn serialize_pretty(&self) -> Result<String, ModelSerializationError> {
        serde_json::to_string_pretty(self).map_err(ModelSerializationError::Serialize)
    }

    pub fn deserialize(json: &str) -> Result<Self, ModelSerializationError> {
        serde_json::from_str(json).map_err(ModelSerializationError::Deserialize)
    }
}
