// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::{mapped_arena::SerializableSlabIndex, scalar_type::ScalarType};

pub type ModelId = SerializableSlabIndex<Model>;

/// Storage type hint that marks a field as carrying an opaque identifier token.
pub const IDENTIFIER_HINT: &str = "ObjectId";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub usize);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    /// Name of the collection holding documents of this model
    pub collection_name: String,
    pub fields: Vec<Field>,
    pub pk_field: String,
    /// Compound `@@unique` and `@@index` declarations, in declaration order
    pub indexes: Vec<ModelIndex>,
    pub doc: Option<String>,
}

impl Model {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_storage_name(&self, storage_name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.is_persisted() && field.storage_name == storage_name)
    }

    pub fn pk(&self) -> Option<&Field> {
        self.field(&self.pk_field)
    }

    /// Fields stored in the document (excludes relation and back-collection fields)
    pub fn persisted_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_persisted())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Name used on the wire (`@map`), same as `name` unless overridden
    pub storage_name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub list: bool,
    pub default: DefaultPolicy,
    pub unique: bool,
    /// Advisory storage type hint such as `ObjectId` (from `@db.ObjectId`), with its
    /// arguments if it has any (`VarChar(5)`)
    pub native_type: Option<String>,
    pub doc: Option<String>,
}

impl Field {
    /// The stored scalar type. Enum values are stored as strings.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match &self.kind {
            FieldKind::Scalar(typ) => Some(*typ),
            FieldKind::Enum(_) => Some(ScalarType::String),
            FieldKind::Relation(_) | FieldKind::BackCollection(_) => None,
        }
    }

    pub fn enum_name(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.kind, FieldKind::Scalar(_) | FieldKind::Enum(_))
    }

    /// Does this field hold store-native identifier tokens?
    pub fn is_identifier(&self) -> bool {
        self.native_type.as_deref() == Some(IDENTIFIER_HINT)
    }

    pub fn relation_id(&self) -> Option<RelationId> {
        match &self.kind {
            FieldKind::Relation(id) | FieldKind::BackCollection(id) => Some(*id),
            FieldKind::Scalar(_) | FieldKind::Enum(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    /// One of the values of the named enum
    Enum(String),
    /// The owning (to-one) side of a relation. Not persisted; the foreign key field is.
    Relation(RelationId),
    /// The derived to-many side of a relation. Computed at read time, never persisted.
    BackCollection(RelationId),
}

/// How a value is supplied when a create call leaves the field out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub enum DefaultPolicy {
    #[default]
    None,
    Literal(DefaultLiteral),
    /// `auto()`: a store-native identifier, allocated by the runtime at create time
    GeneratedId,
    /// `uuid()`
    Uuid,
    /// `now()`
    Now,
}

impl DefaultPolicy {
    pub fn is_none(&self) -> bool {
        matches!(self, DefaultPolicy::None)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DefaultLiteral {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
}

/// `@@unique([a, b])` or `@@index([a, b])`. Field names, not storage names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelIndex {
    pub fields: Vec<String>,
    pub unique: bool,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub doc: Option<String>,
}

impl EnumType {
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|value| value.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub doc: Option<String>,
}

/// A foreign-key backed link from an owning model to a target model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: Option<String>,
    pub owner: ModelId,
    pub target: ModelId,
    /// Scalar field on the owner holding the target's key
    pub fk_field: String,
    /// Field on the target the foreign key points to (its primary key)
    pub referenced_field: String,
    /// The to-one relation field on the owner
    pub relation_field: String,
    /// The back-collection field on the target
    pub back_field: String,
    /// Is the foreign key non-nullable?
    pub required: bool,
}
