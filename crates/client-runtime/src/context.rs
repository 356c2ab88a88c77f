// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use core_model::{
    schema::SchemaGraph,
    types::{Model, ModelId},
};
use doc_query::{DatabaseExecutor, Transport};

use crate::{
    error::ExecutionError,
    id::{IdGenerator, ObjectIdGenerator},
    ops::ModelOps,
};

/// Everything a call needs: the schema, the executor over the injected transport, and the
/// generator for default identifiers. Cheap to clone; immutable once built.
#[derive(Clone)]
pub struct ClientContext {
    schema: Arc<SchemaGraph>,
    executor: Arc<DatabaseExecutor>,
    id_generator: Arc<dyn IdGenerator>,
}

impl ClientContext {
    pub fn new(schema: Arc<SchemaGraph>, transport: Arc<dyn Transport>) -> Self {
        Self {
            schema,
            executor: Arc::new(DatabaseExecutor::new(transport)),
            id_generator: Arc::new(ObjectIdGenerator::default()),
        }
    }

    /// Build a context from a serialized schema graph (as embedded by generated clients)
    pub fn from_schema_json(
        schema_json: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ExecutionError> {
        let schema = SchemaGraph::deserialize(schema_json)
            .map_err(|err| ExecutionError::Validation(format!("Invalid schema: {err}")))?;

        Ok(Self::new(Arc::new(schema), transport))
    }

    pub fn with_id_generator(self, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            id_generator,
            ..self
        }
    }

    pub fn schema(&self) -> &SchemaGraph {
        &self.schema
    }

    /// Operations on the model named `model_name`. The name is checked when an operation runs.
    pub fn model_ops<'a>(&'a self, model_name: &'a str) -> ModelOps<'a> {
        ModelOps::new(self, model_name)
    }

    pub(crate) fn model(&self, name: &str) -> Result<(ModelId, &Model), ExecutionError> {
        self.schema
            .model(name)
            .ok_or_else(|| ExecutionError::UnknownModel(name.to_string()))
    }

    pub(crate) fn executor(&self) -> &DatabaseExecutor {
        &self.executor
    }

    pub(crate) fn id_generator(&self) -> &dyn IdGenerator {
        self.id_generator.as_ref()
    }
}
