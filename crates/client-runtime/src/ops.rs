// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use async_recursion::async_recursion;
use core_model::types::{Field, FieldKind, Model};
use doc_query::{
    AbstractDelete, AbstractInsert, AbstractOperation, AbstractOrderBy, AbstractPredicate,
    AbstractSelect, AbstractUpdate, Val, WireResponse,
};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    context::ClientContext,
    error::ExecutionError,
    filter::{FieldOp, Filter, FindManyArgs, Include, OrderBy},
    mapper::{
        decode::decode_document,
        predicate::to_predicate,
        write::{stage_create, stage_update},
    },
    value::{Record, RecordPatch},
};

/// The operations on one model. Generated accessors wrap this with typed signatures.
///
/// Each call issues one request (plus one batched request per include), checks for cancellation
/// before every request and before decoding, and never retries.
#[derive(Clone)]
pub struct ModelOps<'a> {
    context: &'a ClientContext,
    model_name: &'a str,
    cancellation: CancellationToken,
}

impl<'a> ModelOps<'a> {
    pub(crate) fn new(context: &'a ClientContext, model_name: &'a str) -> Self {
        Self {
            context,
            model_name,
            cancellation: CancellationToken::new(),
        }
    }

    /// Run subsequent calls under `cancellation`
    pub fn with_cancellation(self, cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            ..self
        }
    }

    pub fn model_name(&self) -> &str {
        self.model_name
    }

    fn model(&self) -> Result<&'a Model, ExecutionError> {
        self.context.model(self.model_name).map(|(_, model)| model)
    }

    /// Find the record with the given primary key
    pub async fn find_unique(&self, id: impl Into<Val>) -> Result<Option<Record>, ExecutionError> {
        self.find_unique_with(id, &[]).await
    }

    pub async fn find_unique_with(
        &self,
        id: impl Into<Val>,
        include: &[Include],
    ) -> Result<Option<Record>, ExecutionError> {
        let model = self.model()?;
        self.find_unique_by(&model.pk_field, id, include).await
    }

    /// Find the record whose primary key or `@unique` field `field` equals `value`
    #[instrument(name = "ModelOps::find_unique_by", skip_all, fields(model = self.model_name, field = field))]
    pub async fn find_unique_by(
        &self,
        field: &str,
        value: impl Into<Val>,
        include: &[Include],
    ) -> Result<Option<Record>, ExecutionError> {
        let model = self.model()?;
        let schema = self.context.schema();

        let unique = model
            .field(field)
            .is_some_and(|f| f.is_persisted() && (f.name == model.pk_field || f.unique));
        if !unique {
            return Err(ExecutionError::UnsupportedPredicate(format!(
                "`{}.{field}` is neither the primary key nor unique",
                model.name
            )));
        }

        let predicate = to_predicate(
            schema,
            model,
            &Filter::field(field, FieldOp::Equals(value.into())),
        )?;
        validate_includes(self.context, model, include)?;

        let mut select = AbstractSelect::new(&model.collection_name, predicate);
        select.limit = Some(2);

        let mut records = self.select(model, select).await?;
        if records.len() > 1 {
            return Err(ExecutionError::NonUniqueResult {
                model: model.name.clone(),
                count: records.len(),
            });
        }
        self.load_includes(model, &mut records, include).await?;

        Ok(records.pop())
    }

    #[instrument(name = "ModelOps::find_many", skip_all, fields(model = self.model_name))]
    pub async fn find_many(&self, args: &FindManyArgs) -> Result<Vec<Record>, ExecutionError> {
        let model = self.model()?;
        let schema = self.context.schema();

        let predicate = match &args.filter {
            Some(filter) => to_predicate(schema, model, filter)?,
            None => AbstractPredicate::True,
        };
        validate_includes(self.context, model, &args.include)?;
        let order_by = args
            .order_by
            .iter()
            .map(|order_by| sort_key(model, order_by))
            .collect::<Result<Vec<_>, _>>()?;

        let mut select = AbstractSelect::new(&model.collection_name, predicate);
        select.order_by = AbstractOrderBy(order_by);
        select.offset = args.skip;
        select.limit = args.take;

        let mut records = self.select(model, select).await?;
        self.load_includes(model, &mut records, &args.include).await?;

        Ok(records)
    }

    /// Insert a record. Fields left out take their defaults; generated identifiers are allocated
    /// here. Foreign keys are stored as given, without checking that their targets exist.
    #[instrument(name = "ModelOps::create", skip_all, fields(model = self.model_name))]
    pub async fn create(&self, data: Record) -> Result<Record, ExecutionError> {
        let model = self.model()?;
        let staged = stage_create(
            self.context.schema(),
            model,
            data,
            self.context.id_generator(),
        )?;

        let insert = AbstractInsert {
            collection: model.collection_name.clone(),
            documents: vec![staged.document],
        };
        self.execute(AbstractOperation::Insert(insert)).await?;

        Ok(staged.record)
    }

    /// Apply `patch` to the record with the given primary key and return its new state, or `None`
    /// if there is no such record. Only the touched fields are sent.
    #[instrument(name = "ModelOps::update", skip_all, fields(model = self.model_name))]
    pub async fn update(
        &self,
        id: impl Into<Val>,
        patch: RecordPatch,
    ) -> Result<Option<Record>, ExecutionError> {
        let model = self.model()?;
        let staged = stage_update(self.context.schema(), model, patch)?;
        let predicate = self.pk_predicate(model, id.into())?;

        let update = AbstractUpdate {
            collection: model.collection_name.clone(),
            predicate,
            set: staged.set,
            unset: staged.unset,
        };
        let response = self.execute(AbstractOperation::Update(update)).await?;

        response
            .documents
            .first()
            .map(|document| decode_document(self.context.schema(), model, document))
            .transpose()
    }

    /// Delete the record with the given primary key. Returns whether a record was deleted.
    #[instrument(name = "ModelOps::delete", skip_all, fields(model = self.model_name))]
    pub async fn delete(&self, id: impl Into<Val>) -> Result<bool, ExecutionError> {
        let model = self.model()?;
        let predicate = self.pk_predicate(model, id.into())?;

        let response = self.execute_delete(model, predicate, true).await?;
        Ok(response.affected > 0)
    }

    /// Delete every record matching `filter`. Returns the number deleted.
    #[instrument(name = "ModelOps::delete_many", skip_all, fields(model = self.model_name))]
    pub async fn delete_many(&self, filter: &Filter) -> Result<u64, ExecutionError> {
        let model = self.model()?;
        let predicate = to_predicate(self.context.schema(), model, filter)?;

        let response = self.execute_delete(model, predicate, false).await?;
        Ok(response.affected)
    }

    /// Follow the to-one relation `field` from the record with the given primary key
    pub async fn related_one(
        &self,
        id: impl Into<Val>,
        field: &str,
    ) -> Result<Option<Record>, ExecutionError> {
        self.expect_field_kind(field, false)?;
        let record = self
            .find_unique_with(id, &[Include::field(field)])
            .await?;

        Ok(match record.and_then(|mut record| record.shift_remove(field)) {
            Some(Val::Object(related)) => Some(related),
            _ => None,
        })
    }

    /// Follow the back-collection `field` from the record with the given primary key
    pub async fn related_many(
        &self,
        id: impl Into<Val>,
        field: &str,
    ) -> Result<Vec<Record>, ExecutionError> {
        self.expect_field_kind(field, true)?;
        let record = self
            .find_unique_with(id, &[Include::field(field)])
            .await?;

        Ok(match record.and_then(|mut record| record.shift_remove(field)) {
            Some(Val::List(members)) => members
                .into_iter()
                .filter_map(|member| match member {
                    Val::Object(member) => Some(member),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        })
    }

    fn expect_field_kind(&self, field: &str, collection: bool) -> Result<(), ExecutionError> {
        let model = self.model()?;
        match model.field(field).map(|f| &f.kind) {
            Some(FieldKind::Relation(_)) if !collection => Ok(()),
            Some(FieldKind::BackCollection(_)) if collection => Ok(()),
            _ => Err(ExecutionError::Validation(format!(
                "`{}.{field}` is not a {}",
                model.name,
                if collection {
                    "back-collection"
                } else {
                    "to-one relation"
                }
            ))),
        }
    }

    fn pk_predicate(&self, model: &Model, id: Val) -> Result<AbstractPredicate, ExecutionError> {
        to_predicate(
            self.context.schema(),
            model,
            &Filter::field(&model.pk_field, FieldOp::Equals(id)),
        )
    }

    async fn execute_delete(
        &self,
        model: &Model,
        predicate: AbstractPredicate,
        single: bool,
    ) -> Result<WireResponse, ExecutionError> {
        let pk_field = model.pk().map(|pk| pk.storage_name.clone()).ok_or_else(|| {
            ExecutionError::Validation(format!("Model `{}` has no primary key", model.name))
        })?;

        let delete = AbstractDelete {
            collection: model.collection_name.clone(),
            predicate,
            single,
            pk_field,
        };
        self.execute(AbstractOperation::Delete(delete)).await
    }

    async fn execute(&self, operation: AbstractOperation) -> Result<WireResponse, ExecutionError> {
        let response = self
            .context
            .executor()
            .execute(&operation, &self.cancellation)
            .await?;

        // The request went out; its effects stand, but the caller no longer wants the result
        if self.cancellation.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        Ok(response)
    }

    async fn select(
        &self,
        model: &Model,
        select: AbstractSelect,
    ) -> Result<Vec<Record>, ExecutionError> {
        let response = self.execute(AbstractOperation::Select(select)).await?;

        response
            .documents
            .iter()
            .map(|document| decode_document(self.context.schema(), model, document))
            .collect()
    }

    /// Fill in the included relations of `records`, one batched request per include
    #[async_recursion]
    async fn load_includes(
        &self,
        model: &Model,
        records: &mut [Record],
        includes: &[Include],
    ) -> Result<(), ExecutionError> {
        if records.is_empty() {
            return Ok(());
        }

        let schema = self.context.schema();

        for include in includes {
            let (field, related) = included_field(self.context, model, &include.field)?;
            let Some(relation_id) = field.relation_id() else {
                continue;
            };
            let relation = schema.relation(relation_id);

            // Included records are matched to their parents by (parent key, related key)
            let (parent_key, related_key) = match field.kind {
                FieldKind::Relation(_) => (&relation.fk_field, &relation.referenced_field),
                _ => (&relation.referenced_field, &relation.fk_field),
            };
            let related_key_storage = related
                .field(related_key)
                .map(|f| f.storage_name.clone())
                .unwrap_or_else(|| related_key.clone());

            let keys = distinct_keys(records.iter().filter_map(|record| record.get(parent_key)));
            let mut members = if keys.is_empty() {
                vec![]
            } else {
                let select = AbstractSelect::new(
                    &related.collection_name,
                    AbstractPredicate::in_list(related_key_storage, keys),
                );
                self.select(related, select).await?
            };
            self.load_includes(related, &mut members, &include.include)
                .await?;

            let mut groups: IndexMap<String, Vec<Record>> = IndexMap::new();
            for member in members {
                if let Some(key) = member.get(related_key) {
                    groups.entry(key.grouping_key()).or_default().push(member);
                }
            }

            for record in records.iter_mut() {
                let group = record
                    .get(parent_key)
                    .and_then(|key| groups.get(&key.grouping_key()));

                let value = match field.kind {
                    FieldKind::Relation(_) => group
                        .and_then(|members| members.first())
                        .map(|member| Val::Object(member.clone()))
                        .unwrap_or(Val::Null),
                    _ => Val::List(
                        group
                            .map(|members| members.iter().cloned().map(Val::Object).collect())
                            .unwrap_or_default(),
                    ),
                };
                record.insert(field.name.clone(), value);
            }
        }

        Ok(())
    }
}

/// Check that every include names a relation or back-collection, recursively
fn validate_includes(
    context: &ClientContext,
    model: &Model,
    includes: &[Include],
) -> Result<(), ExecutionError> {
    includes.iter().try_for_each(|include| {
        let (_, related) = included_field(context, model, &include.field)?;
        validate_includes(context, related, &include.include)
    })
}

fn included_field<'m>(
    context: &'m ClientContext,
    model: &'m Model,
    name: &str,
) -> Result<(&'m Field, &'m Model), ExecutionError> {
    let field = model.field(name).ok_or_else(|| {
        ExecutionError::Validation(format!("Model `{}` has no field `{name}`", model.name))
    })?;
    let related = context.schema().related_model(field).ok_or_else(|| {
        ExecutionError::Validation(format!(
            "`{}.{name}` is not a relation and cannot be included",
            model.name
        ))
    })?;

    Ok((field, related))
}

fn sort_key(model: &Model, order_by: &OrderBy) -> Result<(String, doc_query::Ordering), ExecutionError> {
    match model.field(&order_by.field) {
        Some(field) if field.is_persisted() && !field.list => {
            Ok((field.storage_name.clone(), order_by.ordering))
        }
        _ => Err(ExecutionError::UnsupportedPredicate(format!(
            "Cannot order `{}` by `{}`",
            model.name, order_by.field
        ))),
    }
}

/// Non-null keys, first occurrence first
fn distinct_keys<'v>(values: impl Iterator<Item = &'v Val>) -> Vec<Val> {
    let mut seen = HashSet::new();
    values
        .filter(|value| !value.is_null() && seen.insert(value.grouping_key()))
        .cloned()
        .collect()
}
