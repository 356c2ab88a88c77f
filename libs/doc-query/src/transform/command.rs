// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::{Map, Value, json};

use crate::{
    AbstractDelete, AbstractInsert, AbstractOrderBy, AbstractSelect, AbstractUpdate, Ordering,
    database_error::DatabaseError,
    transport::{CommandKind, WireCommand},
};

use super::filter::to_filter;

/// A `find` when the predicate is local to the collection, otherwise an `aggregate` whose
/// pipeline joins the related collections, matches, and drops the join aliases.
pub(crate) fn select_command(select: &AbstractSelect) -> WireCommand {
    let filter = to_filter(&select.predicate);

    if filter.lookups.is_empty() {
        let mut document = Map::new();
        document.insert("find".into(), json!(select.collection));
        document.insert("filter".into(), filter.filter);
        if !select.order_by.is_empty() {
            document.insert("sort".into(), sort_document(&select.order_by));
        }
        if let Some(offset) = select.offset {
            document.insert("skip".into(), json!(offset));
        }
        if let Some(limit) = select.limit {
            document.insert("limit".into(), json!(limit));
        }

        return command(CommandKind::Find, &select.collection, document);
    }

    let mut pipeline = filter.lookups;
    pipeline.push(json!({ "$match": filter.filter }));
    let projection: Map<String, Value> = filter
        .aliases
        .into_iter()
        .map(|alias| (alias, json!(0)))
        .collect();
    pipeline.push(json!({ "$project": projection }));
    if !select.order_by.is_empty() {
        pipeline.push(json!({ "$sort": sort_document(&select.order_by) }));
    }
    if let Some(offset) = select.offset {
        pipeline.push(json!({ "$skip": offset }));
    }
    if let Some(limit) = select.limit {
        pipeline.push(json!({ "$limit": limit }));
    }

    let mut document = Map::new();
    document.insert("aggregate".into(), json!(select.collection));
    document.insert("pipeline".into(), Value::Array(pipeline));
    document.insert("cursor".into(), json!({}));

    command(CommandKind::Aggregate, &select.collection, document)
}

pub(crate) fn insert_command(insert: &AbstractInsert) -> WireCommand {
    let documents: Vec<Value> = insert
        .documents
        .iter()
        .map(|fields| {
            Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_wire()))
                    .collect(),
            )
        })
        .collect();

    let mut document = Map::new();
    document.insert("insert".into(), json!(insert.collection));
    document.insert("documents".into(), Value::Array(documents));

    command(CommandKind::Insert, &insert.collection, document)
}

/// A `findAndModify` returning the new document. An update that touches nothing becomes a
/// single-document `find`.
pub(crate) fn update_command(update: &AbstractUpdate) -> Result<WireCommand, DatabaseError> {
    if update.predicate.needs_join() {
        return Err(DatabaseError::Validation(format!(
            "Updates on `{}` cannot filter through relations",
            update.collection
        )));
    }

    if update.is_empty() {
        let mut select = AbstractSelect::new(&update.collection, update.predicate.clone());
        select.limit = Some(1);
        return Ok(select_command(&select));
    }

    let mut modifications = Map::new();
    if !update.set.is_empty() {
        let set: Map<String, Value> = update
            .set
            .iter()
            .map(|(key, value)| (key.clone(), value.to_wire()))
            .collect();
        modifications.insert("$set".into(), Value::Object(set));
    }
    if !update.unset.is_empty() {
        let unset: Map<String, Value> = update
            .unset
            .iter()
            .map(|key| (key.clone(), json!("")))
            .collect();
        modifications.insert("$unset".into(), Value::Object(unset));
    }

    let mut document = Map::new();
    document.insert("findAndModify".into(), json!(update.collection));
    document.insert("query".into(), to_filter(&update.predicate).filter);
    document.insert("update".into(), Value::Object(modifications));
    document.insert("new".into(), json!(true));

    Ok(command(
        CommandKind::FindAndModify,
        &update.collection,
        document,
    ))
}

/// A `delete` for a predicate local to the collection. Predicates that need a join must first be
/// resolved to primary keys (see [delete_by_keys_command]).
pub(crate) fn delete_command(delete: &AbstractDelete) -> Result<WireCommand, DatabaseError> {
    if delete.predicate.needs_join() {
        return Err(DatabaseError::Validation(format!(
            "Deletes on `{}` must be resolved to keys before filtering through relations",
            delete.collection
        )));
    }

    Ok(delete_with_filter(
        &delete.collection,
        to_filter(&delete.predicate).filter,
        delete.single,
    ))
}

/// Delete the documents whose primary key is one of `keys` (in wire form)
pub(crate) fn delete_by_keys_command(delete: &AbstractDelete, keys: Vec<Value>) -> WireCommand {
    let mut filter = Map::new();
    filter.insert(delete.pk_field.clone(), json!({ "$in": keys }));

    delete_with_filter(&delete.collection, Value::Object(filter), delete.single)
}

fn delete_with_filter(collection: &str, filter: Value, single: bool) -> WireCommand {
    let mut document = Map::new();
    document.insert("delete".into(), json!(collection));
    document.insert(
        "deletes".into(),
        json!([{ "q": filter, "limit": if single { 1 } else { 0 } }]),
    );

    command(CommandKind::Delete, collection, document)
}

fn sort_document(order_by: &AbstractOrderBy) -> Value {
    Value::Object(
        order_by
            .0
            .iter()
            .map(|(field, ordering)| {
                let direction = match ordering {
                    Ordering::Asc => 1,
                    Ordering::Desc => -1,
                };
                (field.clone(), json!(direction))
            })
            .collect(),
    )
}

fn command(kind: CommandKind, collection: &str, document: Map<String, Value>) -> WireCommand {
    WireCommand {
        kind,
        collection: collection.to_string(),
        document: Value::Object(document),
    }
}
