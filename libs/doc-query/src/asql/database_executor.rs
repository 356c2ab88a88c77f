// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    database_error::DatabaseError,
    transform::command::{
        delete_by_keys_command, delete_command, insert_command, select_command, update_command,
    },
    transport::{Transport, WireCommand, WireResponse},
};

use super::{
    abstract_operation::AbstractOperation, delete::AbstractDelete, predicate::AbstractPredicate,
    select::AbstractSelect,
};

pub struct DatabaseExecutor {
    pub transport: Arc<dyn Transport>,
}

impl DatabaseExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute an operation through the transport.
    ///
    /// The cancellation token is checked before every command is sent. A command already handed
    /// to the transport is never retracted.
    #[instrument(name = "DatabaseExecutor::execute", skip_all)]
    pub async fn execute(
        &self,
        operation: &AbstractOperation,
        cancellation: &CancellationToken,
    ) -> Result<WireResponse, DatabaseError> {
        match operation {
            AbstractOperation::Select(select) => {
                // A predicate reduced to false matches nothing, so there is nothing to ask
                if select.predicate == AbstractPredicate::False {
                    return Ok(WireResponse::default());
                }
                self.send(select_command(select), cancellation).await
            }
            AbstractOperation::Insert(insert) => {
                if insert.documents.is_empty() {
                    return Ok(WireResponse::default());
                }
                self.send(insert_command(insert), cancellation).await
            }
            AbstractOperation::Update(update) => {
                if update.predicate == AbstractPredicate::False {
                    return Ok(WireResponse::default());
                }
                self.send(update_command(update)?, cancellation).await
            }
            AbstractOperation::Delete(delete) => self.delete(delete, cancellation).await,
        }
    }

    async fn delete(
        &self,
        delete: &AbstractDelete,
        cancellation: &CancellationToken,
    ) -> Result<WireResponse, DatabaseError> {
        if delete.predicate == AbstractPredicate::False {
            return Ok(WireResponse::default());
        }

        if !delete.predicate.needs_join() {
            return self.send(delete_command(delete)?, cancellation).await;
        }

        // Delete commands cannot join, so find the matching keys first
        let mut select = AbstractSelect::new(&delete.collection, delete.predicate.clone());
        if delete.single {
            select.limit = Some(1);
        }
        let matched = self.send(select_command(&select), cancellation).await?;

        let keys = matched
            .documents
            .into_iter()
            .map(|mut document| {
                document
                    .get_mut(&delete.pk_field)
                    .map(|key| key.take())
                    .ok_or_else(|| {
                        DatabaseError::Validation(format!(
                            "Matched document in `{}` has no `{}` field",
                            delete.collection, delete.pk_field
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if keys.is_empty() {
            return Ok(WireResponse::default());
        }

        self.send(delete_by_keys_command(delete, keys), cancellation)
            .await
    }

    async fn send(
        &self,
        command: WireCommand,
        cancellation: &CancellationToken,
    ) -> Result<WireResponse, DatabaseError> {
        if cancellation.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }

        debug!(command = %command, "Sending {}", command.kind.name());
        let response = self.transport.execute(command).await?;
        debug!(
            documents = response.documents.len(),
            affected = response.affected,
            "Received response"
        );

        Ok(response)
    }
}
