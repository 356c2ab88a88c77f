// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use doc_query::{TransportError, database_error::DatabaseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The filter cannot be expressed for the field it targets. Raised while building the
    /// request, so nothing has been sent.
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Failed to decode `{model}`: {message}")]
    Decode { model: String, message: String },

    #[error(transparent)]
    Transport(TransportError),

    #[error("Expected at most one `{model}` record, found {count}")]
    NonUniqueResult { model: String, count: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown model `{0}`")]
    UnknownModel(String),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<ExecutionError>),
}

impl ExecutionError {
    pub fn with_context(self, context: String) -> ExecutionError {
        ExecutionError::WithContext(context, Box::new(self))
    }

    /// The error with all context layers removed
    pub fn root(&self) -> &ExecutionError {
        match self {
            ExecutionError::WithContext(_, inner) => inner.root(),
            err => err,
        }
    }
}

impl From<DatabaseError> for ExecutionError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Transport(error) => ExecutionError::Transport(error),
            DatabaseError::Cancelled => ExecutionError::Cancelled,
            DatabaseError::Validation(message) => ExecutionError::Validation(message),
            DatabaseError::WithContext(context, inner) => {
                ExecutionError::from(*inner).with_context(context)
            }
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, ExecutionError> {
    fn with_context(self, context: String) -> Result<T, ExecutionError> {
        self.map_err(|e| e.with_context(context))
    }
}
