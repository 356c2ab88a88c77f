// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// The database command kinds issued by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Find,
    Aggregate,
    Insert,
    FindAndModify,
    Delete,
}

impl CommandKind {
    /// The command's name, which is also the key of the command document's first entry
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Find => "find",
            CommandKind::Aggregate => "aggregate",
            CommandKind::Insert => "insert",
            CommandKind::FindAndModify => "findAndModify",
            CommandKind::Delete => "delete",
        }
    }
}

/// A database command document, ready to be sent as is.
#[derive(Debug, Clone, PartialEq)]
pub struct WireCommand {
    pub kind: CommandKind,
    pub collection: String,
    pub document: Value,
}

impl Display for WireCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.document)
    }
}

/// What the store returned for a command.
///
/// For reads, `documents` holds the matched documents (all batches). For `findAndModify`, it holds
/// the new document, if any. For writes, `affected` holds the number of documents written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireResponse {
    pub documents: Vec<Value>,
    pub affected: u64,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Command failed{}: {message}", code.map(|code| format!(" ({code})")).unwrap_or_default())]
    Command { code: Option<i32>, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    BoxedError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The collaborator that ships commands to the store.
///
/// Implementations own connection handling, pooling, retries of reads and the decoding of cursor
/// batches into [WireResponse]s. Writes handed to a transport are never retried by this crate.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, command: WireCommand) -> Result<WireResponse, TransportError>;
}
