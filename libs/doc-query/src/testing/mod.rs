// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use crate::transport::{Transport, TransportError, WireCommand, WireResponse};

/// A transport that records every command and replies with queued responses (an empty response
/// once the queue runs out).
#[derive(Default)]
pub struct RecordingTransport {
    commands: Mutex<Vec<WireCommand>>,
    responses: Mutex<VecDeque<Result<WireResponse, TransportError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: WireResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(response));
    }

    pub fn push_error(&self, error: TransportError) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> Vec<WireCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, command: WireCommand) -> Result<WireResponse, TransportError> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(WireResponse::default()))
    }
}
