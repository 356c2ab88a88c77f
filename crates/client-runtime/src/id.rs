// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

/// Allocates values for generated defaults (`auto()` and `uuid()`) at create time.
pub trait IdGenerator: Send + Sync {
    /// A store-native identifier token: 24 lowercase hex digits
    fn object_id(&self) -> String;

    /// A hyphenated UUID
    fn uuid(&self) -> String;
}

/// Identifiers laid out as the store lays out its own: a 4-byte timestamp in seconds, 5 random
/// bytes fixed per generator, and a 3-byte counter.
pub struct ObjectIdGenerator {
    process_bytes: [u8; 5],
    counter: AtomicU32,
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        let random = Uuid::new_v4();
        let bytes = random.as_bytes();

        Self {
            process_bytes: [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]],
            counter: AtomicU32::new(u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]])),
        }
    }
}

impl IdGenerator for ObjectIdGenerator {
    fn object_id(&self) -> String {
        self.object_id_at(Utc::now().timestamp() as u32)
    }

    fn uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl ObjectIdGenerator {
    fn object_id_at(&self, seconds: u32) -> String {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_bytes);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);

        hex::encode(bytes)
    }
}

/// Predictable identifiers (`000000000000000000000001`, ...) for tests and fixtures.
#[derive(Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn object_id(&self) -> String {
        format!("{:024x}", self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn uuid(&self) -> String {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed) + 1)).to_string()
    }
}
