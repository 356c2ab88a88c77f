// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    DateTime,
    Json,
}

impl ScalarType {
    pub const ALL: [ScalarType; 7] = [
        ScalarType::String,
        ScalarType::Int,
        ScalarType::BigInt,
        ScalarType::Float,
        ScalarType::Boolean,
        ScalarType::DateTime,
        ScalarType::Json,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::BigInt => "BigInt",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::DateTime => "DateTime",
            ScalarType::Json => "Json",
        }
    }

    pub fn from_name(name: &str) -> Option<ScalarType> {
        Self::ALL.into_iter().find(|typ| typ.name() == name)
    }

    /// Can values of this type be compared with `<`, `>` etc.?
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ScalarType::String
                | ScalarType::Int
                | ScalarType::BigInt
                | ScalarType::Float
                | ScalarType::DateTime
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::BigInt | ScalarType::Float)
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn names_round_trip() {
        for typ in ScalarType::ALL {
            assert_eq!(ScalarType::from_name(typ.name()), Some(typ));
        }
        assert_eq!(ScalarType::from_name("Concert"), None);
    }
}
