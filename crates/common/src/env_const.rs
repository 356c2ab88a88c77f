// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub const DOCMODEL_LOG: &str = "DOCMODEL_LOG";

/// Overrides `[schema] path` of `docmodel.toml`
pub const DOCMODEL_SCHEMA: &str = "DOCMODEL_SCHEMA";

/// Disables colored output when enabled
pub const DOCMODEL_NO_COLOR: &str = "DOCMODEL_NO_COLOR";
