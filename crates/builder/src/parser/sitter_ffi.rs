// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tree_sitter_c2rust::Language;
use tree_sitter_language::LanguageFn;

unsafe extern "C" {
    // Compiled from grammar/src/grammar.json by build.rs
    fn tree_sitter_docmodel() -> *const ();
}

const LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_docmodel) };

pub fn language() -> Language {
    Language::new(LANGUAGE)
}
