// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::io::Write;
use std::path::PathBuf;

// Generates the schema parser from grammar/src/grammar.json (the JSON form of grammar/grammar.js,
// so that building does not need a JavaScript runtime) and compiles it.
fn main() {
    let grammar_path = PathBuf::from("./grammar/src/grammar.json");
    println!("cargo:rerun-if-changed={}", grammar_path.display());

    let dir = tempfile::Builder::new()
        .prefix("grammar")
        .tempdir()
        .unwrap();
    let grammar_file = dir.path().join("parser.c");
    let mut f = std::fs::File::create(grammar_file).unwrap();

    let grammar_json = std::fs::read_to_string(&grammar_path).unwrap();
    // ABI 15 requires a semantic version in the generated parser's metadata.
    let version = |key: &str| std::env::var(key).unwrap().parse::<u8>().unwrap();
    let semantic_version = (
        version("CARGO_PKG_VERSION_MAJOR"),
        version("CARGO_PKG_VERSION_MINOR"),
        version("CARGO_PKG_VERSION_PATCH"),
    );
    let (grammar_name, grammar_c) =
        tree_sitter_generate::generate_parser_for_grammar(&grammar_json, Some(semantic_version))
            .unwrap();
    f.write_all(grammar_c.as_bytes()).unwrap();
    drop(f);

    let header_dir = dir.path().join("tree_sitter");
    std::fs::create_dir(&header_dir).unwrap();
    let mut parser_file = std::fs::File::create(header_dir.join("parser.h")).unwrap();
    parser_file
        .write_all(tree_sitter::PARSER_HEADER.as_bytes())
        .unwrap();
    drop(parser_file);

    cc::Build::new()
        .include(&dir)
        .file(dir.path().join("parser.c"))
        .warnings(false)
        .compile(&grammar_name);
}
