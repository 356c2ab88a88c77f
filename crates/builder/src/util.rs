// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Join strings together with commas and an optional separator before the last word.
///
/// e.g. `join_strings(&["a", "b", "c"], Some("or")) == "a, b, or c"`
pub fn join_strings(strs: &[impl AsRef<str>], last_sep: Option<&'static str>) -> String {
    let strs: Vec<&str> = strs.iter().map(|s| s.as_ref()).collect();

    match (strs.as_slice(), last_sep) {
        ([], _) => String::new(),
        ([single], _) => single.to_string(),
        ([first, second], Some(last_sep)) => format!("{first} {last_sep} {second}"),
        ([init @ .., last], Some(last_sep)) => {
            format!("{}, {last_sep} {last}", init.join(", "))
        }
        (all, None) => all.join(", "),
    }
}

/// Lay out rows of cells so that each column starts at the same offset. Trailing whitespace is
/// trimmed from every row.
pub fn align_columns(rows: &[Vec<String>]) -> Vec<String> {
    let column_count = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let widths: Vec<usize> = (0..column_count)
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (column, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if column + 1 < row.len() {
                    let padding = widths[column] - cell.chars().count() + 1;
                    line.extend(std::iter::repeat_n(' ', padding));
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}
