// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::error::ParserError;

use super::{ModelDraft, RelationDraft, Resolver};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl Resolver<'_> {
    /// Pass 5: records connected by required relations must be creatable in some order, so the
    /// required relations may not form a cycle. Optional relations are not considered.
    pub(super) fn check_required_cycles(
        &self,
        models: &[ModelDraft],
        relations: &[RelationDraft],
    ) -> Result<(), ParserError> {
        let mut marks = vec![Mark::Unvisited; models.len()];
        let mut stack = vec![];

        for start in 0..models.len() {
            if marks[start] == Mark::Unvisited
                && let Some((cycle, closing_relation)) =
                    find_cycle(start, relations, &mut marks, &mut stack)
            {
                return Err(ParserError::CyclicRelation {
                    models: cycle
                        .into_iter()
                        .map(|index| models[index].name().to_string())
                        .collect(),
                    location: self.location(relations[closing_relation].span),
                });
            }
        }

        Ok(())
    }
}

/// Depth-first search from `node` over required relations. Returns the models on the first cycle
/// found (with the first model repeated at the end) and the relation that closes it.
fn find_cycle(
    node: usize,
    relations: &[RelationDraft],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<(Vec<usize>, usize)> {
    marks[node] = Mark::OnStack;
    stack.push(node);

    for (relation_index, relation) in relations.iter().enumerate() {
        if !relation.required || relation.owner != node {
            continue;
        }

        match marks[relation.target] {
            Mark::OnStack => {
                let position = stack.iter().position(|n| *n == relation.target)?;
                let mut cycle = stack[position..].to_vec();
                cycle.push(relation.target);
                return Some((cycle, relation_index));
            }
            Mark::Unvisited => {
                if let Some(found) = find_cycle(relation.target, relations, marks, stack) {
                    return Some(found);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
    None
}
