/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::VecDeque, fmt};

use ir::pattern::Identifier;
use itertools::Itertools;

use crate::planner::{edge::PlannerEdge, vertex::PlannerVertex};

/// The decoded plan artifact: the traversal roots, a breadth-first
/// visitation order from those roots, the spanning-forest edges the
/// traversal walks, and the remaining selected edges that close pattern
/// cycles. The first selected edge to reach a vertex is a forest edge;
/// every later selected edge into it is emitted under `checks`, for the
/// execution engine to verify against already-bound vertices. This is all
/// the execution engine consumes; the MILP model behind it can be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    roots: Vec<Identifier>,
    order: Vec<Identifier>,
    edges_selected: Vec<(Identifier, Identifier)>,
    checks: Vec<(Identifier, Identifier)>,
}

impl Plan {
    pub(crate) fn from_decoded(vertices: &[PlannerVertex], edges: &[PlannerEdge]) -> Self {
        let roots = vertices
            .iter()
            .filter(|vertex| vertex.base().is_starting_vertex())
            .map(|vertex| vertex.identifier().clone())
            .collect_vec();

        let mut order = Vec::with_capacity(vertices.len());
        let mut edges_selected = Vec::new();
        let mut checks = Vec::new();
        let mut visited = vec![false; vertices.len()];
        let mut queue = VecDeque::new();
        for (index, vertex) in vertices.iter().enumerate() {
            if vertex.base().is_starting_vertex() {
                visited[index] = true;
                queue.push_back(index);
            }
        }
        while let Some(index) = queue.pop_front() {
            order.push(vertices[index].identifier().clone());
            for &edge_id in vertices[index].base().outs() {
                let edge = &edges[edge_id.0];
                if !edge.is_selected() {
                    continue;
                }
                let endpoints =
                    (vertices[edge.from().0].identifier().clone(), vertices[edge.to().0].identifier().clone());
                if !visited[edge.to().0] {
                    visited[edge.to().0] = true;
                    queue.push_back(edge.to().0);
                    edges_selected.push(endpoints);
                } else {
                    checks.push(endpoints);
                }
            }
        }
        debug_assert_eq!(order.len(), vertices.len(), "decoded plan does not visit every vertex");

        Self { roots, order, edges_selected, checks }
    }

    pub fn roots(&self) -> &[Identifier] {
        &self.roots
    }

    pub fn order(&self) -> &[Identifier] {
        &self.order
    }

    /// The spanning forest: each non-root vertex appears exactly once as a
    /// target, and the forest's roots are exactly [`Self::roots`].
    pub fn edges_selected(&self) -> &[(Identifier, Identifier)] {
        &self.edges_selected
    }

    /// Selected edges that close a cycle in the pattern: their direction is
    /// fixed like any other, but both endpoints are already reached through
    /// the forest when they are evaluated.
    pub fn checks(&self) -> &[(Identifier, Identifier)] {
        &self.checks
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan")?;
        writeln!(f, "  roots: {}", self.roots.iter().join(", "))?;
        writeln!(f, "  order: {}", self.order.iter().join(", "))?;
        for (from, to) in &self.edges_selected {
            writeln!(f, "  {from} --> {to}")?;
        }
        for (from, to) in &self.checks {
            writeln!(f, "  check: {from} --> {to}")?;
        }
        Ok(())
    }
}
