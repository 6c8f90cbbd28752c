/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use ir::pattern::{edge::EdgeLabel, Identifier};
use schema::SchemaGraph;
use solver::{MilpSolver, VariableId};

use crate::planner::{vertex::PlannerVertex, VertexId};

const TARGET_SCAN_RELATIVE_COST: f64 = 1.0;
const SOURCE_LOOKUP_RELATIVE_COST: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Canonical,
    Reverse,
}

/// One orientation of a reified pattern edge. The opposite orientation sits
/// in the adjacent edge-table slot; selecting an orientation is how the plan
/// fixes the direction a pattern edge is traversed in.
#[derive(Debug)]
pub struct PlannerEdge {
    from: VertexId,
    to: VertexId,
    label: EdgeLabel,
    direction: Direction,
    var_prefix: String,
    con_prefix: String,
    var_is_selected: Option<VariableId>,
    value_is_selected: bool,
    is_initialised_variables: bool,
}

impl PlannerEdge {
    pub(crate) fn new(
        from: VertexId,
        to: VertexId,
        label: EdgeLabel,
        direction: Direction,
        from_identifier: &Identifier,
        to_identifier: &Identifier,
    ) -> Self {
        Self {
            from,
            to,
            label,
            direction,
            var_prefix: format!("edge::var::{from_identifier}::{label}::{to_identifier}::"),
            con_prefix: format!("edge::con::{from_identifier}::{label}::{to_identifier}::"),
            var_is_selected: None,
            value_is_selected: false,
            is_initialised_variables: false,
        }
    }

    pub fn from(&self) -> VertexId {
        self.from
    }

    pub fn to(&self) -> VertexId {
        self.to
    }

    pub fn label(&self) -> EdgeLabel {
        self.label
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_selected(&self) -> bool {
        self.value_is_selected
    }

    pub fn is_initialised_variables(&self) -> bool {
        self.is_initialised_variables
    }

    pub(crate) fn selection_variable(&self) -> Option<VariableId> {
        self.var_is_selected
    }

    pub(crate) fn constraint_prefix(&self) -> &str {
        &self.con_prefix
    }

    pub(crate) fn initialise_variables<B: MilpSolver>(&mut self, solver: &mut B) {
        self.var_is_selected = Some(solver.make_int_var(0, 1, &format!("{}is_selected", self.var_prefix)));
        self.is_initialised_variables = true;
    }

    /// The cost of traversing this orientation: dominated by materialising
    /// the target frontier, plus a damped term for the lookups issued from
    /// the already-bound source frontier. The opposite orientation prices
    /// itself independently, so the optimiser walks out of the cheap end.
    pub(crate) fn update_objective<B: MilpSolver, S: SchemaGraph>(
        &self,
        solver: &mut B,
        source: &PlannerVertex,
        target: &PlannerVertex,
        schema: &S,
    ) {
        let cost = TARGET_SCAN_RELATIVE_COST * target.scan_size(schema)
            + SOURCE_LOOKUP_RELATIVE_COST * source.scan_size(schema);
        solver.set_objective_coefficient(self.selection_variable().unwrap(), cost);
    }

    pub(crate) fn record_values<B: MilpSolver>(&mut self, solver: &B) {
        self.value_is_selected = solver.solution_value(self.var_is_selected.unwrap()).round() as i64 == 1;
    }
}

impl fmt::Display for PlannerEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) --{}--> ({})", self.from.0, self.label, self.to.0)
    }
}
