/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::HashMap, time::Duration};

use ir::pattern::{
    conjunction::{Conjunction, VertexDeclaration},
    edge::EdgeLabel,
    vertex::{ThingProperties, TypeProperties},
    Identifier, VertexKind,
};
use options::TraversalOptions;
use schema::{SchemaGraph, SchemaReadGuard};
use solver::{BranchAndBound, MilpSolver, SolveStatus};
use tracing::{debug, trace};

use crate::{
    planner::{
        edge::{Direction, PlannerEdge},
        plan::Plan,
        vertex::{PlannerVertex, ThingVertex, TypeVertex},
    },
    PlannerError,
};

pub mod edge;
pub mod plan;
pub mod vertex;

/// Index of a planner vertex in the planner's vertex table.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VertexId(pub(crate) usize);

/// Index of a directional edge in the planner's edge table. The two
/// orientations of one pattern edge occupy adjacent slots, so the opposite
/// orientation is always index-pair-recoverable.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    pub(crate) fn opposite(&self) -> EdgeId {
        EdgeId(self.0 ^ 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Building,
    VariablesInitialised,
    ConstraintsInitialised,
    Solved,
    Decoded,
}

/// Orders a pattern as a rooted, directed spanning structure by encoding
/// plan validity as a mixed-integer linear program: binary decision
/// variables select traversal roots and edge orientations, linear
/// constraints enforce that every vertex is entered exactly once, and the
/// objective ranks candidate plans by schema-statistics scan estimates.
pub struct GraphPlanner<B: MilpSolver = BranchAndBound> {
    solver: B,
    vertices: Vec<PlannerVertex>,
    vertex_index: HashMap<Identifier, VertexId>,
    edges: Vec<PlannerEdge>,
    phase: Phase,
}

impl GraphPlanner<BranchAndBound> {
    pub fn build(conjunction: &Conjunction) -> Result<Self, PlannerError> {
        Self::build_with_solver(conjunction, BranchAndBound::new())
    }
}

impl<B: MilpSolver> GraphPlanner<B> {
    pub fn build_with_solver(conjunction: &Conjunction, solver: B) -> Result<Self, PlannerError> {
        let mut planner =
            Self { solver, vertices: Vec::new(), vertex_index: HashMap::new(), edges: Vec::new(), phase: Phase::Building };
        for declaration in conjunction.vertices() {
            let vertex = planner.add_vertex(declaration.identifier().clone(), declaration.kind())?;
            match declaration {
                VertexDeclaration::Thing { properties: Some(properties), .. } => {
                    planner.set_thing_properties(vertex, properties.clone())?
                }
                VertexDeclaration::Type { properties: Some(properties), .. } => {
                    planner.set_type_properties(vertex, properties.clone())?
                }
                VertexDeclaration::Thing { properties: None, .. } | VertexDeclaration::Type { properties: None, .. } => (),
            }
        }
        for edge in conjunction.edges() {
            let from = planner.vertex_index[edge.from()];
            let to = planner.vertex_index[edge.to()];
            planner.add_edge(from, to, edge.label());
        }
        Ok(planner)
    }

    /// Adds a vertex of the given kind, or returns the existing one when the
    /// identifier is already present with a matching kind.
    pub fn add_vertex(&mut self, identifier: Identifier, kind: VertexKind) -> Result<VertexId, PlannerError> {
        debug_assert_eq!(self.phase, Phase::Building);
        if let Some(&existing) = self.vertex_index.get(&identifier) {
            let existing_kind = self.vertices[existing.0].kind();
            if existing_kind == kind {
                Ok(existing)
            } else {
                Err(PlannerError::InconsistentVertexKind { identifier, existing: existing_kind, requested: kind })
            }
        } else {
            let vertex = VertexId(self.vertices.len());
            self.vertex_index.insert(identifier.clone(), vertex);
            self.vertices.push(match kind {
                VertexKind::Thing => PlannerVertex::Thing(ThingVertex::new(identifier)),
                VertexKind::Type => PlannerVertex::Type(TypeVertex::new(identifier)),
            });
            Ok(vertex)
        }
    }

    /// Reifies one undirected pattern edge as a forward/backward pair of
    /// directional edges, registering each as outgoing on its source and
    /// incoming on its target.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, label: EdgeLabel) {
        debug_assert_eq!(self.phase, Phase::Building);
        let from_identifier = self.vertices[from.0].identifier().clone();
        let to_identifier = self.vertices[to.0].identifier().clone();

        let forward = EdgeId(self.edges.len());
        let backward = forward.opposite();
        self.edges.push(PlannerEdge::new(from, to, label, Direction::Canonical, &from_identifier, &to_identifier));
        self.edges.push(PlannerEdge::new(to, from, label, Direction::Reverse, &to_identifier, &from_identifier));

        self.vertices[from.0].base_mut().register_out(forward);
        self.vertices[to.0].base_mut().register_in(forward);
        self.vertices[to.0].base_mut().register_out(backward);
        self.vertices[from.0].base_mut().register_in(backward);
    }

    pub fn set_thing_properties(&mut self, vertex: VertexId, properties: ThingProperties) -> Result<(), PlannerError> {
        debug_assert_eq!(self.phase, Phase::Building);
        self.vertices[vertex.0].expect_thing_mut()?.set_properties(properties)
    }

    pub fn set_type_properties(&mut self, vertex: VertexId, properties: TypeProperties) -> Result<(), PlannerError> {
        debug_assert_eq!(self.phase, Phase::Building);
        self.vertices[vertex.0].expect_type_mut()?.set_properties(properties)
    }

    pub fn vertex(&self, identifier: &Identifier) -> Option<&PlannerVertex> {
        self.vertex_index.get(identifier).map(|&vertex| &self.vertices[vertex.0])
    }

    pub fn vertices(&self) -> impl Iterator<Item = &PlannerVertex> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &PlannerEdge> {
        self.edges.iter()
    }

    /// Runs the remaining lifecycle against the schema snapshot the caller
    /// guards: variable and constraint initialisation (first call only),
    /// objective population, solving, and decoding. May be called again
    /// after a schema change; only the objective is re-populated.
    pub fn plan<S: SchemaGraph>(
        &mut self,
        schema: &SchemaReadGuard<'_, S>,
        options: &TraversalOptions,
    ) -> Result<Plan, PlannerError> {
        if self.phase == Phase::Building {
            self.initialise_variables();
            self.initialise_constraints()?;
        }
        self.update_objective(&**schema);
        self.solve(options.solver_time_budget())?;
        Ok(self.decode())
    }

    fn initialise_variables(&mut self) {
        debug_assert_eq!(self.phase, Phase::Building);
        for vertex in &mut self.vertices {
            vertex.base_mut().initialise_variables(&mut self.solver);
        }
        for edge in &mut self.edges {
            edge.initialise_variables(&mut self.solver);
        }
        self.phase = Phase::VariablesInitialised;
        trace!(vertices = self.vertices.len(), edges = self.edges.len(), "initialised decision variables");
    }

    fn initialise_constraints(&mut self) -> Result<(), PlannerError> {
        if self.phase < Phase::VariablesInitialised {
            return Err(PlannerError::ConstraintInitBeforeVariableInit {});
        }
        let vertex_count = self.vertices.len();
        let Self { solver, vertices, edges, .. } = self;
        for vertex in vertices.iter_mut() {
            vertex.base_mut().initialise_constraints(solver, edges, vertex_count)?;
        }
        Self::initialise_edge_constraints(solver, vertices, edges, vertex_count);
        self.phase = Phase::ConstraintsInitialised;
        Ok(())
    }

    /// Constraints owned by the edge table: every pattern edge is traversed
    /// in exactly one of its two directions, and a selected directional edge
    /// forces strictly increasing order numbers so that the selection is
    /// acyclic and rooted at the starting vertices.
    fn initialise_edge_constraints(
        solver: &mut B,
        vertices: &[PlannerVertex],
        edges: &[PlannerEdge],
        vertex_count: usize,
    ) {
        for index in (0..edges.len()).step_by(2) {
            let forward = &edges[index];
            let backward = &edges[index + 1];
            let constraint =
                solver.make_constraint(1.0, 1.0, &format!("{}one_direction", forward.constraint_prefix()));
            solver.set_constraint_coefficient(constraint, forward.selection_variable().unwrap(), 1.0);
            solver.set_constraint_coefficient(constraint, backward.selection_variable().unwrap(), 1.0);
        }

        let big_m = vertex_count as f64;
        for edge in edges {
            let from_order = vertices[edge.from().0].base().order_number_variable().unwrap();
            let to_order = vertices[edge.to().0].base().order_number_variable().unwrap();
            let constraint = solver.make_constraint(
                1.0 - big_m,
                f64::INFINITY,
                &format!("{}increasing_order", edge.constraint_prefix()),
            );
            solver.set_constraint_coefficient(constraint, to_order, 1.0);
            solver.set_constraint_coefficient(constraint, from_order, -1.0);
            solver.set_constraint_coefficient(constraint, edge.selection_variable().unwrap(), -big_m);
        }
    }

    /// Populates objective coefficients from the schema statistics. Safe to
    /// re-run whenever the schema graph changes; coefficients overwrite.
    fn update_objective<S: SchemaGraph>(&mut self, schema: &S) {
        debug_assert!(self.phase >= Phase::ConstraintsInitialised);
        let Self { solver, vertices, edges, .. } = self;
        for vertex in vertices.iter() {
            vertex.update_objective(solver, schema);
        }
        for edge in edges.iter() {
            let source = &vertices[edge.from().0];
            let target = &vertices[edge.to().0];
            edge.update_objective(solver, source, target, schema);
        }
    }

    fn solve(&mut self, time_budget: Duration) -> Result<(), PlannerError> {
        debug_assert!(self.phase >= Phase::ConstraintsInitialised);
        let status = self.solver.solve(time_budget);
        match status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                debug!(%status, objective = self.solver.objective_value(), "solved traversal plan");
                self.phase = Phase::Solved;
                Ok(())
            }
            SolveStatus::Infeasible => Err(PlannerError::PlanInfeasible {}),
            SolveStatus::Unbounded | SolveStatus::NotSolved => Err(PlannerError::SolverFailure { status }),
        }
    }

    fn decode(&mut self) -> Plan {
        debug_assert_eq!(self.phase, Phase::Solved);
        let Self { solver, vertices, edges, .. } = self;
        for vertex in vertices.iter_mut() {
            vertex.base_mut().record_values(solver);
        }
        for edge in edges.iter_mut() {
            edge.record_values(solver);
        }
        self.phase = Phase::Decoded;
        Plan::from_decoded(&self.vertices, &self.edges)
    }
}
