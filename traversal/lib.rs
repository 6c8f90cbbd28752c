/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use error::hypergraph_error;
use ir::pattern::{conjunction::Conjunction, Identifier, VertexKind};
use options::TraversalOptions;
use schema::{SchemaGraph, SchemaReadGuard};
use solver::SolveStatus;

use crate::planner::{plan::Plan, GraphPlanner};

pub mod planner;

hypergraph_error!(pub PlannerError(component = "Traversal planner", prefix = "TPL") {
    InconsistentVertexKind(
        1,
        "Pattern vertex '{identifier}' was added as a '{existing}' vertex and cannot be re-added as '{requested}'.",
        identifier: Identifier,
        existing: VertexKind,
        requested: VertexKind,
    ),
    PropertiesAlreadySet(
        2,
        "Properties of planner vertex '{identifier}' have already been set.",
        identifier: Identifier,
    ),
    ConstraintInitBeforeVariableInit(
        3,
        "Planner constraints were initialised before all decision variables. This is a bug.",
    ),
    PlanInfeasible(
        4,
        "The pattern admits no valid traversal plan: a connected sub-pattern has no indexable starting point.",
    ),
    SolverFailure(
        5,
        "The MILP backend failed to produce a traversal plan (status: '{status}').",
        status: SolveStatus,
    ),
    IllegalCast(
        6,
        "Illegal cast of a '{actual}' planner vertex to '{expected}'.",
        expected: VertexKind,
        actual: VertexKind,
    ),
});

/// Plans a normalized conjunction against the schema statistics the caller
/// holds a read guard over. One-shot counterpart of building a
/// [`GraphPlanner`] and re-planning it as the schema evolves.
pub fn plan<S: SchemaGraph>(
    conjunction: &Conjunction,
    schema: &SchemaReadGuard<'_, S>,
    options: &TraversalOptions,
) -> Result<Plan, PlannerError> {
    let mut planner = GraphPlanner::build(conjunction)?;
    planner.plan(schema, options)
}
