/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use ir::pattern::{
    vertex::{ThingProperties, TypeProperties},
    Identifier, VertexKind,
};
use schema::SchemaGraph;
use solver::{MilpSolver, VariableId};

use crate::{
    planner::{edge::PlannerEdge, EdgeId},
    PlannerError,
};

#[derive(Debug)]
pub enum PlannerVertex {
    Thing(ThingVertex),
    Type(TypeVertex),
}

impl PlannerVertex {
    pub fn base(&self) -> &VertexBase {
        match self {
            Self::Thing(inner) => &inner.base,
            Self::Type(inner) => &inner.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut VertexBase {
        match self {
            Self::Thing(inner) => &mut inner.base,
            Self::Type(inner) => &mut inner.base,
        }
    }

    pub fn kind(&self) -> VertexKind {
        match self {
            Self::Thing(_) => VertexKind::Thing,
            Self::Type(_) => VertexKind::Type,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        self.base().identifier()
    }

    pub fn is_thing(&self) -> bool {
        matches!(self, Self::Thing(_))
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    pub fn as_thing(&self) -> Option<&ThingVertex> {
        match self {
            Self::Thing(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeVertex> {
        match self {
            Self::Type(inner) => Some(inner),
            _ => None,
        }
    }

    pub(crate) fn expect_thing_mut(&mut self) -> Result<&mut ThingVertex, PlannerError> {
        match self {
            Self::Thing(inner) => Ok(inner),
            Self::Type(_) => {
                Err(PlannerError::IllegalCast { expected: VertexKind::Thing, actual: VertexKind::Type })
            }
        }
    }

    pub(crate) fn expect_type_mut(&mut self) -> Result<&mut TypeVertex, PlannerError> {
        match self {
            Self::Type(inner) => Ok(inner),
            Self::Thing(_) => {
                Err(PlannerError::IllegalCast { expected: VertexKind::Type, actual: VertexKind::Thing })
            }
        }
    }

    pub(crate) fn update_objective<B: MilpSolver, S: SchemaGraph>(&self, solver: &mut B, schema: &S) {
        match self {
            Self::Thing(inner) => inner.update_objective(solver, schema),
            Self::Type(inner) => inner.update_objective(solver, schema),
        }
    }

    /// Estimated number of storage entries scanned to enumerate this vertex
    /// unbound. The same estimate prices the vertex as a traversal root and
    /// the directional edges it sources.
    pub(crate) fn scan_size<S: SchemaGraph>(&self, schema: &S) -> f64 {
        match self {
            Self::Thing(inner) => inner.scan_size(schema),
            Self::Type(inner) => inner.scan_size(schema),
        }
    }
}

impl fmt::Display for PlannerVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thing(inner) => match &inner.properties {
                Some(properties) => write!(f, "{} {}", inner.base.identifier, properties),
                None => write!(f, "{} [thing]", inner.base.identifier),
            },
            Self::Type(inner) => match &inner.properties {
                Some(properties) => write!(f, "{} {}", inner.base.identifier, properties),
                None => write!(f, "{} [type]", inner.base.identifier),
            },
        }
    }
}

/// Decision-variable handles of one planner vertex. Populated across the
/// variable- and constraint-initialisation phases; the starting variable is
/// absent for non-indexed vertices, which the encoding treats as constant 0.
#[derive(Debug, Default)]
struct VertexVariables {
    is_starting: Option<VariableId>,
    is_ending: Option<VariableId>,
    has_incoming: Option<VariableId>,
    has_outgoing: Option<VariableId>,
    unselected_incoming: Option<VariableId>,
    unselected_outgoing: Option<VariableId>,
    order_number: Option<VariableId>,
}

#[derive(Debug, Default)]
struct VertexValues {
    is_starting: bool,
    is_ending: bool,
    has_incoming: bool,
    has_outgoing: bool,
}

/// State shared by both vertex kinds: identity, adjacency over the edge
/// table, indexability, decision variables and their decoded values.
#[derive(Debug)]
pub struct VertexBase {
    identifier: Identifier,
    var_prefix: String,
    con_prefix: String,
    ins: Vec<EdgeId>,
    outs: Vec<EdgeId>,
    has_index: bool,
    is_initialised_variables: bool,
    is_initialised_constraints: bool,
    variables: VertexVariables,
    values: VertexValues,
}

impl VertexBase {
    fn new(identifier: Identifier, has_index: bool) -> Self {
        Self {
            var_prefix: format!("vertex::var::{identifier}::"),
            con_prefix: format!("vertex::con::{identifier}::"),
            identifier,
            ins: Vec::new(),
            outs: Vec::new(),
            has_index,
            is_initialised_variables: false,
            is_initialised_constraints: false,
            variables: VertexVariables::default(),
            values: VertexValues::default(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn ins(&self) -> &[EdgeId] {
        &self.ins
    }

    pub fn outs(&self) -> &[EdgeId] {
        &self.outs
    }

    pub fn has_index(&self) -> bool {
        self.has_index
    }

    pub fn is_starting_vertex(&self) -> bool {
        self.values.is_starting
    }

    pub fn is_ending_vertex(&self) -> bool {
        self.values.is_ending
    }

    pub fn has_incoming_edges(&self) -> bool {
        self.values.has_incoming
    }

    pub fn has_outgoing_edges(&self) -> bool {
        self.values.has_outgoing
    }

    pub fn is_initialised_variables(&self) -> bool {
        self.is_initialised_variables
    }

    pub fn is_initialised_constraints(&self) -> bool {
        self.is_initialised_constraints
    }

    pub(crate) fn register_out(&mut self, edge: EdgeId) {
        self.outs.push(edge);
    }

    pub(crate) fn register_in(&mut self, edge: EdgeId) {
        self.ins.push(edge);
    }

    pub(crate) fn starting_variable(&self) -> Option<VariableId> {
        self.variables.is_starting
    }

    pub(crate) fn order_number_variable(&self) -> Option<VariableId> {
        self.variables.order_number
    }

    pub(crate) fn initialise_variables<B: MilpSolver>(&mut self, solver: &mut B) {
        if self.has_index {
            self.variables.is_starting =
                Some(solver.make_int_var(0, 1, &format!("{}is_starting_vertex", self.var_prefix)));
        }
        self.variables.is_ending = Some(solver.make_int_var(0, 1, &format!("{}is_ending_vertex", self.var_prefix)));
        self.variables.has_incoming =
            Some(solver.make_int_var(0, 1, &format!("{}has_incoming_edges", self.var_prefix)));
        self.variables.has_outgoing =
            Some(solver.make_int_var(0, 1, &format!("{}has_outgoing_edges", self.var_prefix)));
        self.is_initialised_variables = true;
    }

    pub(crate) fn initialise_constraints<B: MilpSolver>(
        &mut self,
        solver: &mut B,
        edges: &[PlannerEdge],
        vertex_count: usize,
    ) -> Result<(), PlannerError> {
        let adjacent_initialised = self
            .ins
            .iter()
            .chain(self.outs.iter())
            .all(|&edge| edges[edge.0].is_initialised_variables());
        if !self.is_initialised_variables || !adjacent_initialised {
            return Err(PlannerError::ConstraintInitBeforeVariableInit {});
        }
        self.initialise_constraints_for_incoming_edges(solver, edges);
        self.initialise_constraints_for_outgoing_edges(solver, edges);
        self.initialise_constraints_for_vertex_flow(solver);
        self.variables.order_number =
            Some(solver.make_int_var(0, vertex_count as i64 - 1, &format!("{}order_number", self.var_prefix)));
        self.is_initialised_constraints = true;
        Ok(())
    }

    fn initialise_constraints_for_incoming_edges<B: MilpSolver>(&mut self, solver: &mut B, edges: &[PlannerEdge]) {
        let degree = self.ins.len();
        let unselected =
            solver.make_int_var(0, degree as i64, &format!("{}unselected_incoming_edges", self.var_prefix));
        self.variables.unselected_incoming = Some(unselected);

        let accounting = solver.make_constraint(
            degree as f64,
            degree as f64,
            &format!("{}unselected_incoming_edges", self.con_prefix),
        );
        solver.set_constraint_coefficient(accounting, unselected, 1.0);
        for &edge in &self.ins {
            solver.set_constraint_coefficient(accounting, edges[edge.0].selection_variable().unwrap(), 1.0);
        }

        let has_incoming = self.variables.has_incoming.unwrap();
        if degree == 0 {
            // nothing to select: pin the indicator instead of the empty interval [1, 0]
            let pinned = solver.make_constraint(0.0, 0.0, &format!("{}has_incoming_edges", self.con_prefix));
            solver.set_constraint_coefficient(pinned, has_incoming, 1.0);
        } else {
            let indicator = solver.make_constraint(1.0, degree as f64, &format!("{}has_incoming_edges", self.con_prefix));
            solver.set_constraint_coefficient(indicator, unselected, 1.0);
            solver.set_constraint_coefficient(indicator, has_incoming, 1.0);
        }
    }

    fn initialise_constraints_for_outgoing_edges<B: MilpSolver>(&mut self, solver: &mut B, edges: &[PlannerEdge]) {
        let degree = self.outs.len();
        let unselected =
            solver.make_int_var(0, degree as i64, &format!("{}unselected_outgoing_edges", self.var_prefix));
        self.variables.unselected_outgoing = Some(unselected);

        let accounting = solver.make_constraint(
            degree as f64,
            degree as f64,
            &format!("{}unselected_outgoing_edges", self.con_prefix),
        );
        solver.set_constraint_coefficient(accounting, unselected, 1.0);
        for &edge in &self.outs {
            solver.set_constraint_coefficient(accounting, edges[edge.0].selection_variable().unwrap(), 1.0);
        }

        let has_outgoing = self.variables.has_outgoing.unwrap();
        if degree == 0 {
            let pinned = solver.make_constraint(0.0, 0.0, &format!("{}has_outgoing_edges", self.con_prefix));
            solver.set_constraint_coefficient(pinned, has_outgoing, 1.0);
        } else {
            let indicator = solver.make_constraint(1.0, degree as f64, &format!("{}has_outgoing_edges", self.con_prefix));
            solver.set_constraint_coefficient(indicator, unselected, 1.0);
            solver.set_constraint_coefficient(indicator, has_outgoing, 1.0);
        }
    }

    fn initialise_constraints_for_vertex_flow<B: MilpSolver>(&mut self, solver: &mut B) {
        let has_incoming = self.variables.has_incoming.unwrap();
        let has_outgoing = self.variables.has_outgoing.unwrap();
        let is_ending = self.variables.is_ending.unwrap();

        let starting_or_incoming =
            solver.make_constraint(1.0, 1.0, &format!("{}starting_or_incoming", self.con_prefix));
        if let Some(is_starting) = self.variables.is_starting {
            solver.set_constraint_coefficient(starting_or_incoming, is_starting, 1.0);
        }
        solver.set_constraint_coefficient(starting_or_incoming, has_incoming, 1.0);

        let ending_or_outgoing = solver.make_constraint(1.0, 1.0, &format!("{}ending_or_outgoing", self.con_prefix));
        solver.set_constraint_coefficient(ending_or_outgoing, is_ending, 1.0);
        solver.set_constraint_coefficient(ending_or_outgoing, has_outgoing, 1.0);

        let vertex_flow = solver.make_constraint(0.0, 0.0, &format!("{}vertex_flow", self.con_prefix));
        if let Some(is_starting) = self.variables.is_starting {
            solver.set_constraint_coefficient(vertex_flow, is_starting, 1.0);
        }
        solver.set_constraint_coefficient(vertex_flow, has_incoming, 1.0);
        solver.set_constraint_coefficient(vertex_flow, is_ending, -1.0);
        solver.set_constraint_coefficient(vertex_flow, has_outgoing, -1.0);
    }

    pub(crate) fn record_values<B: MilpSolver>(&mut self, solver: &B) {
        self.values.is_starting = self.has_index
            && self.variables.is_starting.map(|var| solver.solution_value(var).round() as i64 == 1).unwrap_or(false);
        self.values.is_ending = solver.solution_value(self.variables.is_ending.unwrap()).round() as i64 == 1;
        self.values.has_incoming = solver.solution_value(self.variables.has_incoming.unwrap()).round() as i64 == 1;
        self.values.has_outgoing = solver.solution_value(self.variables.has_outgoing.unwrap()).round() as i64 == 1;
    }
}

#[derive(Debug)]
pub struct ThingVertex {
    base: VertexBase,
    properties: Option<ThingProperties>,
}

impl ThingVertex {
    pub(crate) fn new(identifier: Identifier) -> Self {
        Self { base: VertexBase::new(identifier, false), properties: None }
    }

    pub fn properties(&self) -> Option<&ThingProperties> {
        self.properties.as_ref()
    }

    pub(crate) fn set_properties(&mut self, properties: ThingProperties) -> Result<(), PlannerError> {
        if self.properties.is_some() {
            return Err(PlannerError::PropertiesAlreadySet { identifier: self.base.identifier.clone() });
        }
        if properties.has_iid() || !properties.types().is_empty() {
            self.base.has_index = true;
        }
        self.properties = Some(properties);
        Ok(())
    }

    fn update_objective<B: MilpSolver, S: SchemaGraph>(&self, solver: &mut B, schema: &S) {
        if let Some(is_starting) = self.base.starting_variable() {
            solver.set_objective_coefficient(is_starting, self.scan_size(schema));
        }
    }

    fn scan_size<S: SchemaGraph>(&self, schema: &S) -> f64 {
        let Some(properties) = &self.properties else {
            return schema.total_thing_count() as f64;
        };
        if properties.has_iid() {
            1.0
        } else if !properties.types().is_empty() {
            if properties.has_equality_predicate() {
                properties.types().len() as f64
            } else {
                properties
                    .types()
                    .iter()
                    .map(|label| schema.get_type(label).map(|type_| type_.instance_count()).unwrap_or(0))
                    .sum::<u64>() as f64
            }
        } else {
            schema.total_thing_count() as f64
        }
    }
}

#[derive(Debug)]
pub struct TypeVertex {
    base: VertexBase,
    properties: Option<TypeProperties>,
}

impl TypeVertex {
    pub(crate) fn new(identifier: Identifier) -> Self {
        // a type vertex is always indexed
        Self { base: VertexBase::new(identifier, true), properties: None }
    }

    pub fn properties(&self) -> Option<&TypeProperties> {
        self.properties.as_ref()
    }

    pub(crate) fn set_properties(&mut self, properties: TypeProperties) -> Result<(), PlannerError> {
        if self.properties.is_some() {
            return Err(PlannerError::PropertiesAlreadySet { identifier: self.base.identifier.clone() });
        }
        self.properties = Some(properties);
        Ok(())
    }

    fn update_objective<B: MilpSolver, S: SchemaGraph>(&self, solver: &mut B, schema: &S) {
        let Some(properties) = &self.properties else {
            return;
        };
        let is_starting = self.base.starting_variable().unwrap();
        if properties.label().is_some() {
            solver.set_objective_coefficient(is_starting, 1.0);
        } else if properties.is_abstract() {
            solver.set_objective_coefficient(is_starting, schema.type_count() as f64);
        } else if properties.value_type().is_some() || properties.regex().is_some() {
            solver.set_objective_coefficient(is_starting, schema.attribute_type_count() as f64);
        }
    }

    fn scan_size<S: SchemaGraph>(&self, schema: &S) -> f64 {
        let Some(properties) = &self.properties else {
            return schema.type_count() as f64;
        };
        if properties.label().is_some() {
            1.0
        } else if properties.is_abstract() {
            schema.type_count() as f64
        } else if properties.value_type().is_some() || properties.regex().is_some() {
            schema.attribute_type_count() as f64
        } else {
            schema.type_count() as f64
        }
    }
}
