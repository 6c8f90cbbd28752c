/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use ir::pattern::{
    conjunction::Conjunction,
    edge::EdgeLabel,
    vertex::{ThingProperties, TypeProperties},
    Comparator, Identifier, Iid, Label, VertexKind,
};
use options::TraversalOptions;
use schema::{SchemaReadGuard, SchemaStatistics};
use traversal::{
    plan,
    planner::{plan::Plan, GraphPlanner},
    PlannerError,
};

fn iid_thing(conjunction: &mut Conjunction, name: &str) -> Identifier {
    let identifier = Identifier::name(name);
    conjunction.thing_vertex(identifier.clone()).unwrap();
    let mut properties = ThingProperties::new();
    properties.set_iid(Iid::new(vec![0xab]));
    conjunction.set_thing_properties(&identifier, properties).unwrap();
    identifier
}

fn typed_thing(conjunction: &mut Conjunction, name: &str, type_label: &str) -> Identifier {
    let identifier = Identifier::name(name);
    conjunction.thing_vertex(identifier.clone()).unwrap();
    let mut properties = ThingProperties::new();
    properties.add_type(Label::new(type_label));
    conjunction.set_thing_properties(&identifier, properties).unwrap();
    identifier
}

fn bare_thing(conjunction: &mut Conjunction, name: &str) -> Identifier {
    let identifier = Identifier::name(name);
    conjunction.thing_vertex(identifier.clone()).unwrap();
    identifier
}

fn labelled_type(conjunction: &mut Conjunction, name: &str, type_label: &str) -> Identifier {
    let identifier = Identifier::name(name);
    conjunction.type_vertex(identifier.clone()).unwrap();
    let mut properties = TypeProperties::new();
    properties.set_label(Label::new(type_label));
    conjunction.set_type_properties(&identifier, properties).unwrap();
    identifier
}

fn statistics(instance_counts: &[(&str, u64)]) -> SchemaStatistics {
    let mut statistics = SchemaStatistics::new();
    for &(label, count) in instance_counts {
        statistics.set_instance_count(Label::new(label), count);
    }
    statistics
}

// ample budget so every test model is solved to proven optimality
fn test_options() -> TraversalOptions {
    TraversalOptions { solver_time_budget_millis: 10_000 }
}

fn plan_with_invariant_checks(conjunction: &Conjunction, statistics: &SchemaStatistics) -> (GraphPlanner, Plan) {
    let mut planner = GraphPlanner::build(conjunction).unwrap();
    let plan = planner.plan(&SchemaReadGuard::new(statistics), &test_options()).unwrap();
    assert_decoded_invariants(&planner, &plan);
    (planner, plan)
}

/// The decoded-plan invariants: entry and exit flags sum to one, flow is
/// conserved, non-indexed vertices never start, at most one orientation per
/// pattern edge is selected, and `edges_selected` is a spanning forest whose
/// roots are exactly the starting vertices. Selected edges that close a
/// pattern cycle are reported under `checks` and stay out of the forest
/// accounting, so the forest invariants hold for cyclic patterns too.
fn assert_decoded_invariants(planner: &GraphPlanner, plan: &Plan) {
    let vertex_count = planner.vertices().count();
    for vertex in planner.vertices() {
        let base = vertex.base();
        let entry = base.is_starting_vertex() as u32 + base.has_incoming_edges() as u32;
        let exit = base.is_ending_vertex() as u32 + base.has_outgoing_edges() as u32;
        assert_eq!(entry, 1, "entry constraint violated at {}", vertex.identifier());
        assert_eq!(exit, 1, "exit constraint violated at {}", vertex.identifier());
        assert_eq!(entry, exit, "flow constraint violated at {}", vertex.identifier());
        if !base.has_index() {
            assert!(!base.is_starting_vertex(), "non-indexed {} chosen as root", vertex.identifier());
        }
    }

    let edges: Vec<_> = planner.edges().collect();
    for pair in edges.chunks(2) {
        assert!(!(pair[0].is_selected() && pair[1].is_selected()), "both orientations of a pattern edge selected");
    }
    let selected_count = edges.iter().filter(|edge| edge.is_selected()).count();
    assert_eq!(selected_count, plan.edges_selected().len() + plan.checks().len());

    assert_eq!(plan.order().len(), vertex_count);
    for identifier in plan.order() {
        let parents = plan.edges_selected().iter().filter(|(_, to)| to == identifier).count();
        let expected = if plan.roots().contains(identifier) { 0 } else { 1 };
        assert_eq!(parents, expected, "vertex {identifier} has {parents} forest parents");
    }
    assert_eq!(plan.edges_selected().len(), vertex_count - plan.roots().len());
}

#[test]
fn plans_single_vertex_with_iid() {
    let mut conjunction = Conjunction::new();
    let x = iid_thing(&mut conjunction, "x");

    let (planner, plan) = plan_with_invariant_checks(&conjunction, &statistics(&[]));

    assert_eq!(plan.roots(), [x.clone()]);
    assert_eq!(plan.order(), [x.clone()]);
    assert!(plan.edges_selected().is_empty());

    let vertex = planner.vertex(&x).unwrap();
    assert!(vertex.base().is_starting_vertex());
    assert!(vertex.base().is_ending_vertex());
    assert!(!vertex.base().has_incoming_edges());
    assert!(!vertex.base().has_outgoing_edges());
}

#[test]
fn plans_pair_from_the_indexed_vertex() {
    let mut conjunction = Conjunction::new();
    let x = iid_thing(&mut conjunction, "x");
    let y = bare_thing(&mut conjunction, "y");
    conjunction.add_edge(x.clone(), y.clone(), EdgeLabel::Has).unwrap();

    let (_, plan) = plan_with_invariant_checks(&conjunction, &statistics(&[]));

    assert_eq!(plan.roots(), [x.clone()]);
    assert_eq!(plan.order(), [x.clone(), y.clone()]);
    assert_eq!(plan.edges_selected(), [(x, y)]);
}

#[test]
fn plans_chain_outward_from_cheapest_root() {
    let _logging = logger::initialise_logging();

    let mut conjunction = Conjunction::new();
    let a = iid_thing(&mut conjunction, "a");
    let b = typed_thing(&mut conjunction, "b", "person");
    let c = typed_thing(&mut conjunction, "c", "city");
    conjunction.add_edge(a.clone(), b.clone(), EdgeLabel::Has).unwrap();
    conjunction.add_edge(b.clone(), c.clone(), EdgeLabel::Has).unwrap();

    let statistics = statistics(&[("person", 100), ("city", 10)]);
    let (_, plan) = plan_with_invariant_checks(&conjunction, &statistics);

    assert_eq!(plan.roots(), [a.clone()]);
    assert_eq!(plan.order(), [a.clone(), b.clone(), c.clone()]);
    assert_eq!(plan.edges_selected(), [(a, b.clone()), (b, c)]);
    assert!(plan.checks().is_empty());
}

#[test]
fn cyclic_pattern_directs_every_edge_and_reports_the_cycle_closer_as_a_check() {
    let mut conjunction = Conjunction::new();
    let a = iid_thing(&mut conjunction, "a");
    let b = typed_thing(&mut conjunction, "b", "person");
    let c = typed_thing(&mut conjunction, "c", "city");
    conjunction.add_edge(a.clone(), b.clone(), EdgeLabel::Has).unwrap();
    conjunction.add_edge(b.clone(), c.clone(), EdgeLabel::Has).unwrap();
    conjunction.add_edge(c.clone(), a.clone(), EdgeLabel::Has).unwrap();

    let statistics = statistics(&[("person", 100), ("city", 10)]);
    let (planner, plan) = plan_with_invariant_checks(&conjunction, &statistics);

    // all three pattern edges are directed, but only two can be forest edges
    let selected = planner.edges().filter(|edge| edge.is_selected()).count();
    assert_eq!(selected, 3);
    assert_eq!(plan.roots(), [a.clone()]);
    assert_eq!(plan.order(), [a.clone(), b.clone(), c.clone()]);
    assert_eq!(plan.edges_selected(), [(a.clone(), b.clone()), (a, c.clone())]);
    assert_eq!(plan.checks(), [(b, c)]);
}

#[test]
fn pattern_without_indexable_root_is_infeasible() {
    let mut conjunction = Conjunction::new();
    let x = bare_thing(&mut conjunction, "x");
    let y = bare_thing(&mut conjunction, "y");
    conjunction.add_edge(x, y, EdgeLabel::Has).unwrap();

    let mut planner = GraphPlanner::build(&conjunction).unwrap();
    let statistics = statistics(&[]);
    let result = planner.plan(&SchemaReadGuard::new(&statistics), &test_options());
    assert!(matches!(result, Err(PlannerError::PlanInfeasible { .. })));
}

#[test]
fn labelled_type_is_preferred_over_instance_scan() {
    let mut conjunction = Conjunction::new();
    let person_type = labelled_type(&mut conjunction, "person_type", "person");
    let person = typed_thing(&mut conjunction, "person", "person");
    conjunction.add_edge(person.clone(), person_type.clone(), EdgeLabel::Isa).unwrap();

    let statistics = statistics(&[("person", 100)]);
    let (_, plan) = plan_with_invariant_checks(&conjunction, &statistics);

    assert_eq!(plan.roots(), [person_type.clone()]);
    assert_eq!(plan.order(), [person_type.clone(), person.clone()]);
    assert_eq!(plan.edges_selected(), [(person_type, person)]);
}

#[test]
fn disconnected_patterns_get_one_root_each() {
    let mut conjunction = Conjunction::new();
    let x = iid_thing(&mut conjunction, "x");
    let y = iid_thing(&mut conjunction, "y");

    let (planner, plan) = plan_with_invariant_checks(&conjunction, &statistics(&[]));

    assert_eq!(plan.roots().len(), 2);
    assert!(plan.roots().contains(&x) && plan.roots().contains(&y));
    assert_eq!(plan.order().len(), 2);
    assert!(plan.edges_selected().is_empty());
    for identifier in [&x, &y] {
        let base = planner.vertex(identifier).unwrap().base();
        assert!(base.is_starting_vertex() && base.is_ending_vertex());
    }
}

#[test]
fn equality_predicate_makes_typed_lookup_cheap() {
    let mut conjunction = Conjunction::new();
    let x = Identifier::name("x");
    conjunction.thing_vertex(x.clone()).unwrap();
    let mut properties = ThingProperties::new();
    properties.add_type(Label::new("person"));
    properties.add_predicate(Comparator::Equal);
    conjunction.set_thing_properties(&x, properties).unwrap();
    let y = typed_thing(&mut conjunction, "y", "city");
    conjunction.add_edge(x.clone(), y, EdgeLabel::Has).unwrap();

    // the equality lookup prices x at |types| = 1, far below the city scan
    let statistics = statistics(&[("person", 1000), ("city", 5)]);
    let (_, plan) = plan_with_invariant_checks(&conjunction, &statistics);

    assert_eq!(plan.roots(), [x]);
}

#[test]
fn raising_a_root_cost_never_attracts_the_root() {
    let build = || {
        let mut conjunction = Conjunction::new();
        let x = typed_thing(&mut conjunction, "x", "person");
        let y = typed_thing(&mut conjunction, "y", "city");
        conjunction.add_edge(x.clone(), y.clone(), EdgeLabel::Has).unwrap();
        (conjunction, x, y)
    };

    let (conjunction, x, _) = build();
    let cheap = statistics(&[("person", 10), ("city", 50)]);
    let (_, plan) = plan_with_invariant_checks(&conjunction, &cheap);
    assert_eq!(plan.roots(), [x]);

    let (conjunction, _, y) = build();
    let expensive = statistics(&[("person", 1000), ("city", 50)]);
    let (_, plan) = plan_with_invariant_checks(&conjunction, &expensive);
    assert_eq!(plan.roots(), [y]);
}

#[test]
fn plans_are_deterministic() {
    let build = || {
        let mut conjunction = Conjunction::new();
        let a = iid_thing(&mut conjunction, "a");
        let b = typed_thing(&mut conjunction, "b", "person");
        let c = typed_thing(&mut conjunction, "c", "city");
        conjunction.add_edge(a.clone(), b.clone(), EdgeLabel::Has).unwrap();
        conjunction.add_edge(b, c, EdgeLabel::Has).unwrap();
        conjunction
    };
    let statistics = statistics(&[("person", 100), ("city", 10)]);

    let first =
        plan(&build(), &SchemaReadGuard::new(&statistics), &test_options()).unwrap();
    let second =
        plan(&build(), &SchemaReadGuard::new(&statistics), &test_options()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn edge_direction_is_independent_of_declaration_order() {
    let statistics = statistics(&[("city", 10)]);

    let mut forward_declared = Conjunction::new();
    let x = iid_thing(&mut forward_declared, "x");
    let y = typed_thing(&mut forward_declared, "y", "city");
    forward_declared.add_edge(x.clone(), y.clone(), EdgeLabel::Has).unwrap();
    let (_, forward_plan) = plan_with_invariant_checks(&forward_declared, &statistics);

    let mut backward_declared = Conjunction::new();
    let x2 = iid_thing(&mut backward_declared, "x");
    let y2 = typed_thing(&mut backward_declared, "y", "city");
    backward_declared.add_edge(y2, x2, EdgeLabel::Has).unwrap();
    let (_, backward_plan) = plan_with_invariant_checks(&backward_declared, &statistics);

    assert_eq!(forward_plan.roots(), [x.clone()]);
    assert_eq!(backward_plan.roots(), forward_plan.roots());
    assert_eq!(forward_plan.edges_selected(), [(x, y)]);
    assert_eq!(backward_plan.edges_selected(), forward_plan.edges_selected());
}

#[test]
fn replanning_follows_schema_changes() {
    let mut conjunction = Conjunction::new();
    let x = typed_thing(&mut conjunction, "x", "person");
    let y = typed_thing(&mut conjunction, "y", "city");
    conjunction.add_edge(x.clone(), y.clone(), EdgeLabel::Has).unwrap();

    let mut planner = GraphPlanner::build(&conjunction).unwrap();

    let before = statistics(&[("person", 10), ("city", 50)]);
    let plan = planner.plan(&SchemaReadGuard::new(&before), &test_options()).unwrap();
    assert_eq!(plan.roots(), [x]);

    let after = statistics(&[("person", 1000), ("city", 50)]);
    let plan = planner.plan(&SchemaReadGuard::new(&after), &test_options()).unwrap();
    assert_eq!(plan.roots(), [y]);
}

#[test]
fn exhausted_time_budget_surfaces_as_solver_failure() {
    let mut conjunction = Conjunction::new();
    iid_thing(&mut conjunction, "x");

    let mut planner = GraphPlanner::build(&conjunction).unwrap();
    let statistics = statistics(&[]);
    let options = TraversalOptions { solver_time_budget_millis: 0 };
    let result = planner.plan(&SchemaReadGuard::new(&statistics), &options);
    assert!(matches!(result, Err(PlannerError::SolverFailure { .. })));
}

#[test]
fn re_adding_an_identifier_with_another_kind_fails() {
    let mut planner = GraphPlanner::build(&Conjunction::new()).unwrap();
    let x = Identifier::name("x");
    planner.add_vertex(x.clone(), VertexKind::Thing).unwrap();
    planner.add_vertex(x.clone(), VertexKind::Thing).unwrap();

    let result = planner.add_vertex(x, VertexKind::Type);
    assert!(matches!(
        result,
        Err(PlannerError::InconsistentVertexKind {
            existing: VertexKind::Thing,
            requested: VertexKind::Type,
            ..
        })
    ));
}

#[test]
fn vertex_properties_are_set_at_most_once() {
    let mut planner = GraphPlanner::build(&Conjunction::new()).unwrap();
    let x = planner.add_vertex(Identifier::name("x"), VertexKind::Thing).unwrap();
    planner.set_thing_properties(x, ThingProperties::new()).unwrap();

    let result = planner.set_thing_properties(x, ThingProperties::new());
    assert!(matches!(result, Err(PlannerError::PropertiesAlreadySet { .. })));
}

#[test]
fn mismatched_property_kind_is_an_illegal_cast() {
    let mut planner = GraphPlanner::build(&Conjunction::new()).unwrap();
    let x = planner.add_vertex(Identifier::name("x"), VertexKind::Type).unwrap();

    let result = planner.set_thing_properties(x, ThingProperties::new());
    assert!(matches!(
        result,
        Err(PlannerError::IllegalCast { expected: VertexKind::Thing, actual: VertexKind::Type })
    ));

    assert!(planner.vertex(&Identifier::name("x")).unwrap().as_thing().is_none());
    assert!(planner.vertex(&Identifier::name("x")).unwrap().as_type().is_some());
}
