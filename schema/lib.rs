/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::HashMap, ops::Deref};

use ir::pattern::Label;
use serde::{Deserialize, Serialize};

/// Read-only statistics view over the schema graph, as exposed by the
/// storage layer. All counts are accurate as of the snapshot the caller
/// holds; the planner never observes them mid-update.
pub trait SchemaGraph {
    fn get_type(&self, label: &Label) -> Option<TypeHandle>;

    fn type_count(&self) -> u64;

    fn attribute_type_count(&self) -> u64;

    fn total_thing_count(&self) -> u64;
}

#[derive(Clone, Copy, Debug)]
pub struct TypeHandle {
    instance_count: u64,
}

impl TypeHandle {
    pub fn new(instance_count: u64) -> Self {
        Self { instance_count }
    }

    pub fn instance_count(&self) -> u64 {
        self.instance_count
    }
}

/// Witness that the caller holds the schema read lock (shared mode) for as
/// long as this guard borrows the graph. The planner receives the guard and
/// never acquires or releases the lock itself.
pub struct SchemaReadGuard<'a, S: SchemaGraph + ?Sized> {
    graph: &'a S,
}

impl<'a, S: SchemaGraph + ?Sized> SchemaReadGuard<'a, S> {
    pub fn new(graph: &'a S) -> Self {
        Self { graph }
    }
}

impl<S: SchemaGraph + ?Sized> Deref for SchemaReadGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.graph
    }
}

/// In-memory schema statistics. Mirrors what the storage layer aggregates
/// durably: per-type instance counts plus the type-level totals the planner
/// consumes for objective coefficients.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaStatistics {
    pub total_thing_count: u64,
    pub type_count: u64,
    pub attribute_type_count: u64,
    pub instance_counts: HashMap<Label, u64>,
}

impl SchemaStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_type(&mut self, label: Label) {
        if self.instance_counts.insert(label, 0).is_none() {
            self.type_count += 1;
        }
    }

    pub fn define_attribute_type(&mut self, label: Label) {
        if self.instance_counts.insert(label, 0).is_none() {
            self.type_count += 1;
            self.attribute_type_count += 1;
        }
    }

    /// Updates the instance count of a defined type, keeping the thing total
    /// consistent. Undefined labels are defined on first use.
    pub fn set_instance_count(&mut self, label: Label, count: u64) {
        let previous = match self.instance_counts.insert(label, count) {
            Some(previous) => previous,
            None => {
                self.type_count += 1;
                0
            }
        };
        self.total_thing_count = self.total_thing_count - previous + count;
    }
}

impl SchemaGraph for SchemaStatistics {
    fn get_type(&self, label: &Label) -> Option<TypeHandle> {
        self.instance_counts.get(label).map(|&count| TypeHandle::new(count))
    }

    fn type_count(&self) -> u64 {
        self.type_count
    }

    fn attribute_type_count(&self) -> u64 {
        self.attribute_type_count
    }

    fn total_thing_count(&self) -> u64 {
        self.total_thing_count
    }
}

#[cfg(test)]
mod tests {
    use ir::pattern::Label;

    use crate::{SchemaGraph, SchemaStatistics};

    #[test]
    fn totals_track_instance_counts() {
        let mut statistics = SchemaStatistics::new();
        statistics.define_type(Label::new("person"));
        statistics.define_attribute_type(Label::new("name"));

        statistics.set_instance_count(Label::new("person"), 100);
        statistics.set_instance_count(Label::new("name"), 40);
        assert_eq!(statistics.total_thing_count(), 140);

        statistics.set_instance_count(Label::new("person"), 10);
        assert_eq!(statistics.total_thing_count(), 50);

        assert_eq!(statistics.type_count(), 2);
        assert_eq!(statistics.attribute_type_count(), 1);
        assert_eq!(statistics.get_type(&Label::new("person")).unwrap().instance_count(), 10);
        assert!(statistics.get_type(&Label::new("marriage")).is_none());
    }
}
