/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::BTreeSet, fmt};

use itertools::Itertools;

use crate::pattern::{Comparator, Iid, Label, ValueType};

/// Property bag of an instance-level variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThingProperties {
    iid: Option<Iid>,
    types: BTreeSet<Label>,
    predicates: BTreeSet<Comparator>,
}

impl ThingProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_iid(&mut self, iid: Iid) {
        self.iid = Some(iid);
    }

    pub fn add_type(&mut self, label: Label) {
        self.types.insert(label);
    }

    pub fn add_predicate(&mut self, comparator: Comparator) {
        self.predicates.insert(comparator);
    }

    pub fn has_iid(&self) -> bool {
        self.iid.is_some()
    }

    pub fn iid(&self) -> Option<&Iid> {
        self.iid.as_ref()
    }

    pub fn types(&self) -> &BTreeSet<Label> {
        &self.types
    }

    pub fn predicates(&self) -> &BTreeSet<Comparator> {
        &self.predicates
    }

    pub fn has_equality_predicate(&self) -> bool {
        self.predicates.iter().any(Comparator::is_equality)
    }
}

impl fmt::Display for ThingProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[thing")?;
        if let Some(iid) = &self.iid {
            write!(f, " iid: {iid}")?;
        }
        if !self.types.is_empty() {
            write!(f, " isa: {}", self.types.iter().join("|"))?;
        }
        if !self.predicates.is_empty() {
            write!(f, " predicates: {}", self.predicates.iter().join(","))?;
        }
        write!(f, "]")
    }
}

/// Property bag of a schema-level variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeProperties {
    label: Option<Label>,
    is_abstract: bool,
    value_type: Option<ValueType>,
    regex: Option<String>,
}

impl TypeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_label(&mut self, label: Label) {
        self.label = Some(label);
    }

    pub fn set_abstract(&mut self) {
        self.is_abstract = true;
    }

    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = Some(value_type);
    }

    pub fn set_regex(&mut self, regex: impl Into<String>) {
        self.regex = Some(regex.into());
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    pub fn regex(&self) -> Option<&str> {
        self.regex.as_deref()
    }
}

impl fmt::Display for TypeProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[type")?;
        if let Some(label) = &self.label {
            write!(f, " label: {label}")?;
        }
        if self.is_abstract {
            write!(f, " abstract")?;
        }
        if let Some(value_type) = self.value_type {
            write!(f, " value: {value_type}")?;
        }
        if let Some(regex) = &self.regex {
            write!(f, " regex: /{regex}/")?;
        }
        write!(f, "]")
    }
}
