/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod conjunction;
pub mod edge;
pub mod vertex;

/// Stable identity of a pattern variable. Two vertices carrying the same
/// identifier are the same vertex.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Identifier {
    Name(String),
    Anonymous(u16),
}

impl Identifier {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn anonymous(id: u16) -> Self {
        Self::Anonymous(id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "${name}"),
            Self::Anonymous(id) => write!(f, "$_{id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum VertexKind {
    Thing,
    Type,
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thing => write!(f, "thing"),
            Self::Type => write!(f, "type"),
        }
    }
}

/// A possibly scoped type label, e.g. `person` or `marriage:spouse`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    name: String,
    scope: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), scope: None }
    }

    pub fn new_scoped(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self { name: name.into(), scope: Some(scope.into()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// An explicit instance handle taken verbatim from the storage encoding.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Iid {
    bytes: Vec<u8>,
}

impl Iid {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Iid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.bytes {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Comparator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
    Contains,
}

impl Comparator {
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Equal)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Like => "like",
            Self::Contains => "contains",
        };
        write!(f, "{token}")
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    Long,
    Double,
    String,
    DateTime,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Long => write!(f, "long"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::DateTime => write!(f, "datetime"),
        }
    }
}
