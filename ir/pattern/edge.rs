/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::pattern::Identifier;

/// The typed pattern-edge vocabulary. Pattern edges are undirected; the
/// canonical reading is `from label to`, e.g. `$x has $name`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum EdgeLabel {
    Isa,
    Sub,
    Has,
    Owns,
    Plays,
    Relates,
    Links,
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isa => write!(f, "isa"),
            Self::Sub => write!(f, "sub"),
            Self::Has => write!(f, "has"),
            Self::Owns => write!(f, "owns"),
            Self::Plays => write!(f, "plays"),
            Self::Relates => write!(f, "relates"),
            Self::Links => write!(f, "links"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    from: Identifier,
    to: Identifier,
    label: EdgeLabel,
}

impl Edge {
    pub(crate) fn new(from: Identifier, to: Identifier, label: EdgeLabel) -> Self {
        Self { from, to, label }
    }

    pub fn from(&self) -> &Identifier {
        &self.from
    }

    pub fn to(&self) -> &Identifier {
        &self.to
    }

    pub fn label(&self) -> EdgeLabel {
        self.label
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.from, self.label, self.to)
    }
}
