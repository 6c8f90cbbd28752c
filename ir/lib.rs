/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{error::Error, fmt};

use crate::pattern::{Identifier, VertexKind};

pub mod pattern;

#[derive(Debug, Clone)]
pub enum PatternDefinitionError {
    VertexKindMismatch { identifier: Identifier, existing: VertexKind, requested: VertexKind },
    VertexPropertiesAlreadySet { identifier: Identifier },
    UndeclaredVertex { identifier: Identifier },
}

impl fmt::Display for PatternDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexKindMismatch { identifier, existing, requested } => {
                write!(f, "vertex '{identifier}' was declared as '{existing}' and cannot be re-declared as '{requested}'")
            }
            Self::VertexPropertiesAlreadySet { identifier } => {
                write!(f, "properties of vertex '{identifier}' have already been set")
            }
            Self::UndeclaredVertex { identifier } => {
                write!(f, "vertex '{identifier}' has not been declared in this pattern")
            }
        }
    }
}

impl Error for PatternDefinitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::VertexKindMismatch { .. } => None,
            Self::VertexPropertiesAlreadySet { .. } => None,
            Self::UndeclaredVertex { .. } => None,
        }
    }
}
