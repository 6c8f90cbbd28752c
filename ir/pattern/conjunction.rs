/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::HashMap, fmt};

use crate::{
    pattern::{
        edge::{Edge, EdgeLabel},
        vertex::{ThingProperties, TypeProperties},
        Identifier, VertexKind,
    },
    PatternDefinitionError,
};

/// A normalized pattern: the conjunction of vertex declarations, their
/// property bags, and the undirected typed edges between them. Declaration
/// order is retained and is the order the planner indexes vertices in.
#[derive(Debug, Default)]
pub struct Conjunction {
    declarations: Vec<VertexDeclaration>,
    index: HashMap<Identifier, usize>,
    edges: Vec<Edge>,
}

impl Conjunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `identifier` as an instance-level variable. Idempotent: a
    /// repeated declaration of the same kind is a no-op.
    pub fn thing_vertex(&mut self, identifier: Identifier) -> Result<(), PatternDefinitionError> {
        self.declare(identifier, VertexKind::Thing)
    }

    /// Declares `identifier` as a schema-level variable. Idempotent.
    pub fn type_vertex(&mut self, identifier: Identifier) -> Result<(), PatternDefinitionError> {
        self.declare(identifier, VertexKind::Type)
    }

    fn declare(&mut self, identifier: Identifier, kind: VertexKind) -> Result<(), PatternDefinitionError> {
        match self.index.get(&identifier) {
            Some(&existing) => {
                let existing_kind = self.declarations[existing].kind();
                if existing_kind == kind {
                    Ok(())
                } else {
                    Err(PatternDefinitionError::VertexKindMismatch { identifier, existing: existing_kind, requested: kind })
                }
            }
            None => {
                self.index.insert(identifier.clone(), self.declarations.len());
                self.declarations.push(match kind {
                    VertexKind::Thing => VertexDeclaration::Thing { identifier, properties: None },
                    VertexKind::Type => VertexDeclaration::Type { identifier, properties: None },
                });
                Ok(())
            }
        }
    }

    pub fn set_thing_properties(
        &mut self,
        identifier: &Identifier,
        properties: ThingProperties,
    ) -> Result<(), PatternDefinitionError> {
        match self.declaration_mut(identifier)? {
            VertexDeclaration::Thing { properties: slot, .. } => {
                if slot.is_some() {
                    return Err(PatternDefinitionError::VertexPropertiesAlreadySet { identifier: identifier.clone() });
                }
                *slot = Some(properties);
                Ok(())
            }
            VertexDeclaration::Type { .. } => Err(PatternDefinitionError::VertexKindMismatch {
                identifier: identifier.clone(),
                existing: VertexKind::Type,
                requested: VertexKind::Thing,
            }),
        }
    }

    pub fn set_type_properties(
        &mut self,
        identifier: &Identifier,
        properties: TypeProperties,
    ) -> Result<(), PatternDefinitionError> {
        match self.declaration_mut(identifier)? {
            VertexDeclaration::Type { properties: slot, .. } => {
                if slot.is_some() {
                    return Err(PatternDefinitionError::VertexPropertiesAlreadySet { identifier: identifier.clone() });
                }
                *slot = Some(properties);
                Ok(())
            }
            VertexDeclaration::Thing { .. } => Err(PatternDefinitionError::VertexKindMismatch {
                identifier: identifier.clone(),
                existing: VertexKind::Thing,
                requested: VertexKind::Type,
            }),
        }
    }

    /// Adds an undirected typed edge. Both endpoints must be declared.
    pub fn add_edge(
        &mut self,
        from: Identifier,
        to: Identifier,
        label: EdgeLabel,
    ) -> Result<(), PatternDefinitionError> {
        for endpoint in [&from, &to] {
            if !self.index.contains_key(endpoint) {
                return Err(PatternDefinitionError::UndeclaredVertex { identifier: endpoint.clone() });
            }
        }
        self.edges.push(Edge::new(from, to, label));
        Ok(())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &VertexDeclaration> {
        self.declarations.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn declaration_mut(&mut self, identifier: &Identifier) -> Result<&mut VertexDeclaration, PatternDefinitionError> {
        match self.index.get(identifier) {
            Some(&index) => Ok(&mut self.declarations[index]),
            None => Err(PatternDefinitionError::UndeclaredVertex { identifier: identifier.clone() }),
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conjunction")?;
        for declaration in &self.declarations {
            writeln!(f, "  {declaration}")?;
        }
        for edge in &self.edges {
            writeln!(f, "  {edge}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum VertexDeclaration {
    Thing { identifier: Identifier, properties: Option<ThingProperties> },
    Type { identifier: Identifier, properties: Option<TypeProperties> },
}

impl VertexDeclaration {
    pub fn identifier(&self) -> &Identifier {
        match self {
            Self::Thing { identifier, .. } | Self::Type { identifier, .. } => identifier,
        }
    }

    pub fn kind(&self) -> VertexKind {
        match self {
            Self::Thing { .. } => VertexKind::Thing,
            Self::Type { .. } => VertexKind::Type,
        }
    }

    pub fn thing_properties(&self) -> Option<&ThingProperties> {
        match self {
            Self::Thing { properties, .. } => properties.as_ref(),
            Self::Type { .. } => None,
        }
    }

    pub fn type_properties(&self) -> Option<&TypeProperties> {
        match self {
            Self::Type { properties, .. } => properties.as_ref(),
            Self::Thing { .. } => None,
        }
    }
}

impl fmt::Display for VertexDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thing { identifier, properties } => match properties {
                Some(properties) => write!(f, "{identifier} {properties}"),
                None => write!(f, "{identifier} [thing]"),
            },
            Self::Type { identifier, properties } => match properties {
                Some(properties) => write!(f, "{identifier} {properties}"),
                None => write!(f, "{identifier} [type]"),
            },
        }
    }
}
