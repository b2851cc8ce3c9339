//! Atomic structure: atoms keyed by id and the bond graph between them

use crate::atom::Atom;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur when editing a structure
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StructureError {
    #[error("Invalid bond: atom {0} not found")]
    UnknownAtom(u32),

    #[error("Invalid bond: atom {0} cannot bond to itself")]
    SelfBond(u32),

    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(u32, u32),

    #[error("Duplicate atom id: {0}")]
    DuplicateAtomId(u32),
}

/// Kind of a chemical bond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Dative,
    Metallic,
}

impl BondOrder {
    /// Numeric bond order used by UFF parameter formulas
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
            // UFF has no dedicated parameters for these
            BondOrder::Quadruple | BondOrder::Dative | BondOrder::Metallic => 1.0,
        }
    }
}

impl Default for BondOrder {
    fn default() -> Self {
        BondOrder::Single
    }
}

/// Represents a chemical bond between two atoms, by atom id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// Id of the first atom
    pub atom1: u32,

    /// Id of the second atom
    pub atom2: u32,

    /// Bond order
    #[serde(default)]
    pub order: BondOrder,
}

impl Bond {
    /// True if the bond connects the two given atoms, in either direction
    pub fn connects(&self, a: u32, b: u32) -> bool {
        (self.atom1 == a && self.atom2 == b) || (self.atom1 == b && self.atom2 == a)
    }
}

/// A set of atoms and the bonds between them
///
/// This is the caller-owned representation: minimization reads it once to
/// build a topology and writes relaxed positions back into it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomicStructure {
    /// Atoms, in insertion order
    pub atoms: Vec<Atom>,

    /// Bonds between atoms
    #[serde(default)]
    pub bonds: Vec<Bond>,
}

impl AtomicStructure {
    /// Create a new empty structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom with a fresh id and return that id
    ///
    /// Ids count up from the largest one in use. If that is `u32::MAX`, the
    /// smallest unused id is taken instead.
    pub fn add_atom(&mut self, atomic_number: u8, position: Vector3<f64>) -> u32 {
        let id = match self.atoms.iter().map(|a| a.id).max() {
            None => 1,
            Some(max) => max.checked_add(1).unwrap_or_else(|| self.smallest_unused_id()),
        };
        self.atoms.push(Atom::new(id, atomic_number, position));
        id
    }

    fn smallest_unused_id(&self) -> u32 {
        let used: HashSet<u32> = self.atoms.iter().map(|a| a.id).collect();
        (1..u32::MAX).find(|id| !used.contains(id)).unwrap_or(0)
    }

    /// Add a bond between two existing atoms
    pub fn add_bond(
        &mut self,
        atom1: u32,
        atom2: u32,
        order: BondOrder,
    ) -> Result<usize, StructureError> {
        if atom1 == atom2 {
            return Err(StructureError::SelfBond(atom1));
        }
        for id in [atom1, atom2] {
            if self.atom(id).is_none() {
                return Err(StructureError::UnknownAtom(id));
            }
        }
        if self.bonds.iter().any(|b| b.connects(atom1, atom2)) {
            return Err(StructureError::DuplicateBond(atom1, atom2));
        }

        self.bonds.push(Bond {
            atom1,
            atom2,
            order,
        });
        Ok(self.bonds.len() - 1)
    }

    /// Look up an atom by id
    pub fn atom(&self, id: u32) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    /// Look up an atom by id, mutably
    pub fn atom_mut(&mut self, id: u32) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|a| a.id == id)
    }

    /// Move an atom. Returns false if the id is unknown.
    pub fn set_position(&mut self, id: u32, position: Vector3<f64>) -> bool {
        match self.atom_mut(id) {
            Some(atom) => {
                atom.position = position;
                true
            }
            None => false,
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Check that atom ids are unique and every bond refers to known atoms
    pub fn validate(&self) -> Result<(), StructureError> {
        let mut seen: HashSet<u32> = HashSet::with_capacity(self.atoms.len());
        for atom in &self.atoms {
            if !seen.insert(atom.id) {
                return Err(StructureError::DuplicateAtomId(atom.id));
            }
        }
        for bond in &self.bonds {
            if bond.atom1 == bond.atom2 {
                return Err(StructureError::SelfBond(bond.atom1));
            }
            for id in [bond.atom1, bond.atom2] {
                if !seen.contains(&id) {
                    return Err(StructureError::UnknownAtom(id));
                }
            }
        }
        Ok(())
    }
}
