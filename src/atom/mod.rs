//! Atom representation and element data

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element symbols indexed by atomic number (index 0 is the placeholder "X")
static ELEMENT_SYMBOLS: [&str; 104] = [
    "X", // placeholder / dummy atom
    "H", "He", // Row 1
    "Li", "Be", "B", "C", "N", "O", "F", "Ne", // Row 2
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", // Row 3
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", // Row 4
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", // Row 5
    "In", "Sn", "Sb", "Te", "I", "Xe",
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", // Row 6
    "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt",
    "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", // Row 7
    "Es", "Fm", "Md", "No", "Lr",
];

/// Returns the element symbol for an atomic number, if known
pub fn element_symbol(atomic_number: u8) -> Option<&'static str> {
    ELEMENT_SYMBOLS.get(atomic_number as usize).copied()
}

/// Parse an element symbol (case-insensitive) into an atomic number
pub fn atomic_number_from_symbol(symbol: &str) -> Option<u8> {
    let symbol = symbol.trim();
    ELEMENT_SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(symbol))
        .map(|z| z as u8)
}

/// Represents an atom in 3D space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// Identifier, unique within a structure
    pub id: u32,

    /// Element (atomic number, 0 for placeholder atoms)
    pub atomic_number: u8,

    /// 3D coordinates (in Angstroms)
    pub position: Vector3<f64>,
}

impl Atom {
    /// Create a new atom
    pub fn new(id: u32, atomic_number: u8, position: Vector3<f64>) -> Self {
        Self {
            id,
            atomic_number,
            position,
        }
    }

    /// Calculate distance to another atom
    pub fn distance(&self, other: &Atom) -> f64 {
        (self.position - other.position).norm()
    }

    /// Element symbol of this atom ("X" for unknown elements)
    pub fn symbol(&self) -> &'static str {
        element_symbol(self.atomic_number).unwrap_or("X")
    }

    /// Placeholder atoms carry no element and take no part in minimization
    pub fn is_placeholder(&self) -> bool {
        self.atomic_number == 0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}({}, {}, {})",
            self.symbol(),
            self.id,
            self.position.x,
            self.position.y,
            self.position.z
        )
    }
}
