//! UFF atom typing
//!
//! Each atom gets one of the 127 table types from its element and the
//! pattern of bond orders around it. No ring perception or explicit
//! hybridization is used; aromatic bonds stand in for ring context.

use super::params::{index_of_label, UffAtomParams, UFF_PARAMS};
use crate::forcefield::ForceFieldError;
use crate::structure::BondOrder;
use std::fmt;

/// A UFF atom type: a handle into the static parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UffAtomType(u8);

impl UffAtomType {
    /// Resolve a label such as "C_R" to its type
    pub fn from_label(label: &str) -> Option<Self> {
        index_of_label(label).map(|i| UffAtomType(i as u8))
    }

    pub fn label(self) -> &'static str {
        UFF_PARAMS[self.0 as usize].label
    }

    pub fn params(self) -> &'static UffAtomParams {
        &UFF_PARAMS[self.0 as usize]
    }

    /// Hybridization digit encoded in the label (see [`hybridization_from_label`])
    pub fn hybridization(self) -> u8 {
        hybridization_from_label(self.label())
    }
}

impl fmt::Display for UffAtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hybridization from the third character of a label
///
/// A digit is returned as is ("C_3" -> 3, "Fe6+2" -> 6), "R" (resonance)
/// counts as sp2, and labels without a geometry character ("H_", "Cl") give 0.
pub fn hybridization_from_label(label: &str) -> u8 {
    match label.as_bytes().get(2) {
        Some(c @ b'0'..=b'9') => c - b'0',
        Some(b'R') => 2,
        _ => 0,
    }
}

/// Summary of the bonds around one atom
#[derive(Debug, Clone, Copy, Default)]
struct BondPattern {
    degree: usize,
    doubles: usize,
    triple: bool,
    aromatic: bool,
}

impl BondPattern {
    fn new(orders: &[BondOrder]) -> Self {
        let mut pattern = BondPattern {
            degree: orders.len(),
            ..Default::default()
        };
        for order in orders {
            match order {
                BondOrder::Double => pattern.doubles += 1,
                BondOrder::Triple => pattern.triple = true,
                BondOrder::Aromatic => pattern.aromatic = true,
                _ => {}
            }
        }
        pattern
    }

    /// Triple bond or cumulated double bonds
    fn is_linear(&self) -> bool {
        self.triple || self.doubles >= 2
    }
}

static LANTHANIDES: [&str; 14] = [
    "Ce6+3", "Pr6+3", "Nd6+3", "Pm6+3", "Sm6+3", "Eu6+3", "Gd6+3", "Tb6+3", "Dy6+3", "Ho6+3",
    "Er6+3", "Tm6+3", "Yb6+3", "Lu6+3",
];

fn label_for(atomic_number: u8, b: BondPattern) -> Option<&'static str> {
    let label = match atomic_number {
        1 => "H_",
        2 => "He4+4",
        3 => "Li",
        4 => "Be3+2",
        5 if b.doubles > 0 || b.degree <= 2 => "B_2",
        5 => "B_3",
        6 if b.aromatic => "C_R",
        6 if b.is_linear() => "C_1",
        6 if b.doubles == 1 => "C_2",
        6 => "C_3",
        7 if b.aromatic => "N_R",
        7 if b.is_linear() => "N_1",
        7 if b.doubles == 1 => "N_2",
        7 => "N_3",
        8 if b.aromatic => "O_R",
        8 if b.is_linear() => "O_1",
        8 if b.doubles == 1 => "O_2",
        8 => "O_3",
        9 => "F_",
        10 => "Ne4+4",
        11 => "Na",
        12 => "Mg3+2",
        13 => "Al3",
        14 => "Si3",
        15 if b.degree >= 5 => "P_3+5",
        15 => "P_3+3",
        16 if b.aromatic => "S_R",
        16 if b.degree >= 6 => "S_3+6",
        16 if b.degree >= 4 => "S_3+4",
        16 if b.doubles > 0 && b.degree <= 2 => "S_2",
        16 => "S_3+2",
        17 => "Cl",
        18 => "Ar4+4",
        19 => "K_",
        20 => "Ca6+2",
        21 => "Sc3+3",
        22 if b.degree > 4 => "Ti6+4",
        22 => "Ti3+4",
        23 => "V_3+5",
        24 => "Cr6+3",
        25 => "Mn6+2",
        26 if b.degree > 4 => "Fe6+2",
        26 => "Fe3+2",
        27 => "Co6+3",
        28 => "Ni4+2",
        29 => "Cu3+1",
        30 => "Zn3+2",
        31 => "Ga3+3",
        32 => "Ge3",
        33 => "As3+3",
        34 => "Se3+2",
        35 => "Br",
        36 => "Kr4+4",
        37 => "Rb",
        38 => "Sr6+2",
        39 => "Y_3+3",
        40 => "Zr3+4",
        41 => "Nb3+5",
        42 if b.degree > 4 => "Mo6+6",
        42 => "Mo3+6",
        43 => "Tc6+5",
        44 => "Ru6+2",
        45 => "Rh6+3",
        46 => "Pd4+2",
        47 => "Ag1+1",
        48 => "Cd3+2",
        49 => "In3+3",
        50 => "Sn3",
        51 => "Sb3+3",
        52 => "Te3+2",
        53 => "I_",
        54 => "Xe4+4",
        55 => "Cs",
        56 => "Ba6+2",
        57 => "La3+3",
        58..=71 => LANTHANIDES[(atomic_number - 58) as usize],
        72 => "Hf3+4",
        73 => "Ta3+5",
        74 if b.degree > 4 => "W_6+6",
        74 => "W_3+4",
        75 if b.degree > 4 => "Re6+5",
        75 => "Re3+7",
        76 => "Os6+6",
        77 => "Ir6+3",
        78 => "Pt4+2",
        79 => "Au4+3",
        80 => "Hg1+2",
        81 => "Tl3+3",
        82 => "Pb3",
        83 => "Bi3+3",
        84 => "Po3+2",
        85 => "At",
        86 => "Rn4+4",
        87 => "Fr",
        88 => "Ra6+2",
        89 => "Ac6+3",
        90 => "Th6+4",
        91 => "Pa6+4",
        92 => "U_6+4",
        93 => "Np6+4",
        94 => "Pu6+4",
        95 => "Am6+4",
        96 => "Cm6+3",
        97 => "Bk6+3",
        98 => "Cf6+3",
        99 => "Es6+3",
        100 => "Fm6+3",
        101 => "Md6+3",
        102 => "No6+3",
        103 => "Lw6+3",
        _ => return None,
    };
    Some(label)
}

/// Type a single atom from its element and the orders of its bonds
pub fn assign_uff_type(atomic_number: u8, bond_orders: &[BondOrder]) -> Option<UffAtomType> {
    label_for(atomic_number, BondPattern::new(bond_orders)).and_then(UffAtomType::from_label)
}

/// Type every atom of a topology-shaped neighbour list
///
/// `neighbors[i]` lists `(neighbour index, bond order)` for atom `i`.
pub fn assign_uff_types(
    atomic_numbers: &[u8],
    neighbors: &[Vec<(usize, BondOrder)>],
) -> Result<Vec<UffAtomType>, ForceFieldError> {
    if atomic_numbers.len() != neighbors.len() {
        return Err(ForceFieldError::LengthMismatch {
            expected: atomic_numbers.len(),
            actual: neighbors.len(),
        });
    }

    atomic_numbers
        .iter()
        .zip(neighbors)
        .enumerate()
        .map(|(index, (&atomic_number, nbrs))| {
            let orders: Vec<BondOrder> = nbrs.iter().map(|&(_, order)| order).collect();
            assign_uff_type(atomic_number, &orders).ok_or(ForceFieldError::UntypedAtom {
                index,
                atomic_number,
            })
        })
        .collect()
}
