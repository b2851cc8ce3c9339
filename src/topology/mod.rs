//! Molecular topology: flat coordinate arrays and enumerated interaction terms
//!
//! The topology is built once per minimization from an [`AtomicStructure`].
//! Atoms are relabelled to dense indices `0..num_atoms`; every interaction
//! list refers to those indices. Only `positions` changes afterwards.

use crate::structure::{AtomicStructure, BondOrder};
use log::debug;
use std::collections::{HashMap, HashSet};

/// A bonded pair, `idx1 < idx2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopoBond {
    pub idx1: usize,
    pub idx2: usize,
    pub order: BondOrder,
}

/// A bond angle with `idx2` as the vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Angle {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
}

/// A dihedral i-j-k-l about the central bond j-k
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Torsion {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
    pub idx4: usize,
}

/// An out-of-plane term with `idx2` as the centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inversion {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
    pub idx4: usize,
}

/// A pair evaluated with the van der Waals term, `idx1 < idx2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonbondedPair {
    pub idx1: usize,
    pub idx2: usize,
}

/// Flattened structure plus every interaction the force field evaluates
#[derive(Debug, Clone, Default)]
pub struct MolecularTopology {
    /// Number of atoms taking part (placeholders excluded)
    pub num_atoms: usize,

    /// Topology index -> structure atom id
    pub atom_ids: Vec<u32>,

    /// Atomic number per topology index
    pub atomic_numbers: Vec<u8>,

    /// Flat coordinates `[x0, y0, z0, x1, ...]`, `3 * num_atoms` long
    pub positions: Vec<f64>,

    /// Sorted `(neighbour, order)` lists per atom
    pub neighbors: Vec<Vec<(usize, BondOrder)>>,

    pub bonds: Vec<TopoBond>,
    pub angles: Vec<Angle>,
    pub torsions: Vec<Torsion>,
    pub inversions: Vec<Inversion>,
    pub nonbonded_pairs: Vec<NonbondedPair>,

    id_to_index: HashMap<u32, usize>,
}

impl MolecularTopology {
    /// Build the full topology, including all non-bonded pairs
    pub fn from_structure(structure: &AtomicStructure) -> Self {
        let mut topology = Self::from_structure_bonded_only(structure);
        topology.nonbonded_pairs = topology.enumerate_nonbonded_pairs();
        debug!(
            "Topology has {} non-bonded pairs",
            topology.nonbonded_pairs.len()
        );
        topology
    }

    /// Build the topology without enumerating non-bonded pairs
    ///
    /// Used with a distance cutoff, where pairs are found on the fly.
    pub fn from_structure_bonded_only(structure: &AtomicStructure) -> Self {
        let mut atom_ids = Vec::with_capacity(structure.atoms.len());
        let mut atomic_numbers = Vec::with_capacity(structure.atoms.len());
        let mut positions = Vec::with_capacity(3 * structure.atoms.len());
        let mut id_to_index = HashMap::with_capacity(structure.atoms.len());

        for atom in structure.atoms.iter().filter(|a| !a.is_placeholder()) {
            if id_to_index.contains_key(&atom.id) {
                continue;
            }
            id_to_index.insert(atom.id, atom_ids.len());
            atom_ids.push(atom.id);
            atomic_numbers.push(atom.atomic_number);
            positions.extend_from_slice(&[atom.position.x, atom.position.y, atom.position.z]);
        }

        let num_atoms = atom_ids.len();
        let mut neighbors: Vec<Vec<(usize, BondOrder)>> = vec![Vec::new(); num_atoms];
        let mut bonds = Vec::with_capacity(structure.bonds.len());
        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(structure.bonds.len());

        for bond in &structure.bonds {
            let (Some(&a), Some(&b)) = (id_to_index.get(&bond.atom1), id_to_index.get(&bond.atom2))
            else {
                continue;
            };
            if a == b || !seen.insert((a.min(b), a.max(b))) {
                continue;
            }
            neighbors[a].push((b, bond.order));
            neighbors[b].push((a, bond.order));
            bonds.push(TopoBond {
                idx1: a.min(b),
                idx2: a.max(b),
                order: bond.order,
            });
        }

        for list in &mut neighbors {
            list.sort_by_key(|&(idx, _)| idx);
        }

        let mut topology = Self {
            num_atoms,
            atom_ids,
            atomic_numbers,
            positions,
            neighbors,
            bonds,
            id_to_index,
            ..Self::default()
        };
        topology.angles = topology.enumerate_angles();
        topology.torsions = topology.enumerate_torsions();
        topology.inversions = topology.enumerate_inversions();

        debug!(
            "Topology: {} atoms, {} bonds, {} angles, {} torsions, {} inversions",
            topology.num_atoms,
            topology.bonds.len(),
            topology.angles.len(),
            topology.torsions.len(),
            topology.inversions.len()
        );

        topology
    }

    /// Topology index of a structure atom id
    pub fn index_of(&self, atom_id: u32) -> Option<usize> {
        self.id_to_index.get(&atom_id).copied()
    }

    /// Position of one atom as an array
    pub fn position(&self, idx: usize) -> [f64; 3] {
        [
            self.positions[3 * idx],
            self.positions[3 * idx + 1],
            self.positions[3 * idx + 2],
        ]
    }

    /// Pairs excluded from van der Waals: 1-2 (bonded) and 1-3 (angle ends)
    pub fn exclusion_set(&self) -> HashSet<(usize, usize)> {
        let mut exclusions = HashSet::with_capacity(self.bonds.len() + self.angles.len());
        for bond in &self.bonds {
            exclusions.insert((bond.idx1, bond.idx2));
        }
        for angle in &self.angles {
            exclusions.insert((angle.idx1.min(angle.idx3), angle.idx1.max(angle.idx3)));
        }
        exclusions
    }

    /// One angle per unordered pair of neighbours, per vertex
    fn enumerate_angles(&self) -> Vec<Angle> {
        let mut angles = Vec::new();
        for (vertex, nbrs) in self.neighbors.iter().enumerate() {
            for (a, &(i, _)) in nbrs.iter().enumerate() {
                for &(k, _) in &nbrs[a + 1..] {
                    angles.push(Angle {
                        idx1: i,
                        idx2: vertex,
                        idx3: k,
                    });
                }
            }
        }
        angles
    }

    fn enumerate_torsions(&self) -> Vec<Torsion> {
        let mut torsions = Vec::new();
        for bond in &self.bonds {
            let (j, k) = (bond.idx1, bond.idx2);
            if !self.is_torsion_capable(j) || !self.is_torsion_capable(k) {
                continue;
            }
            for &(i, _) in &self.neighbors[j] {
                if i == k {
                    continue;
                }
                for &(l, _) in &self.neighbors[k] {
                    // l == i closes a three-membered ring
                    if l == j || l == i {
                        continue;
                    }
                    torsions.push(Torsion {
                        idx1: i,
                        idx2: j,
                        idx3: k,
                        idx4: l,
                    });
                }
            }
        }
        torsions
    }

    /// Linear (sp) C/N/O centres carry no torsional barrier.
    ///
    /// Mirrors the typer's `_1` rule: a triple bond, or two or more double
    /// bonds, with no aromatic bond.
    fn is_torsion_capable(&self, idx: usize) -> bool {
        if !matches!(self.atomic_numbers[idx], 6..=8) {
            return true;
        }
        let orders = self.neighbors[idx].iter().map(|&(_, o)| o);
        let aromatic = orders.clone().any(|o| o == BondOrder::Aromatic);
        let triple = orders.clone().any(|o| o == BondOrder::Triple);
        let doubles = orders.filter(|&o| o == BondOrder::Double).count();
        aromatic || !(triple || doubles >= 2)
    }

    fn enumerate_inversions(&self) -> Vec<Inversion> {
        let mut inversions = Vec::new();
        for (center, nbrs) in self.neighbors.iter().enumerate() {
            if nbrs.len() != 3 || !self.is_inversion_center(center) {
                continue;
            }
            let (n0, n1, n2) = (nbrs[0].0, nbrs[1].0, nbrs[2].0);
            for (a, b, c) in [(n0, n1, n2), (n0, n2, n1), (n1, n2, n0)] {
                inversions.push(Inversion {
                    idx1: a,
                    idx2: center,
                    idx3: b,
                    idx4: c,
                });
            }
        }
        inversions
    }

    /// sp2 C/N/O (double or aromatic bond) or a group 15 element
    fn is_inversion_center(&self, idx: usize) -> bool {
        match self.atomic_numbers[idx] {
            6..=8 => self.neighbors[idx]
                .iter()
                .any(|&(_, o)| matches!(o, BondOrder::Double | BondOrder::Aromatic)),
            15 | 33 | 51 | 83 => true,
            _ => false,
        }
    }

    fn enumerate_nonbonded_pairs(&self) -> Vec<NonbondedPair> {
        let exclusions = self.exclusion_set();
        let mut pairs = Vec::new();
        for i in 0..self.num_atoms {
            for j in (i + 1)..self.num_atoms {
                if !exclusions.contains(&(i, j)) {
                    pairs.push(NonbondedPair { idx1: i, idx2: j });
                }
            }
        }
        pairs
    }
}
