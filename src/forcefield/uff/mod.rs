//! Universal Force Field
//!
//! Built once from a [`MolecularTopology`]: atoms are typed, then every bond,
//! angle, torsion, inversion and non-bonded pair gets its parameters up
//! front. Evaluation only reads positions.

pub mod energy;
pub mod params;
pub mod typer;

use crate::forcefield::{EnergyComponent, ForceField, ForceFieldError};
use crate::grid::SpatialGrid;
use crate::topology::MolecularTopology;
use energy::{
    AngleBendParams, BondStretchParams, EnergyTerm, InversionParams, TorsionAngleParams,
    VdwParams,
};
use log::{debug, info};
use params::{
    calc_angle_force_constant, calc_inversion_coefficients_and_force_constant,
    calc_torsion_params, Hybridization, TorsionCenter, UffAtomParams,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use typer::{assign_uff_types, UffAtomType};

/// How non-bonded pairs are chosen for the van der Waals term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VdwMode {
    /// Every pair the topology lists
    AllPairs,
    /// Only pairs closer than the cutoff (Angstroms), found on each evaluation
    Cutoff(f64),
}

impl Default for VdwMode {
    fn default() -> Self {
        VdwMode::AllPairs
    }
}

/// State for on-the-fly pair search
#[derive(Debug, Clone)]
struct CutoffVdw {
    cutoff: f64,
    exclusions: HashSet<(usize, usize)>,
    frozen: Vec<bool>,
}

/// UFF energy and gradients for one topology
#[derive(Debug, Clone)]
pub struct UffForceField {
    num_atoms: usize,
    atom_types: Vec<UffAtomType>,
    bond_params: Vec<BondStretchParams>,
    angle_params: Vec<AngleBendParams>,
    torsion_params: Vec<TorsionAngleParams>,
    inversion_params: Vec<InversionParams>,
    vdw_params: Vec<VdwParams>,
    vdw_mode: VdwMode,
    cutoff: Option<CutoffVdw>,
}

impl UffForceField {
    /// Build with van der Waals over every topology pair
    pub fn from_topology(topology: &MolecularTopology) -> Result<Self, ForceFieldError> {
        Self::from_topology_with_frozen(topology, VdwMode::AllPairs, &[])
    }

    pub fn from_topology_with_vdw_mode(
        topology: &MolecularTopology,
        vdw_mode: VdwMode,
    ) -> Result<Self, ForceFieldError> {
        Self::from_topology_with_frozen(topology, vdw_mode, &[])
    }

    /// Build, skipping van der Waals pairs whose atoms are both frozen
    ///
    /// Such pairs only add a constant to the energy. Out-of-range indices in
    /// `frozen` are ignored.
    pub fn from_topology_with_frozen(
        topology: &MolecularTopology,
        vdw_mode: VdwMode,
        frozen: &[usize],
    ) -> Result<Self, ForceFieldError> {
        let num_atoms = topology.num_atoms;
        let atom_types = assign_uff_types(&topology.atomic_numbers, &topology.neighbors)?;
        log_type_summary(&atom_types);

        let params: Vec<&'static UffAtomParams> = atom_types.iter().map(|t| t.params()).collect();

        let mut is_frozen = vec![false; num_atoms];
        for &idx in frozen {
            if let Some(flag) = is_frozen.get_mut(idx) {
                *flag = true;
            }
        }

        let bond_orders: HashMap<(usize, usize), f64> = topology
            .bonds
            .iter()
            .map(|b| ((b.idx1, b.idx2), b.order.as_f64()))
            .collect();
        let bond_order = |a: usize, b: usize| -> f64 {
            bond_orders
                .get(&(a.min(b), a.max(b)))
                .copied()
                .unwrap_or(1.0)
        };

        let bond_params: Vec<BondStretchParams> = topology
            .bonds
            .iter()
            .map(|b| {
                BondStretchParams::new(
                    b.idx1,
                    b.idx2,
                    b.order.as_f64(),
                    params[b.idx1],
                    params[b.idx2],
                )
            })
            .collect();

        let angle_params: Vec<AngleBendParams> = topology
            .angles
            .iter()
            .filter_map(|a| {
                let order = match atom_types[a.idx2].hybridization() {
                    1 => 1,
                    2 => 3,
                    6 => 4,
                    _ => 0,
                };
                let theta0 = params[a.idx2].theta0.to_radians();
                let ka = calc_angle_force_constant(
                    theta0,
                    bond_order(a.idx1, a.idx2),
                    bond_order(a.idx2, a.idx3),
                    params[a.idx1],
                    params[a.idx2],
                    params[a.idx3],
                );
                // Non-positive constants come from degenerate geometry
                (ka > 0.0).then(|| AngleBendParams::new(a.idx1, a.idx2, a.idx3, theta0, ka, order))
            })
            .collect();

        let torsion_params = build_torsions(topology, &atom_types, &bond_order);

        let inversion_params: Vec<InversionParams> = topology
            .inversions
            .iter()
            .map(|inv| {
                let center_z = topology.atomic_numbers[inv.idx2];
                let c_bound_to_o = center_z == 6
                    && [inv.idx1, inv.idx3, inv.idx4].iter().any(|&n| {
                        topology.atomic_numbers[n] == 8 && atom_types[n].hybridization() == 2
                    });
                let (force_constant, c0, c1, c2) =
                    calc_inversion_coefficients_and_force_constant(center_z, c_bound_to_o);
                InversionParams {
                    idx1: inv.idx1,
                    idx2: inv.idx2,
                    idx3: inv.idx3,
                    idx4: inv.idx4,
                    force_constant,
                    c0,
                    c1,
                    c2,
                }
            })
            .collect();

        let (vdw_params, cutoff) = match vdw_mode {
            VdwMode::AllPairs => {
                let pairs = topology
                    .nonbonded_pairs
                    .iter()
                    .filter(|p| !(is_frozen[p.idx1] && is_frozen[p.idx2]))
                    .map(|p| VdwParams::new(p.idx1, p.idx2, params[p.idx1], params[p.idx2]))
                    .collect();
                (pairs, None)
            }
            VdwMode::Cutoff(r) => (
                Vec::new(),
                Some(CutoffVdw {
                    cutoff: r,
                    exclusions: topology.exclusion_set(),
                    frozen: is_frozen,
                }),
            ),
        };

        info!(
            "UFF force field: {} atoms, {} bonds, {} angles, {} torsions, {} inversions, vdW {}",
            num_atoms,
            bond_params.len(),
            angle_params.len(),
            torsion_params.len(),
            inversion_params.len(),
            match vdw_mode {
                VdwMode::AllPairs => format!("{} pairs", vdw_params.len()),
                VdwMode::Cutoff(r) => format!("cutoff {:.2} A", r),
            }
        );

        Ok(Self {
            num_atoms,
            atom_types,
            bond_params,
            angle_params,
            torsion_params,
            inversion_params,
            vdw_params,
            vdw_mode,
            cutoff,
        })
    }

    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn atom_types(&self) -> &[UffAtomType] {
        &self.atom_types
    }

    pub fn bond_params(&self) -> &[BondStretchParams] {
        &self.bond_params
    }

    pub fn angle_params(&self) -> &[AngleBendParams] {
        &self.angle_params
    }

    pub fn torsion_params(&self) -> &[TorsionAngleParams] {
        &self.torsion_params
    }

    pub fn inversion_params(&self) -> &[InversionParams] {
        &self.inversion_params
    }

    /// Precomputed van der Waals pairs (empty in cutoff mode)
    pub fn vdw_params(&self) -> &[VdwParams] {
        &self.vdw_params
    }

    pub fn vdw_mode(&self) -> VdwMode {
        self.vdw_mode
    }

    /// Pairs within the cutoff at the given positions
    fn cutoff_pairs(&self, cutoff: &CutoffVdw, positions: &[f64]) -> Vec<VdwParams> {
        let grid = SpatialGrid::from_positions(positions, cutoff.cutoff);
        let mut pairs = Vec::new();
        for i in 0..self.num_atoms {
            grid.for_each_neighbor(positions, i, cutoff.cutoff, |j| {
                if j > i
                    && !cutoff.exclusions.contains(&(i, j))
                    && !(cutoff.frozen[i] && cutoff.frozen[j])
                {
                    pairs.push(VdwParams::new(
                        i,
                        j,
                        self.atom_types[i].params(),
                        self.atom_types[j].params(),
                    ));
                }
            });
        }
        pairs
    }

    fn vdw_energy(&self, positions: &[f64], gradients: Option<&mut [f64]>) -> f64 {
        match &self.cutoff {
            Some(cutoff) => sum_terms(&self.cutoff_pairs(cutoff, positions), positions, gradients),
            None => sum_terms(&self.vdw_params, positions, gradients),
        }
    }

    /// Energy split by interaction kind, in kcal/mol
    pub fn energy_components(&self, positions: &[f64]) -> Vec<EnergyComponent> {
        vec![
            EnergyComponent::new("bond_stretch", sum_terms(&self.bond_params, positions, None)),
            EnergyComponent::new("angle_bend", sum_terms(&self.angle_params, positions, None)),
            EnergyComponent::new("torsion", sum_terms(&self.torsion_params, positions, None)),
            EnergyComponent::new("inversion", sum_terms(&self.inversion_params, positions, None)),
            EnergyComponent::new("van_der_waals", self.vdw_energy(positions, None)),
        ]
    }
}

impl ForceField for UffForceField {
    fn name(&self) -> &'static str {
        "UFF"
    }

    fn energy_and_gradients(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        debug_assert_eq!(positions.len(), 3 * self.num_atoms);
        gradients.iter_mut().for_each(|g| *g = 0.0);

        sum_terms(&self.bond_params, positions, Some(&mut *gradients))
            + sum_terms(&self.angle_params, positions, Some(&mut *gradients))
            + sum_terms(&self.torsion_params, positions, Some(&mut *gradients))
            + sum_terms(&self.inversion_params, positions, Some(&mut *gradients))
            + self.vdw_energy(positions, Some(gradients))
    }

    fn energy(&self, positions: &[f64]) -> f64 {
        self.energy_components(positions)
            .iter()
            .map(|c| c.energy)
            .sum()
    }
}

fn sum_terms<T: EnergyTerm>(terms: &[T], positions: &[f64], gradients: Option<&mut [f64]>) -> f64 {
    match gradients {
        Some(gradients) => {
            let mut energy = 0.0;
            for term in terms {
                energy += term.energy_and_gradient(positions, gradients);
            }
            energy
        }
        None => terms.iter().map(|t| t.energy(positions)).sum(),
    }
}

/// Torsion parameters, with each barrier shared among the torsions about its bond
fn build_torsions(
    topology: &MolecularTopology,
    atom_types: &[UffAtomType],
    bond_order: &dyn Fn(usize, usize) -> f64,
) -> Vec<TorsionAngleParams> {
    let center = |idx: usize| -> Option<TorsionCenter<'static>> {
        Some(TorsionCenter {
            atomic_number: topology.atomic_numbers[idx],
            hybridization: Hybridization::from_digit(atom_types[idx].hybridization())?,
            params: atom_types[idx].params(),
        })
    };

    let mut torsions = Vec::with_capacity(topology.torsions.len());
    for t in &topology.torsions {
        let (Some(j), Some(k)) = (center(t.idx2), center(t.idx3)) else {
            continue;
        };
        let end_atom_is_sp2 =
            atom_types[t.idx1].hybridization() == 2 || atom_types[t.idx4].hybridization() == 2;
        torsions.push(TorsionAngleParams {
            idx1: t.idx1,
            idx2: t.idx2,
            idx3: t.idx3,
            idx4: t.idx4,
            params: calc_torsion_params(bond_order(t.idx2, t.idx3), j, k, end_atom_is_sp2),
        });
    }

    let central_bond = |t: &TorsionAngleParams| (t.idx2.min(t.idx3), t.idx2.max(t.idx3));
    let mut per_bond: HashMap<(usize, usize), usize> = HashMap::new();
    for t in &torsions {
        *per_bond.entry(central_bond(t)).or_insert(0) += 1;
    }
    for t in &mut torsions {
        if let Some(&count) = per_bond.get(&central_bond(t)) {
            t.params.force_constant /= count as f64;
        }
    }
    torsions
}

fn log_type_summary(atom_types: &[UffAtomType]) {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for t in atom_types {
        *counts.entry(t.label()).or_insert(0) += 1;
    }
    let summary: Vec<String> = counts
        .iter()
        .map(|(label, n)| format!("{}x{}", n, label))
        .collect();
    debug!("UFF atom types: {}", summary.join(", "));
}
