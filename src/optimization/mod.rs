//! Energy minimization of atomic structures
//!
//! The entry points here build a topology and a UFF force field from an
//! [`AtomicStructure`], run L-BFGS on a copy of the coordinates, and write the
//! relaxed positions back only once everything has succeeded.

pub mod lbfgs;

pub use lbfgs::{minimize_with_force_field, LbfgsOptimizer, LbfgsResult, MinimizationConfig};

use crate::forcefield::uff::{UffForceField, VdwMode};
use crate::forcefield::ForceFieldError;
use crate::structure::AtomicStructure;
use crate::topology::MolecularTopology;
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// With some atoms frozen, atoms that moved less than this (Angstroms) are
/// not written back
const WRITE_BACK_THRESHOLD: f64 = 1e-6;

/// Errors that can occur during minimization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MinimizationError {
    #[error("Force field error: {0}")]
    ForceField(#[from] ForceFieldError),

    #[error("No atoms selected for minimization")]
    NothingSelected,
}

/// Summary of a structure minimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizationResult {
    /// Final energy (kcal/mol)
    pub energy: f64,

    /// Number of L-BFGS iterations
    pub iterations: usize,

    /// True if the gradient tolerance was reached
    pub converged: bool,

    /// Human-readable summary
    pub message: String,
}

impl MinimizationResult {
    fn from_lbfgs(result: &LbfgsResult) -> Self {
        let message = if result.converged {
            format!(
                "UFF minimization converged after {} iterations (energy: {:.4} kcal/mol)",
                result.iterations, result.energy
            )
        } else {
            format!(
                "UFF minimization did not converge after {} iterations (energy: {:.4} kcal/mol)",
                result.iterations, result.energy
            )
        };
        Self {
            energy: result.energy,
            iterations: result.iterations,
            converged: result.converged,
            message,
        }
    }

    fn no_atoms() -> Self {
        Self {
            energy: 0.0,
            iterations: 0,
            converged: true,
            message: "No atoms to minimize".to_string(),
        }
    }
}

/// Which atoms the optimizer may move, by structure atom id
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FreezeMode {
    /// Every atom moves
    #[default]
    FreeAll,
    /// The listed atoms stay fixed
    FreezeIds(HashSet<u32>),
    /// Only the listed atoms move
    FreeIds(HashSet<u32>),
}

impl FreezeMode {
    /// Topology indices of frozen atoms, ascending
    fn frozen_indices(&self, topology: &MolecularTopology) -> Vec<usize> {
        let mut frozen: Vec<usize> = match self {
            FreezeMode::FreeAll => Vec::new(),
            FreezeMode::FreezeIds(ids) => ids.iter().filter_map(|&id| topology.index_of(id)).collect(),
            FreezeMode::FreeIds(ids) => (0..topology.num_atoms)
                .filter(|&i| !ids.contains(&topology.atom_ids[i]))
                .collect(),
        };
        frozen.sort_unstable();
        frozen
    }
}

/// Minimize every atom with default settings
pub fn minimize_energy(
    structure: &mut AtomicStructure,
) -> Result<MinimizationResult, MinimizationError> {
    minimize_energy_with_config(structure, &MinimizationConfig::default(), VdwMode::AllPairs)
}

/// Minimize every atom with explicit settings
pub fn minimize_energy_with_config(
    structure: &mut AtomicStructure,
    config: &MinimizationConfig,
    vdw_mode: VdwMode,
) -> Result<MinimizationResult, MinimizationError> {
    minimize_subset(structure, config, vdw_mode, &FreezeMode::FreeAll)
}

/// Minimize with some atoms held fixed
///
/// The reported energy leaves out van der Waals pairs between two frozen
/// atoms, which are constant. With [`FreezeMode::FreeAll`] every relaxed
/// position is written back; otherwise moves under 1e-6 Angstroms are
/// skipped. On error the structure is not modified.
pub fn minimize_subset(
    structure: &mut AtomicStructure,
    config: &MinimizationConfig,
    vdw_mode: VdwMode,
    freeze: &FreezeMode,
) -> Result<MinimizationResult, MinimizationError> {
    if matches!(freeze, FreezeMode::FreeIds(ids) if ids.is_empty()) {
        return Err(MinimizationError::NothingSelected);
    }

    let topology = match vdw_mode {
        VdwMode::AllPairs => MolecularTopology::from_structure(structure),
        VdwMode::Cutoff(_) => MolecularTopology::from_structure_bonded_only(structure),
    };
    if topology.num_atoms == 0 {
        return Ok(MinimizationResult::no_atoms());
    }

    let frozen = freeze.frozen_indices(&topology);
    let force_field = UffForceField::from_topology_with_frozen(&topology, vdw_mode, &frozen)?;

    let mut positions = topology.positions.clone();
    let result = minimize_with_force_field(&force_field, &mut positions, config, &frozen);

    let threshold = match freeze {
        FreezeMode::FreeAll => 0.0,
        _ => WRITE_BACK_THRESHOLD,
    };
    let mut moved = 0;
    for (idx, &id) in topology.atom_ids.iter().enumerate() {
        let old = Vector3::from_column_slice(&topology.positions[3 * idx..3 * idx + 3]);
        let new = Vector3::from_column_slice(&positions[3 * idx..3 * idx + 3]);
        if (new - old).norm() >= threshold && structure.set_position(id, new) {
            moved += 1;
        }
    }
    debug!(
        "Wrote back {} of {} atoms ({} frozen)",
        moved,
        topology.num_atoms,
        frozen.len()
    );

    let summary = MinimizationResult::from_lbfgs(&result);
    info!("{}", summary.message);
    Ok(summary)
}
